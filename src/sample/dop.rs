//! Dilution of Precision
use nalgebra::MatrixXx4;

use super::SatelliteInfo;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Kind of Dilution of Precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum DopType {
    /// Position
    Pdop,
    /// Horizontal
    Hdop,
    /// Vertical
    Vdop,
    /// Geometric
    Gdop,
    /// Time
    Tdop,
}

impl DopType {
    pub const ALL: [Self; 5] = [Self::Pdop, Self::Hdop, Self::Vdop, Self::Gdop, Self::Tdop];
}

impl std::fmt::Display for DopType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Pdop => write!(f, "PDOP"),
            Self::Hdop => write!(f, "HDOP"),
            Self::Vdop => write!(f, "VDOP"),
            Self::Gdop => write!(f, "GDOP"),
            Self::Tdop => write!(f, "TDOP"),
        }
    }
}

/// Dilution of Precision, per [DopType]. Unitless.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dop {
    pub pdop: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub gdop: Option<f64>,
    pub tdop: Option<f64>,
}

impl Dop {
    /// Returns DOP of given kind, if known
    pub fn get(&self, kind: DopType) -> Option<f64> {
        match kind {
            DopType::Pdop => self.pdop,
            DopType::Hdop => self.hdop,
            DopType::Vdop => self.vdop,
            DopType::Gdop => self.gdop,
            DopType::Tdop => self.tdop,
        }
    }
    /// Evaluates all DOP kinds from the local (East, North, Up) geometry
    /// of the satellites used in the fix. Requires at least 4 of them.
    pub fn from_geometry(satellites: &[SatelliteInfo]) -> Option<Self> {
        let used = satellites.iter().filter(|sat| sat.used).collect::<Vec<_>>();
        if used.len() < 4 {
            return None;
        }

        let mut g = MatrixXx4::<f64>::zeros(used.len());
        for (row, sat) in used.iter().enumerate() {
            let (elev, azim) = (
                (sat.elevation as f64).to_radians(),
                (sat.azimuth as f64).to_radians(),
            );
            g[(row, 0)] = -elev.cos() * azim.sin();
            g[(row, 1)] = -elev.cos() * azim.cos();
            g[(row, 2)] = -elev.sin();
            g[(row, 3)] = 1.0_f64;
        }

        let q = (g.transpose() * g).try_inverse()?;

        let (q_e, q_n, q_u, q_t) = (q[(0, 0)], q[(1, 1)], q[(2, 2)], q[(3, 3)]);
        if q_e < 0.0 || q_n < 0.0 || q_u < 0.0 || q_t < 0.0 {
            return None;
        }

        Some(Self {
            hdop: Some((q_e + q_n).sqrt()),
            vdop: Some(q_u.sqrt()),
            pdop: Some((q_e + q_n + q_u).sqrt()),
            tdop: Some(q_t.sqrt()),
            gdop: Some((q_e + q_n + q_u + q_t).sqrt()),
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Dop, DopType};
    use crate::sample::SatelliteInfo;
    use gnss::prelude::{Constellation, SV};

    fn sat(prn: u8, azimuth: u16, elevation: u8, used: bool) -> SatelliteInfo {
        SatelliteInfo {
            sv: SV {
                constellation: Constellation::GPS,
                prn,
            },
            used,
            snr: 40,
            azimuth,
            elevation,
        }
    }

    #[test]
    fn geometry() {
        let sats = [
            sat(1, 0, 90, true),
            sat(2, 0, 10, true),
            sat(3, 120, 10, true),
            sat(4, 240, 10, true),
            sat(5, 60, 45, false),
        ];
        let dop = Dop::from_geometry(&sats).expect("geometry should be solvable");
        for kind in DopType::ALL {
            let value = dop.get(kind).unwrap();
            assert!(value.is_finite() && value > 0.0, "{} = {}", kind, value);
        }
        let (p, h, v, g, t) = (
            dop.pdop.unwrap(),
            dop.hdop.unwrap(),
            dop.vdop.unwrap(),
            dop.gdop.unwrap(),
            dop.tdop.unwrap(),
        );
        assert!((p.powi(2) - h.powi(2) - v.powi(2)).abs() < 1.0E-9);
        assert!((g.powi(2) - p.powi(2) - t.powi(2)).abs() < 1.0E-9);
        // symmetric azimuth spread: horizontal better than vertical
        assert!(h < v, "hdop={} vdop={}", h, v);
    }

    #[test]
    fn not_enough_used_satellites() {
        let sats = [
            sat(1, 0, 90, true),
            sat(2, 0, 10, true),
            sat(3, 120, 10, true),
            sat(4, 240, 10, false),
        ];
        assert!(Dop::from_geometry(&sats).is_none());
    }
}
