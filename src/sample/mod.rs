//! Position samples
//!
//! A [PositionSample] is the immutable snapshot of one fix, as pushed by the platform.
//! Readers go through typed accessors that take optional output slots: callers omit
//! the values they do not need, but must request at least one
//! ([Error::NullOutput] otherwise). Values the fix does not know are written as their
//! [Unknown] sentinel and reported as [Error::OutOfRange].
use gnss::prelude::{Constellation, SV};
use hifitime::{Epoch, TimeScale};

use crate::error::Error;

mod dop;
pub use dop::{Dop, DopType};

/// Sentinel written in an output slot when the value is not known
pub trait Unknown: Copy {
    const UNKNOWN: Self;
}

macro_rules! unknown_max {
    ($($t:ty),*) => {
        $(impl Unknown for $t {
            const UNKNOWN: Self = <$t>::MAX;
        })*
    };
}

unknown_max!(u8, u16, u32, u64, i32);

impl Unknown for f64 {
    const UNKNOWN: Self = f64::NAN;
}

/// Fix state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixState {
    /// No position fix
    #[default]
    NoFix,
    /// 2D position fix
    Fix2D,
    /// 3D position fix
    Fix3D,
    /// Estimated (dead reckoning) position
    Estimated,
}

impl std::fmt::Display for FixState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoFix => write!(f, "no-fix"),
            Self::Fix2D => write!(f, "2D"),
            Self::Fix3D => write!(f, "3D"),
            Self::Estimated => write!(f, "estimated"),
        }
    }
}

/// One entry of the satellite table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteInfo {
    /// Satellite vehicle
    pub sv: SV,
    /// Used in the fix
    pub used: bool,
    /// Signal to noise ratio [dB-Hz]
    pub snr: u8,
    /// Azimuth [deg]
    pub azimuth: u16,
    /// Elevation [deg]
    pub elevation: u8,
}

/// Snapshot of a single fix.
/// Every value the engine could not determine is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionSample {
    pub fix_state: FixState,
    /// UTC instant of the fix
    pub utc: Option<Epoch>,
    /// GPST instant of the fix, may be known ahead of UTC
    pub gps: Option<Epoch>,
    /// Time accuracy [ns]
    pub time_accuracy: Option<u32>,
    /// UTC leap seconds in advance of GPST
    pub leap_seconds: Option<u8>,
    /// Latitude [ddeg]
    pub latitude: Option<f64>,
    /// Longitude [ddeg]
    pub longitude: Option<f64>,
    /// Horizontal accuracy [m]
    pub h_accuracy: Option<f64>,
    /// Altitude above mean sea level [m]
    pub altitude: Option<f64>,
    /// Altitude above the WGS-84 ellipsoid [m]
    pub altitude_wgs84: Option<f64>,
    /// Vertical accuracy [m]
    pub v_accuracy: Option<f64>,
    /// Horizontal speed [m/s]
    pub h_speed: Option<f64>,
    /// Horizontal speed accuracy [m/s]
    pub h_speed_accuracy: Option<f64>,
    /// Vertical speed [m/s], positive upwards
    pub v_speed: Option<f64>,
    /// Vertical speed accuracy [m/s]
    pub v_speed_accuracy: Option<f64>,
    /// Direction of travel, from true north [deg]
    pub direction: Option<f64>,
    /// Direction accuracy [deg]
    pub direction_accuracy: Option<f64>,
    /// Magnetic deviation [deg]
    pub magnetic_deviation: Option<f64>,
    /// Dilution of Precision
    pub dop: Dop,
    pub sats_in_view: Option<u8>,
    pub sats_tracking: Option<u8>,
    pub sats_used: Option<u8>,
    /// Satellite table
    pub satellites: Option<Vec<SatelliteInfo>>,
}

/// Output slots of [PositionSample] satellite table reads.
/// Each slice is filled up to its length.
#[derive(Debug, Default)]
pub struct SatelliteSlots<'a> {
    pub id: Option<&'a mut [u16]>,
    pub constellation: Option<&'a mut [Constellation]>,
    pub used: Option<&'a mut [bool]>,
    pub snr: Option<&'a mut [u8]>,
    pub azimuth: Option<&'a mut [u16]>,
    pub elevation: Option<&'a mut [u8]>,
}

/// Number of entries written in each [SatelliteSlots] slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SatelliteCounts {
    pub id: usize,
    pub constellation: usize,
    pub used: usize,
    pub snr: usize,
    pub azimuth: usize,
    pub elevation: usize,
}

/// Collects output slots of one accessor call
#[derive(Default)]
struct Outputs {
    requested: bool,
    unavailable: bool,
}

impl Outputs {
    fn put<T: Unknown>(&mut self, slot: Option<&mut T>, value: Option<T>) {
        if let Some(slot) = slot {
            self.requested = true;
            *slot = match value {
                Some(value) => value,
                None => {
                    self.unavailable = true;
                    T::UNKNOWN
                },
            };
        }
    }
    fn fill<T: Copy>(&mut self, slot: Option<&mut [T]>, values: impl Iterator<Item = T>) -> usize {
        match slot {
            Some(slot) => {
                self.requested = true;
                slot.iter_mut().zip(values).map(|(s, v)| *s = v).count()
            },
            None => 0,
        }
    }
    fn finish(self) -> Result<(), Error> {
        if !self.requested {
            Err(Error::NullOutput)
        } else if self.unavailable {
            Err(Error::OutOfRange)
        } else {
            Ok(())
        }
    }
}

impl PositionSample {
    fn gregorian_utc(&self) -> Option<(i32, u8, u8, u8, u8, u8, u32)> {
        self.utc.map(|t| t.to_gregorian_utc())
    }
    pub(crate) fn position_state(&self, state: Option<&mut FixState>) -> Result<(), Error> {
        let state = state.ok_or(Error::NullOutput)?;
        *state = self.fix_state;
        Ok(())
    }
    pub(crate) fn location(
        &self,
        latitude: Option<&mut f64>,
        longitude: Option<&mut f64>,
        h_accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(latitude, self.latitude);
        out.put(longitude, self.longitude);
        out.put(h_accuracy, self.h_accuracy);
        out.finish()
    }
    pub(crate) fn altitude(
        &self,
        altitude: Option<&mut f64>,
        v_accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(altitude, self.altitude);
        out.put(v_accuracy, self.v_accuracy);
        out.finish()
    }
    pub(crate) fn altitude_wgs84(&self, altitude: Option<&mut f64>) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(altitude, self.altitude_wgs84);
        out.finish()
    }
    pub(crate) fn date(
        &self,
        year: Option<&mut u16>,
        month: Option<&mut u8>,
        day: Option<&mut u8>,
    ) -> Result<(), Error> {
        let utc = self.gregorian_utc();
        let mut out = Outputs::default();
        out.put(year, utc.and_then(|t| u16::try_from(t.0).ok()));
        out.put(month, utc.map(|t| t.1));
        out.put(day, utc.map(|t| t.2));
        out.finish()
    }
    pub(crate) fn time(
        &self,
        hours: Option<&mut u8>,
        minutes: Option<&mut u8>,
        seconds: Option<&mut u8>,
        milliseconds: Option<&mut u16>,
    ) -> Result<(), Error> {
        let utc = self.gregorian_utc();
        let mut out = Outputs::default();
        out.put(hours, utc.map(|t| t.3));
        out.put(minutes, utc.map(|t| t.4));
        out.put(seconds, utc.map(|t| t.5));
        out.put(milliseconds, utc.map(|t| (t.6 / 1_000_000) as u16));
        out.finish()
    }
    pub(crate) fn epoch_time(&self, milliseconds: Option<&mut u64>) -> Result<(), Error> {
        let unix_ms = self
            .utc
            .map(|t| t.to_unix_milliseconds())
            .filter(|ms| *ms >= 0.0)
            .map(|ms| ms.round() as u64);
        let mut out = Outputs::default();
        out.put(milliseconds, unix_ms);
        out.finish()
    }
    pub(crate) fn gps_time(
        &self,
        week: Option<&mut u32>,
        time_of_week_ms: Option<&mut u32>,
    ) -> Result<(), Error> {
        let gpst = self
            .gps
            .map(|t| t.to_time_scale(TimeScale::GPST).to_time_of_week());
        let mut out = Outputs::default();
        out.put(week, gpst.map(|(week, _)| week));
        out.put(
            time_of_week_ms,
            gpst.map(|(_, nanos)| (nanos / 1_000_000) as u32),
        );
        out.finish()
    }
    pub(crate) fn time_accuracy(&self, accuracy: Option<&mut u32>) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(accuracy, self.time_accuracy);
        out.finish()
    }
    pub(crate) fn gps_leap_seconds(&self, leap_seconds: Option<&mut u8>) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(leap_seconds, self.leap_seconds);
        out.finish()
    }
    pub(crate) fn horizontal_speed(
        &self,
        speed: Option<&mut f64>,
        accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(speed, self.h_speed);
        out.put(accuracy, self.h_speed_accuracy);
        out.finish()
    }
    pub(crate) fn vertical_speed(
        &self,
        speed: Option<&mut f64>,
        accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(speed, self.v_speed);
        out.put(accuracy, self.v_speed_accuracy);
        out.finish()
    }
    pub(crate) fn direction(
        &self,
        direction: Option<&mut f64>,
        accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(direction, self.direction);
        out.put(accuracy, self.direction_accuracy);
        out.finish()
    }
    pub(crate) fn magnetic_deviation(&self, deviation: Option<&mut f64>) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(deviation, self.magnetic_deviation);
        out.finish()
    }
    pub(crate) fn dop(
        &self,
        hdop: Option<&mut f64>,
        vdop: Option<&mut f64>,
        pdop: Option<&mut f64>,
    ) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(hdop, self.dop.hdop);
        out.put(vdop, self.dop.vdop);
        out.put(pdop, self.dop.pdop);
        out.finish()
    }
    pub(crate) fn dilution_of_precision(
        &self,
        kind: DopType,
        dop: Option<&mut f64>,
    ) -> Result<(), Error> {
        let mut out = Outputs::default();
        out.put(dop, self.dop.get(kind));
        out.finish()
    }
    pub(crate) fn satellites_status(
        &self,
        in_view: Option<&mut u8>,
        tracking: Option<&mut u8>,
        used: Option<&mut u8>,
    ) -> Result<(), Error> {
        let table = self.satellites.as_deref();
        let count = |f: fn(&SatelliteInfo) -> bool| {
            table.map(|sats| sats.iter().filter(|sat| f(sat)).count().min(u8::MAX as usize) as u8)
        };
        let mut out = Outputs::default();
        out.put(in_view, self.sats_in_view.or_else(|| count(|_| true)));
        out.put(tracking, self.sats_tracking.or_else(|| count(|sat| sat.snr > 0)));
        out.put(used, self.sats_used.or_else(|| count(|sat| sat.used)));
        out.finish()
    }
    pub(crate) fn satellites_info(&self, slots: SatelliteSlots) -> Result<SatelliteCounts, Error> {
        let sats = self.satellites.as_deref().unwrap_or(&[]);
        let mut out = Outputs::default();
        let counts = SatelliteCounts {
            id: out.fill(slots.id, sats.iter().map(|sat| sat.sv.prn as u16)),
            constellation: out.fill(slots.constellation, sats.iter().map(|sat| sat.sv.constellation)),
            used: out.fill(slots.used, sats.iter().map(|sat| sat.used)),
            snr: out.fill(slots.snr, sats.iter().map(|sat| sat.snr)),
            azimuth: out.fill(slots.azimuth, sats.iter().map(|sat| sat.azimuth)),
            elevation: out.fill(slots.elevation, sats.iter().map(|sat| sat.elevation)),
        };
        out.unavailable = self.satellites.is_none();
        out.finish().map(|_| counts)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn fix() -> PositionSample {
        let utc = Epoch::from_str("2024-03-01T12:34:56.789 UTC").unwrap();
        PositionSample {
            fix_state: FixState::Fix3D,
            utc: Some(utc),
            gps: Some(utc.to_time_scale(TimeScale::GPST)),
            latitude: Some(48.858),
            longitude: Some(2.294),
            h_accuracy: None,
            dop: Dop {
                hdop: Some(1.2),
                ..Default::default()
            },
            satellites: Some(vec![
                SatelliteInfo {
                    sv: SV {
                        constellation: Constellation::GPS,
                        prn: 5,
                    },
                    used: true,
                    snr: 42,
                    azimuth: 180,
                    elevation: 45,
                },
                SatelliteInfo {
                    sv: SV {
                        constellation: Constellation::Galileo,
                        prn: 11,
                    },
                    used: false,
                    snr: 0,
                    azimuth: 90,
                    elevation: 12,
                },
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn selective_outputs() {
        let fix = fix();
        let (mut lat, mut lon, mut acc) = (0.0, 0.0, 0.0);
        assert_eq!(fix.location(Some(&mut lat), Some(&mut lon), None), Ok(()));
        assert_eq!((lat, lon), (48.858, 2.294));

        assert_eq!(
            fix.location(Some(&mut lat), None, Some(&mut acc)),
            Err(Error::OutOfRange)
        );
        assert_eq!(lat, 48.858);
        assert!(acc.is_nan());

        assert_eq!(fix.location(None, None, None), Err(Error::NullOutput));
        assert_eq!(fix.date(None, None, None), Err(Error::NullOutput));
        assert_eq!(fix.position_state(None), Err(Error::NullOutput));
    }

    #[test]
    fn utc_date_time() {
        let fix = fix();
        let (mut y, mut mo, mut d) = (0, 0, 0);
        assert_eq!(fix.date(Some(&mut y), Some(&mut mo), Some(&mut d)), Ok(()));
        assert_eq!((y, mo, d), (2024, 3, 1));

        let (mut h, mut mi, mut s, mut ms) = (0, 0, 0, 0);
        assert_eq!(
            fix.time(Some(&mut h), Some(&mut mi), Some(&mut s), Some(&mut ms)),
            Ok(())
        );
        assert_eq!((h, mi, s, ms), (12, 34, 56, 789));

        let mut unix_ms = 0;
        assert_eq!(fix.epoch_time(Some(&mut unix_ms)), Ok(()));
        assert_eq!(unix_ms, 1_709_296_496_789);
    }

    #[test]
    fn unknown_time() {
        let fix = PositionSample::default();
        let (mut y, mut mo, mut d) = (0, 0, 0);
        assert_eq!(
            fix.date(Some(&mut y), Some(&mut mo), Some(&mut d)),
            Err(Error::OutOfRange)
        );
        assert_eq!((y, mo, d), (u16::MAX, u8::MAX, u8::MAX));

        let (mut week, mut tow) = (0, 0);
        assert_eq!(
            fix.gps_time(Some(&mut week), Some(&mut tow)),
            Err(Error::OutOfRange)
        );
        assert_eq!((week, tow), (u32::MAX, u32::MAX));

        let mut state = FixState::Fix3D;
        assert_eq!(fix.position_state(Some(&mut state)), Ok(()));
        assert_eq!(state, FixState::NoFix);
    }

    #[test]
    fn gps_week() {
        let fix = fix();
        let (mut week, mut tow) = (0, 0);
        assert_eq!(fix.gps_time(Some(&mut week), Some(&mut tow)), Ok(()));
        // 2024-03-01 (Friday) lies in GPS week 2303
        assert_eq!(week, 2303);
        assert!(tow < 604_800_000);
    }

    #[test]
    fn dop_per_kind() {
        let fix = fix();
        let mut dop = 0.0;
        assert_eq!(fix.dilution_of_precision(DopType::Hdop, Some(&mut dop)), Ok(()));
        assert_eq!(dop, 1.2);
        for kind in [DopType::Pdop, DopType::Vdop, DopType::Gdop, DopType::Tdop] {
            assert_eq!(
                fix.dilution_of_precision(kind, Some(&mut dop)),
                Err(Error::OutOfRange)
            );
            assert!(dop.is_nan());
        }
    }

    #[test]
    fn satellite_counts_from_table() {
        let fix = fix();
        let (mut in_view, mut tracking, mut used) = (0, 0, 0);
        assert_eq!(
            fix.satellites_status(Some(&mut in_view), Some(&mut tracking), Some(&mut used)),
            Ok(())
        );
        assert_eq!((in_view, tracking, used), (2, 1, 1));
    }

    #[test]
    fn satellite_table_capacity() {
        let fix = fix();
        let mut ids = [0_u16; 1];
        let mut constellations = [Constellation::GPS; 4];
        let mut snr: [u8; 0] = [];
        let counts = fix
            .satellites_info(SatelliteSlots {
                id: Some(&mut ids),
                constellation: Some(&mut constellations),
                snr: Some(&mut snr),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(counts.id, 1);
        assert_eq!(counts.constellation, 2);
        assert_eq!(counts.snr, 0);
        assert_eq!(counts.used, 0);
        assert_eq!(ids, [5]);
        assert_eq!(constellations[1], Constellation::Galileo);

        assert_eq!(
            fix.satellites_info(SatelliteSlots::default()),
            Err(Error::NullOutput)
        );
    }

    #[test]
    fn zero_capacity_table() {
        let fix = fix();
        let mut ids: [u16; 0] = [];
        let counts = fix
            .satellites_info(SatelliteSlots {
                id: Some(&mut ids),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(counts, SatelliteCounts::default());
    }
}
