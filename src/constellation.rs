//! Constellation selection, coverage areas and SBAS categories
use gnss::prelude::Constellation;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Set of constellations the engine is allowed to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct ConstellationMask(u32);

impl ConstellationMask {
    pub const GPS: Self = Self(1 << 0);
    pub const GLONASS: Self = Self(1 << 1);
    pub const BEIDOU: Self = Self(1 << 2);
    pub const GALILEO: Self = Self(1 << 3);
    pub const SBAS: Self = Self(1 << 4);
    pub const QZSS: Self = Self(1 << 5);
    /// Largest valid combination
    pub const ALL: Self = Self((1 << 6) - 1);

    /// Builds a mask from raw bits, without validation.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
    pub const fn bits(&self) -> u32 {
        self.0
    }
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
    /// True if every bit of `other` is part of Self
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    /// True if Self only holds known constellation bits
    pub const fn is_valid(&self) -> bool {
        self.0 & !Self::ALL.0 == 0
    }
    /// Mask bit of given [Constellation], if it can be selected
    pub fn of(constellation: Constellation) -> Option<Self> {
        match constellation {
            Constellation::GPS => Some(Self::GPS),
            Constellation::Glonass => Some(Self::GLONASS),
            Constellation::BeiDou => Some(Self::BEIDOU),
            Constellation::Galileo => Some(Self::GALILEO),
            Constellation::QZSS => Some(Self::QZSS),
            c if c.is_sbas() => Some(Self::SBAS),
            _ => None,
        }
    }
}

impl std::ops::BitOr for ConstellationMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for ConstellationMask {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let names = [
            (Self::GPS, "GPS"),
            (Self::GLONASS, "GLO"),
            (Self::BEIDOU, "BDS"),
            (Self::GALILEO, "GAL"),
            (Self::SBAS, "SBAS"),
            (Self::QZSS, "QZSS"),
        ];
        let selected = names
            .iter()
            .filter_map(|(bit, name)| if self.contains(*bit) { Some(*name) } else { None })
            .collect::<Vec<_>>();
        write!(f, "{}", selected.join("|"))
    }
}

/// Coverage area a constellation is used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum ConstellationArea {
    /// Use this constellation everywhere
    #[default]
    Worldwide,
    /// Use this constellation only outside of US territory
    OutsideUs,
}

/// Constellations a [ConstellationArea] may be configured for:
/// every selectable one, SBAS aside
pub(crate) fn supports_area(constellation: Constellation) -> bool {
    ConstellationMask::of(constellation).is_some_and(|bit| bit != ConstellationMask::SBAS)
}

/// SBAS augmentation system a satellite belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SbasCategory {
    Egnos,
    Waas,
    Gagan,
    Msas,
    Unknown,
}

/// Identifies the SBAS system of given satellite identifier.
/// Both NMEA identifiers (33..64) and SBAS PRNs (120..158) are accepted.
pub fn sbas_category(sv_id: u16) -> SbasCategory {
    // PRN = NMEA id + 87
    let prn = if (33..=64).contains(&sv_id) {
        sv_id + 87
    } else {
        sv_id
    };
    match prn {
        120 | 123 | 124 | 126 | 136 => SbasCategory::Egnos,
        122 | 131 | 133 | 134 | 135 | 138 => SbasCategory::Waas,
        127 | 128 | 132 => SbasCategory::Gagan,
        129 | 137 => SbasCategory::Msas,
        _ => SbasCategory::Unknown,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(33, SbasCategory::Egnos)]
    #[case(36, SbasCategory::Egnos)]
    #[case(51, SbasCategory::Waas)]
    #[case(46, SbasCategory::Waas)]
    #[case(40, SbasCategory::Gagan)]
    #[case(41, SbasCategory::Gagan)]
    #[case(50, SbasCategory::Msas)]
    #[case(42, SbasCategory::Msas)]
    #[case(136, SbasCategory::Egnos)]
    #[case(0, SbasCategory::Unknown)]
    #[case(65, SbasCategory::Unknown)]
    fn sbas_categories(#[case] sv_id: u16, #[case] expected: SbasCategory) {
        assert_eq!(sbas_category(sv_id), expected);
    }

    #[test]
    fn mask_validation() {
        assert!(ConstellationMask::ALL.is_valid());
        assert!(!ConstellationMask::from_bits(1 << 6).is_valid());
        assert!(ConstellationMask::from_bits(0).is_empty());

        let mask = ConstellationMask::GPS | ConstellationMask::GALILEO;
        assert_eq!(mask.to_string(), "GPS|GAL");
    }

    #[rstest]
    #[case(Constellation::GPS, Some(ConstellationMask::GPS), true)]
    #[case(Constellation::Glonass, Some(ConstellationMask::GLONASS), true)]
    #[case(Constellation::BeiDou, Some(ConstellationMask::BEIDOU), true)]
    #[case(Constellation::Galileo, Some(ConstellationMask::GALILEO), true)]
    #[case(Constellation::QZSS, Some(ConstellationMask::QZSS), true)]
    #[case(Constellation::EGNOS, Some(ConstellationMask::SBAS), false)]
    #[case(Constellation::WAAS, Some(ConstellationMask::SBAS), false)]
    #[case(Constellation::IRNSS, None, false)]
    fn selectable_constellations(
        #[case] constellation: Constellation,
        #[case] bit: Option<ConstellationMask>,
        #[case] area: bool,
    ) {
        assert_eq!(ConstellationMask::of(constellation), bit);
        assert_eq!(supports_area(constellation), area);
    }
}
