//! NMEA sentence selection
#[cfg(feature = "serde")]
use serde::Deserialize;

/// Set of NMEA sentences the engine outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct NmeaMask(u32);

impl NmeaMask {
    /// GPS fix data
    pub const GPGGA: Self = Self(1 << 0);
    /// GPS DOP and active satellites
    pub const GPGSA: Self = Self(1 << 1);
    /// GPS satellites in view
    pub const GPGSV: Self = Self(1 << 2);
    /// GPS recommended minimal data
    pub const GPRMC: Self = Self(1 << 3);
    /// GPS vector track and speed over ground
    pub const GPVTG: Self = Self(1 << 4);
    /// GLONASS satellites in view
    pub const GLGSV: Self = Self(1 << 5);
    /// GNSS fix data
    pub const GNGNS: Self = Self(1 << 6);
    /// GNSS DOP and active satellites
    pub const GNGSA: Self = Self(1 << 7);
    /// Galileo fix data
    pub const GAGGA: Self = Self(1 << 8);
    /// Galileo DOP and active satellites
    pub const GAGSA: Self = Self(1 << 9);
    /// Galileo satellites in view
    pub const GAGSV: Self = Self(1 << 10);
    /// Galileo recommended minimal data
    pub const GARMC: Self = Self(1 << 11);
    /// Galileo vector track and speed over ground
    pub const GAVTG: Self = Self(1 << 12);
    /// Proprietary GPS timing
    pub const PSTIS: Self = Self(1 << 13);
    /// Proprietary fix information
    pub const PQXFI: Self = Self(1 << 14);
    /// Proprietary type masks
    pub const PTYPE: Self = Self(1 << 15);
    /// GPS range residuals
    pub const GPGRS: Self = Self(1 << 16);
    /// GPS geographic position
    pub const GPGLL: Self = Self(1 << 17);
    /// Debug
    pub const DEBUG: Self = Self(1 << 18);
    /// GPS local geodetic datum
    pub const GPDTM: Self = Self(1 << 19);
    /// Galileo fix data
    pub const GAGNS: Self = Self(1 << 20);
    /// Largest valid combination
    pub const MAX: Self = Self((1 << 21) - 1);

    /// Builds a mask from raw bits, without validation.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
    pub const fn bits(&self) -> u32 {
        self.0
    }
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    /// True if Self does not exceed [Self::MAX]
    pub const fn is_valid(&self) -> bool {
        self.0 <= Self::MAX.0
    }
}

impl std::ops::BitOr for NmeaMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::LowerHex for NmeaMask {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::LowerHex::fmt(&self.0, f)
    }
}
