//! Platform adapter seam
use std::io::Read;

use gnss::prelude::Constellation;
use hifitime::{Duration, Epoch};

#[cfg(feature = "serde")]
use serde::Deserialize;

use crate::{
    constellation::{ConstellationArea, ConstellationMask},
    error::Error,
    nmea::NmeaMask,
};

/// Forced restart flavor, from the least to the most destructive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum RestartType {
    /// Keeps every aiding data
    Hot,
    /// Drops ephemerides
    Warm,
    /// Drops ephemerides, almanacs, time and position
    Cold,
    /// Drops everything, back to factory settings
    Factory,
}

impl std::fmt::Display for RestartType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Hot => write!(f, "hot"),
            Self::Warm => write!(f, "warm"),
            Self::Cold => write!(f, "cold"),
            Self::Factory => write!(f, "factory"),
        }
    }
}

/// SUPL assisted positioning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum AssistedMode {
    /// No assistance
    #[default]
    Standalone,
    /// Mobile station based: the device computes its own fix, with assistance data
    MsBased,
    /// Mobile station assisted: the network computes the fix
    MsAssisted,
}

/// Implement this trait to drive actual GNSS hardware.
/// The [crate::prelude::Device] owns its platform, and calls it with its lock held:
/// a platform never calls back into the device.
///
/// Optional capabilities have a default implementation that reports
/// [Error::Fault], meaning "not supported on this platform".
pub trait Platform: Send {
    /// Brings the engine up. Success is the "engine ready" signal.
    fn init(&mut self) -> Result<(), Error> {
        Ok(())
    }
    /// Acquires the hardware resource
    fn enable(&mut self) -> Result<(), Error> {
        Ok(())
    }
    /// Releases the hardware resource
    fn disable(&mut self) -> Result<(), Error> {
        Ok(())
    }
    /// Starts a positioning session
    fn start(&mut self) -> Result<(), Error>;
    /// Stops current positioning session
    fn stop(&mut self) -> Result<(), Error>;
    /// Restarts the (stopped) engine, possibly dropping aiding data
    fn force_restart(&mut self, restart: RestartType) -> Result<(), Error> {
        let _ = restart;
        Err(Error::Fault)
    }

    fn set_constellation(&mut self, mask: ConstellationMask) -> Result<(), Error>;
    fn constellation(&self) -> Result<ConstellationMask, Error>;

    fn set_constellation_area(
        &mut self,
        constellation: Constellation,
        area: ConstellationArea,
    ) -> Result<(), Error>;
    fn constellation_area(&self, constellation: Constellation) -> Result<ConstellationArea, Error>;

    /// Acquisition period [ms]
    fn set_acquisition_rate(&mut self, rate_ms: u32) -> Result<(), Error>;
    fn acquisition_rate(&self) -> Result<u32, Error>;

    fn set_nmea_sentences(&mut self, mask: NmeaMask) -> Result<(), Error>;
    fn nmea_sentences(&self) -> Result<NmeaMask, Error>;

    /// Elevation cutoff [deg]
    fn set_min_elevation(&mut self, elevation: u8) -> Result<(), Error>;
    fn min_elevation(&self) -> Result<u8, Error>;

    fn set_supl_assisted_mode(&mut self, mode: AssistedMode) -> Result<(), Error> {
        let _ = mode;
        Err(Error::Fault)
    }
    fn set_supl_server_url(&mut self, url: &str) -> Result<(), Error> {
        let _ = url;
        Ok(())
    }
    fn inject_supl_certificate(&mut self, id: u8, certificate: &[u8]) -> Result<(), Error> {
        let _ = (id, certificate);
        Ok(())
    }
    fn delete_supl_certificate(&mut self, id: u8) -> Result<(), Error> {
        let _ = id;
        Ok(())
    }

    fn enable_extended_ephemeris(&mut self) -> Result<(), Error> {
        Err(Error::Fault)
    }
    fn disable_extended_ephemeris(&mut self) -> Result<(), Error> {
        Err(Error::Fault)
    }
    /// Loads an extended ephemeris file
    fn load_extended_ephemeris(&mut self, data: &mut dyn Read) -> Result<(), Error> {
        let _ = data;
        Err(Error::Fault)
    }
    /// Returns (start, stop) validity of the loaded extended ephemeris
    fn extended_ephemeris_validity(&self) -> Result<(Epoch, Epoch), Error> {
        Err(Error::Fault)
    }
    /// Injects UTC time, with its uncertainty
    fn inject_utc_time(&mut self, utc: Epoch, uncertainty: Duration) -> Result<(), Error> {
        let _ = (utc, uncertainty);
        Err(Error::Fault)
    }
}
