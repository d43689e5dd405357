//! Engine configuration surface.
//! Everything but the elevation cutoff is only configurable while Ready.
use gnss::prelude::Constellation;
use log::{debug, error};

use super::{Core, Device, State};

use crate::{
    constellation::{supports_area, ConstellationArea, ConstellationMask},
    error::Error,
    nmea::NmeaMask,
};

/// Logs a platform failure, passing it through
fn platform_error(op: &'static str) -> impl Fn(Error) -> Error {
    move |e| {
        error!("{}: platform failure: {}", op, e);
        e
    }
}

impl Core {
    pub(super) fn require_ready(&self, op: &str) -> Result<(), Error> {
        if self.state == State::Ready {
            Ok(())
        } else {
            Err(self.reject(op, Error::NotPermitted))
        }
    }
    pub(super) fn require_initialized(&self, op: &str) -> Result<(), Error> {
        if self.state == State::Uninitialized {
            Err(self.reject(op, Error::NotPermitted))
        } else {
            Ok(())
        }
    }
    /// Ready or Active
    pub(super) fn require_enabled(&self, op: &str) -> Result<(), Error> {
        match self.state {
            State::Ready | State::Active => Ok(()),
            _ => Err(self.reject(op, Error::NotPermitted)),
        }
    }
}

impl Device {
    /// Selects the constellations to track. GPS is mandatory.
    pub fn set_constellation(&self, mask: ConstellationMask) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_ready("set constellation")?;
        if mask.is_empty() || !mask.is_valid() {
            return Err(core.reject("set constellation", Error::BadParameter));
        }
        if !mask.contains(ConstellationMask::GPS) {
            return Err(core.reject("set constellation", Error::Unsupported));
        }
        core.platform
            .set_constellation(mask)
            .map_err(platform_error("set constellation"))?;
        debug!("constellation: {}", mask);
        Ok(())
    }
    pub fn constellation(&self) -> Result<ConstellationMask, Error> {
        let core = self.lock();
        core.require_ready("get constellation")?;
        core.platform
            .constellation()
            .map_err(platform_error("get constellation"))
    }
    /// Restricts given constellation to a coverage area
    pub fn set_constellation_area(
        &self,
        constellation: Constellation,
        area: ConstellationArea,
    ) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_ready("set constellation area")?;
        if !supports_area(constellation) {
            return Err(core.reject("set constellation area", Error::BadParameter));
        }
        core.platform
            .set_constellation_area(constellation, area)
            .map_err(platform_error("set constellation area"))?;
        debug!("{:?} area: {:?}", constellation, area);
        Ok(())
    }
    pub fn constellation_area(&self, constellation: Constellation) -> Result<ConstellationArea, Error> {
        let core = self.lock();
        core.require_ready("get constellation area")?;
        if !supports_area(constellation) {
            return Err(core.reject("get constellation area", Error::BadParameter));
        }
        core.platform
            .constellation_area(constellation)
            .map_err(platform_error("get constellation area"))
    }
    /// Acquisition period [ms], no shorter than [crate::prelude::Config::min_acquisition_rate_ms]
    pub fn set_acquisition_rate(&self, rate_ms: u32) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_ready("set acquisition rate")?;
        if rate_ms == 0 || rate_ms < core.cfg.min_acquisition_rate_ms {
            return Err(core.reject("set acquisition rate", Error::OutOfRange));
        }
        core.platform
            .set_acquisition_rate(rate_ms)
            .map_err(platform_error("set acquisition rate"))?;
        debug!("acquisition rate: {} ms", rate_ms);
        Ok(())
    }
    pub fn acquisition_rate(&self) -> Result<u32, Error> {
        let core = self.lock();
        core.require_ready("get acquisition rate")?;
        core.platform
            .acquisition_rate()
            .map_err(platform_error("get acquisition rate"))
    }
    /// Selects the NMEA sentences to output
    pub fn set_nmea_sentences(&self, mask: NmeaMask) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_ready("set nmea sentences")?;
        if !mask.is_valid() {
            return Err(core.reject("set nmea sentences", Error::BadParameter));
        }
        core.platform
            .set_nmea_sentences(mask)
            .map_err(platform_error("set nmea sentences"))?;
        debug!("nmea sentences: {:#x}", mask);
        Ok(())
    }
    pub fn nmea_sentences(&self) -> Result<NmeaMask, Error> {
        let core = self.lock();
        core.require_ready("get nmea sentences")?;
        core.platform
            .nmea_sentences()
            .map_err(platform_error("get nmea sentences"))
    }
    /// Elevation cutoff [deg], within 0..=90. Configurable in every state.
    pub fn set_min_elevation(&self, elevation: u8) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_initialized("set min elevation")?;
        if elevation > 90 {
            return Err(core.reject("set min elevation", Error::OutOfRange));
        }
        core.platform
            .set_min_elevation(elevation)
            .map_err(platform_error("set min elevation"))?;
        debug!("min elevation: {}°", elevation);
        Ok(())
    }
    pub fn min_elevation(&self) -> Result<u8, Error> {
        let core = self.lock();
        core.require_initialized("get min elevation")?;
        core.platform
            .min_elevation()
            .map_err(platform_error("get min elevation"))
    }
}
