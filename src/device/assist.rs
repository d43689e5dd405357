//! Assistance: SUPL, extended ephemeris and time injection
use std::io::Read;

use hifitime::{Duration, Epoch};
use log::{error, info};

use super::Device;

use crate::{assistance::check_server_url, error::Error, platform::AssistedMode};

impl Device {
    /// Installs a SUPL certificate in slot `id`, replacing prior content
    pub fn inject_supl_certificate(&self, id: u8, certificate: &[u8]) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_initialized("inject supl certificate")?;
        core.certificates.check_id(id)?;
        core.certificates.check_certificate(certificate)?;
        core.platform
            .inject_supl_certificate(id, certificate)
            .map_err(|e| {
                error!("supl certificate #{}: injection failed: {}", id, e);
                e
            })?;
        core.certificates.install(id, certificate);
        info!("supl certificate #{} installed", id);
        Ok(())
    }
    /// Empties SUPL certificate slot `id`. Deleting an empty slot succeeds.
    pub fn delete_supl_certificate(&self, id: u8) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_initialized("delete supl certificate")?;
        core.certificates.check_id(id)?;
        core.platform.delete_supl_certificate(id).map_err(|e| {
            error!("supl certificate #{}: deletion failed: {}", id, e);
            e
        })?;
        core.certificates.delete(id);
        info!("supl certificate #{} deleted", id);
        Ok(())
    }
    /// True if slot `id` holds a certificate
    pub fn supl_certificate_installed(&self, id: u8) -> Result<bool, Error> {
        let core = self.lock();
        core.require_initialized("supl certificate")?;
        core.certificates.check_id(id)?;
        Ok(core.certificates.get(id).is_some())
    }
    pub fn set_supl_server_url(&self, url: &str) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_initialized("set supl server url")?;
        check_server_url(url, core.cfg.max_supl_url_len)?;
        core.platform.set_supl_server_url(url)?;
        info!("supl server: {}", url);
        Ok(())
    }
    pub fn supl_assisted_mode(&self) -> Result<AssistedMode, Error> {
        let core = self.lock();
        core.require_initialized("get supl assisted mode")?;
        Ok(core.assisted_mode)
    }
    pub fn set_supl_assisted_mode(&self, mode: AssistedMode) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_initialized("set supl assisted mode")?;
        core.platform.set_supl_assisted_mode(mode).map_err(|e| {
            error!("supl assisted mode {:?}: {}", mode, e);
            e
        })?;
        core.assisted_mode = mode;
        Ok(())
    }
    pub fn enable_extended_ephemeris(&self) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_enabled("enable extended ephemeris")?;
        core.platform.enable_extended_ephemeris()
    }
    pub fn disable_extended_ephemeris(&self) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_enabled("disable extended ephemeris")?;
        core.platform.disable_extended_ephemeris()
    }
    /// Loads an extended ephemeris file from `data`
    pub fn load_extended_ephemeris(&self, data: &mut dyn Read) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_enabled("load extended ephemeris")?;
        core.platform.load_extended_ephemeris(data)
    }
    /// (start, stop) validity of the loaded extended ephemeris
    pub fn extended_ephemeris_validity(&self) -> Result<(Epoch, Epoch), Error> {
        let core = self.lock();
        core.require_enabled("extended ephemeris validity")?;
        core.platform.extended_ephemeris_validity()
    }
    /// Injects UTC time, with its uncertainty, to speed up acquisition
    pub fn inject_utc_time(&self, utc: Epoch, uncertainty: Duration) -> Result<(), Error> {
        let mut core = self.lock();
        core.require_enabled("inject utc time")?;
        core.platform.inject_utc_time(utc, uncertainty)
    }
}
