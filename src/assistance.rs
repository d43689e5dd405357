//! SUPL assistance data
use log::debug;

use crate::{cfg::Config, error::Error};

/// SUPL certificate store: fixed number of slots, each either empty
/// or holding one certificate.
#[derive(Debug, Clone)]
pub(crate) struct SuplCertificates {
    slots: Vec<Option<Vec<u8>>>,
    max_len: usize,
}

impl SuplCertificates {
    pub fn new(cfg: &Config) -> Self {
        Self {
            slots: vec![None; cfg.supl_certificate_slots],
            max_len: cfg.max_supl_certificate_len,
        }
    }
    pub fn check_id(&self, id: u8) -> Result<(), Error> {
        if (id as usize) < self.slots.len() {
            Ok(())
        } else {
            debug!("supl certificate #{} out of {} slots", id, self.slots.len());
            Err(Error::BadParameter)
        }
    }
    pub fn check_certificate(&self, certificate: &[u8]) -> Result<(), Error> {
        if certificate.is_empty() || certificate.len() > self.max_len {
            debug!("invalid supl certificate size: {}", certificate.len());
            Err(Error::BadParameter)
        } else {
            Ok(())
        }
    }
    /// Stores a certificate, replacing prior content
    pub fn install(&mut self, id: u8, certificate: &[u8]) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = Some(certificate.to_vec());
        }
    }
    /// Empties a slot. Emptying an empty slot is fine.
    pub fn delete(&mut self, id: u8) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            *slot = None;
        }
    }
    pub fn get(&self, id: u8) -> Option<&[u8]> {
        self.slots.get(id as usize)?.as_deref()
    }
}

/// SUPL server URL must be non empty and fit `max_len` bytes
pub(crate) fn check_server_url(url: &str, max_len: usize) -> Result<(), Error> {
    if url.is_empty() || url.len() > max_len {
        debug!("invalid supl server url length: {}", url.len());
        Err(Error::BadParameter)
    } else {
        Ok(())
    }
}
