//! Engine configuration
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Engine tunables, latched when the [crate::prelude::Device] is created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Start the engine as part of initialization, so the device
    /// comes up [crate::prelude::State::Active]. Otherwise it stays Ready.
    pub start_on_init: bool,
    /// Shortest acquisition period accepted [ms]
    pub min_acquisition_rate_ms: u32,
    /// Number of SUPL certificate slots. Valid ids are `0..slots`.
    pub supl_certificate_slots: usize,
    /// Maximal SUPL certificate size [bytes]
    pub max_supl_certificate_len: usize,
    /// Maximal SUPL server URL length [bytes]
    pub max_supl_url_len: usize,
    /// Bound on the cross-thread handler removal handshake [ms]
    pub removal_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_on_init: true,
            min_acquisition_rate_ms: 100,
            supl_certificate_slots: 10,
            max_supl_certificate_len: 2000,
            max_supl_url_len: 256,
            removal_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Returns a copy of Self that leaves the device Ready after initialization
    pub fn with_manual_start(&self) -> Self {
        let mut s = self.clone();
        s.start_on_init = false;
        s
    }
    pub(crate) fn removal_timeout(&self) -> Duration {
        Duration::from_millis(self.removal_timeout_ms)
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert!(cfg.start_on_init);
        assert_eq!(cfg.min_acquisition_rate_ms, 100);
        assert_eq!(cfg.supl_certificate_slots, 10);
        assert_eq!(cfg.removal_timeout().as_secs(), 5);
        assert!(!cfg.with_manual_start().start_on_init);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_deserialization() {
        let cfg: Config =
            serde_json::from_str(r#"{ "start_on_init": false, "supl_certificate_slots": 1 }"#)
                .unwrap();
        assert!(!cfg.start_on_init);
        assert_eq!(cfg.supl_certificate_slots, 1);
        assert_eq!(cfg.min_acquisition_rate_ms, 100);
        assert_eq!(cfg.max_supl_url_len, 256);
    }
}
