//! In-memory [Platform], for testing and demonstration
use std::io::Read;

use gnss::prelude::{Constellation, SV};
use hifitime::{Duration, Epoch, TimeScale};
use log::debug;

use crate::{
    constellation::{ConstellationArea, ConstellationMask},
    error::Error,
    nmea::NmeaMask,
    platform::{AssistedMode, Platform, RestartType},
    sample::{Dop, FixState, PositionSample, SatelliteInfo},
};

/// Optional features the simulated hardware supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Forced restarts
    pub restart: bool,
    /// Extended ephemeris enable, disable, load and validity
    pub extended_ephemeris: bool,
    /// UTC time injection
    pub utc_injection: bool,
    /// SUPL assisted mode selection, standalone included
    pub assisted_mode: bool,
    /// Constellation area can be read back
    pub constellation_area_readback: bool,
    /// Acquisition rate can be read back
    pub acquisition_rate_readback: bool,
}

impl Capabilities {
    /// Every capability
    pub fn full() -> Self {
        Self {
            restart: true,
            extended_ephemeris: true,
            utc_injection: true,
            assisted_mode: true,
            constellation_area_readback: true,
            acquisition_rate_readback: true,
        }
    }
}

/// Simulated GNSS hardware
#[derive(Debug, Clone)]
pub struct SimuPlatform {
    caps: Capabilities,
    fail_start: bool,
    running: bool,
    constellation: ConstellationMask,
    areas: Vec<(Constellation, ConstellationArea)>,
    acquisition_rate_ms: u32,
    nmea: NmeaMask,
    min_elevation: u8,
    /// Simulated wall clock
    clock: Epoch,
    extended_ephemeris: Option<(Epoch, Epoch)>,
}

impl Default for SimuPlatform {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}

impl SimuPlatform {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            fail_start: false,
            running: false,
            constellation: ConstellationMask::GPS | ConstellationMask::GLONASS,
            areas: Vec::new(),
            acquisition_rate_ms: 1000,
            nmea: NmeaMask::MAX,
            min_elevation: 10,
            clock: Epoch::from_gregorian_utc_at_midnight(2024, 3, 1),
            extended_ephemeris: None,
        }
    }
    /// Returns a copy of Self that refuses to start
    pub fn with_failing_start(&self) -> Self {
        let mut s = self.clone();
        s.fail_start = true;
        s
    }
    fn supported(&self, supported: bool, op: &str) -> Result<(), Error> {
        if supported {
            Ok(())
        } else {
            debug!("simu: {} not supported", op);
            Err(Error::Fault)
        }
    }
}

impl Platform for SimuPlatform {
    fn start(&mut self) -> Result<(), Error> {
        if self.fail_start {
            return Err(Error::Fault);
        }
        self.running = true;
        Ok(())
    }
    fn stop(&mut self) -> Result<(), Error> {
        self.running = false;
        Ok(())
    }
    fn force_restart(&mut self, restart: RestartType) -> Result<(), Error> {
        self.supported(self.caps.restart, "restart")?;
        if self.running {
            debug!("simu: restart requires a stopped engine");
            return Err(Error::Fault);
        }
        if matches!(restart, RestartType::Cold | RestartType::Factory) {
            self.extended_ephemeris = None;
        }
        self.running = true;
        Ok(())
    }
    fn set_constellation(&mut self, mask: ConstellationMask) -> Result<(), Error> {
        self.constellation = mask;
        Ok(())
    }
    fn constellation(&self) -> Result<ConstellationMask, Error> {
        Ok(self.constellation)
    }
    fn set_constellation_area(
        &mut self,
        constellation: Constellation,
        area: ConstellationArea,
    ) -> Result<(), Error> {
        match self.areas.iter_mut().find(|(c, _)| *c == constellation) {
            Some((_, a)) => *a = area,
            None => self.areas.push((constellation, area)),
        }
        Ok(())
    }
    fn constellation_area(&self, constellation: Constellation) -> Result<ConstellationArea, Error> {
        self.supported(self.caps.constellation_area_readback, "area readback")?;
        Ok(self
            .areas
            .iter()
            .find(|(c, _)| *c == constellation)
            .map(|(_, area)| *area)
            .unwrap_or_default())
    }
    fn set_acquisition_rate(&mut self, rate_ms: u32) -> Result<(), Error> {
        self.acquisition_rate_ms = rate_ms;
        Ok(())
    }
    fn acquisition_rate(&self) -> Result<u32, Error> {
        self.supported(self.caps.acquisition_rate_readback, "acquisition rate readback")?;
        Ok(self.acquisition_rate_ms)
    }
    fn set_nmea_sentences(&mut self, mask: NmeaMask) -> Result<(), Error> {
        self.nmea = mask;
        Ok(())
    }
    fn nmea_sentences(&self) -> Result<NmeaMask, Error> {
        Ok(self.nmea)
    }
    fn set_min_elevation(&mut self, elevation: u8) -> Result<(), Error> {
        self.min_elevation = elevation;
        Ok(())
    }
    fn min_elevation(&self) -> Result<u8, Error> {
        Ok(self.min_elevation)
    }
    fn set_supl_assisted_mode(&mut self, mode: AssistedMode) -> Result<(), Error> {
        self.supported(self.caps.assisted_mode, "assisted mode")?;
        debug!("simu: assisted mode {:?}", mode);
        Ok(())
    }
    fn enable_extended_ephemeris(&mut self) -> Result<(), Error> {
        self.supported(self.caps.extended_ephemeris, "extended ephemeris")
    }
    fn disable_extended_ephemeris(&mut self) -> Result<(), Error> {
        self.supported(self.caps.extended_ephemeris, "extended ephemeris")
    }
    fn load_extended_ephemeris(&mut self, data: &mut dyn Read) -> Result<(), Error> {
        self.supported(self.caps.extended_ephemeris, "extended ephemeris")?;
        let mut content = Vec::new();
        data.read_to_end(&mut content).map_err(|e| {
            debug!("simu: extended ephemeris read error: {}", e);
            Error::Fault
        })?;
        if content.is_empty() {
            return Err(Error::Fault);
        }
        self.extended_ephemeris = Some((self.clock, self.clock + Duration::from_days(7.0)));
        Ok(())
    }
    fn extended_ephemeris_validity(&self) -> Result<(Epoch, Epoch), Error> {
        self.supported(self.caps.extended_ephemeris, "extended ephemeris")?;
        self.extended_ephemeris.ok_or(Error::Fault)
    }
    fn inject_utc_time(&mut self, utc: Epoch, uncertainty: Duration) -> Result<(), Error> {
        self.supported(self.caps.utc_injection, "utc injection")?;
        debug!("simu: clock set to {} (+/- {})", utc, uncertainty);
        self.clock = utc;
        Ok(())
    }
}

fn satellite(constellation: Constellation, prn: u8, azimuth: u16, elevation: u8, snr: u8) -> SatelliteInfo {
    SatelliteInfo {
        sv: SV { constellation, prn },
        used: snr >= 30,
        snr,
        azimuth,
        elevation,
    }
}

/// Complete 3D fix, every value known
pub fn valid_fix() -> PositionSample {
    let utc = Epoch::from_gregorian_utc(2024, 3, 1, 12, 34, 56, 789_000_000);
    let satellites = vec![
        satellite(Constellation::GPS, 5, 45, 62, 44),
        satellite(Constellation::GPS, 13, 140, 35, 41),
        satellite(Constellation::GPS, 20, 230, 48, 39),
        satellite(Constellation::GPS, 29, 310, 22, 35),
        satellite(Constellation::Galileo, 11, 95, 15, 33),
        satellite(Constellation::Glonass, 3, 200, 8, 0),
    ];
    PositionSample {
        fix_state: FixState::Fix3D,
        utc: Some(utc),
        gps: Some(utc.to_time_scale(TimeScale::GPST)),
        time_accuracy: Some(25),
        leap_seconds: Some(18),
        latitude: Some(48.858_37),
        longitude: Some(2.294_48),
        h_accuracy: Some(3.5),
        altitude: Some(35.0),
        altitude_wgs84: Some(79.6),
        v_accuracy: Some(5.0),
        h_speed: Some(1.25),
        h_speed_accuracy: Some(0.2),
        v_speed: Some(-0.1),
        v_speed_accuracy: Some(0.3),
        direction: Some(271.5),
        direction_accuracy: Some(2.0),
        magnetic_deviation: Some(1.7),
        dop: Dop::from_geometry(&satellites).unwrap_or_default(),
        sats_in_view: None,
        sats_tracking: None,
        sats_used: None,
        satellites: Some(satellites),
    }
}
