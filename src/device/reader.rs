//! Position sample accessors
use std::sync::Arc;

use super::Device;

use crate::{
    error::Error,
    pool::SampleRef,
    sample::{DopType, FixState, PositionSample, SatelliteCounts, SatelliteSlots},
};

impl Device {
    fn sample(&self, sample: SampleRef) -> Result<Arc<PositionSample>, Error> {
        self.lock().pool.get(sample)
    }
    /// Issues a new reference onto the last produced fix.
    /// The caller owns it and must release it.
    pub fn get_last_sample(&self) -> Result<SampleRef, Error> {
        let mut core = self.lock();
        let last = core
            .pool
            .last()
            .ok_or_else(|| core.reject("last sample", Error::Fault))?;
        Ok(core.pool.issue(last))
    }
    /// Releases a sample reference. Any later use of it fails with [Error::InvalidHandle].
    pub fn release_sample(&self, sample: SampleRef) -> Result<(), Error> {
        self.lock().pool.release(sample)
    }
    /// Number of sample references issued and not released yet
    pub fn outstanding_samples(&self) -> usize {
        self.lock().pool.outstanding()
    }
    pub fn position_state(
        &self,
        sample: SampleRef,
        state: Option<&mut FixState>,
    ) -> Result<(), Error> {
        self.sample(sample)?.position_state(state)
    }
    /// Latitude, longitude [ddeg] and horizontal accuracy [m]
    pub fn location(
        &self,
        sample: SampleRef,
        latitude: Option<&mut f64>,
        longitude: Option<&mut f64>,
        h_accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        self.sample(sample)?
            .location(latitude, longitude, h_accuracy)
    }
    /// Altitude above mean sea level and vertical accuracy [m]
    pub fn altitude(
        &self,
        sample: SampleRef,
        altitude: Option<&mut f64>,
        v_accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        self.sample(sample)?.altitude(altitude, v_accuracy)
    }
    /// Altitude above the WGS-84 ellipsoid [m]
    pub fn altitude_wgs84(&self, sample: SampleRef, altitude: Option<&mut f64>) -> Result<(), Error> {
        self.sample(sample)?.altitude_wgs84(altitude)
    }
    /// UTC date
    pub fn date(
        &self,
        sample: SampleRef,
        year: Option<&mut u16>,
        month: Option<&mut u8>,
        day: Option<&mut u8>,
    ) -> Result<(), Error> {
        self.sample(sample)?.date(year, month, day)
    }
    /// UTC time of day
    pub fn time(
        &self,
        sample: SampleRef,
        hours: Option<&mut u8>,
        minutes: Option<&mut u8>,
        seconds: Option<&mut u8>,
        milliseconds: Option<&mut u16>,
    ) -> Result<(), Error> {
        self.sample(sample)?
            .time(hours, minutes, seconds, milliseconds)
    }
    /// Milliseconds since the UNIX epoch
    pub fn epoch_time(&self, sample: SampleRef, milliseconds: Option<&mut u64>) -> Result<(), Error> {
        self.sample(sample)?.epoch_time(milliseconds)
    }
    /// GPS week and time of week [ms]
    pub fn gps_time(
        &self,
        sample: SampleRef,
        week: Option<&mut u32>,
        time_of_week_ms: Option<&mut u32>,
    ) -> Result<(), Error> {
        self.sample(sample)?.gps_time(week, time_of_week_ms)
    }
    /// Time accuracy [ns]
    pub fn time_accuracy(&self, sample: SampleRef, accuracy: Option<&mut u32>) -> Result<(), Error> {
        self.sample(sample)?.time_accuracy(accuracy)
    }
    pub fn gps_leap_seconds(&self, sample: SampleRef, leap_seconds: Option<&mut u8>) -> Result<(), Error> {
        self.sample(sample)?.gps_leap_seconds(leap_seconds)
    }
    /// Horizontal speed and accuracy [m/s]
    pub fn horizontal_speed(
        &self,
        sample: SampleRef,
        speed: Option<&mut f64>,
        accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        self.sample(sample)?.horizontal_speed(speed, accuracy)
    }
    /// Vertical speed and accuracy [m/s]
    pub fn vertical_speed(
        &self,
        sample: SampleRef,
        speed: Option<&mut f64>,
        accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        self.sample(sample)?.vertical_speed(speed, accuracy)
    }
    /// Direction of travel and accuracy [deg]
    pub fn direction(
        &self,
        sample: SampleRef,
        direction: Option<&mut f64>,
        accuracy: Option<&mut f64>,
    ) -> Result<(), Error> {
        self.sample(sample)?.direction(direction, accuracy)
    }
    pub fn magnetic_deviation(&self, sample: SampleRef, deviation: Option<&mut f64>) -> Result<(), Error> {
        self.sample(sample)?.magnetic_deviation(deviation)
    }
    /// HDOP, VDOP and PDOP at once
    pub fn dop(
        &self,
        sample: SampleRef,
        hdop: Option<&mut f64>,
        vdop: Option<&mut f64>,
        pdop: Option<&mut f64>,
    ) -> Result<(), Error> {
        self.sample(sample)?.dop(hdop, vdop, pdop)
    }
    /// Dilution of precision of any [DopType]
    pub fn dilution_of_precision(
        &self,
        sample: SampleRef,
        kind: DopType,
        dop: Option<&mut f64>,
    ) -> Result<(), Error> {
        self.sample(sample)?.dilution_of_precision(kind, dop)
    }
    /// Satellites in view, tracked and used in the fix
    pub fn satellites_status(
        &self,
        sample: SampleRef,
        in_view: Option<&mut u8>,
        tracking: Option<&mut u8>,
        used: Option<&mut u8>,
    ) -> Result<(), Error> {
        self.sample(sample)?
            .satellites_status(in_view, tracking, used)
    }
    /// Satellite table, filled up to each slice capacity
    pub fn satellites_info(
        &self,
        sample: SampleRef,
        slots: SatelliteSlots,
    ) -> Result<SatelliteCounts, Error> {
        self.sample(sample)?.satellites_info(slots)
    }
}
