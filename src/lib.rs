#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod assistance;
mod cfg;
mod constellation;
mod device;
mod error;
mod event;
mod nmea;
mod platform;
mod pool;
mod sample;

pub mod simu;
pub mod sync;

// pub export
pub use error::{Error, Status};


// prelude
pub mod prelude {
    pub use crate::cfg::Config;
    pub use crate::constellation::{sbas_category, ConstellationArea, ConstellationMask, SbasCategory};
    pub use crate::device::{Device, State};
    pub use crate::error::{Error, Status};
    pub use crate::event::{hub::PositionHandlerRef, EventLoop, LoopHandle, PositionCallback};
    pub use crate::nmea::NmeaMask;
    pub use crate::platform::{AssistedMode, Platform, RestartType};
    pub use crate::pool::SampleRef;
    pub use crate::sample::{
        Dop, DopType, FixState, PositionSample, SatelliteCounts, SatelliteInfo, SatelliteSlots,
        Unknown,
    };
    pub use crate::sync::Semaphore;
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}
