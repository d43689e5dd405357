//! GNSS device context
//!
//! [Device] is the one handle every caller goes through. Clones share the same
//! engine: state machine, sample pool, observer registry, assistance data
//! and the [Platform] all live behind a single lock.
use std::{
    sync::{atomic::AtomicBool, Arc, Weak},
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::{
    assistance::SuplCertificates,
    cfg::Config,
    error::Error,
    event::{
        self,
        hub::{Hub, PositionHandlerRef},
        LoopHandle,
    },
    platform::{AssistedMode, Platform, RestartType},
    pool::{SamplePool, SampleRef, SampleRelease},
    sample::{FixState, PositionSample},
};

mod assist;
mod reader;
mod settings;

/// Device lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// [Device::init] not called yet
    Uninitialized,
    /// Hardware resource released
    Disabled,
    /// Engine stopped, configurable
    Ready,
    /// Engine running, producing fixes
    Active,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Disabled => write!(f, "disabled"),
            Self::Ready => write!(f, "ready"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Time to first fix measurement
struct Session {
    started: Instant,
    ttff: Option<Duration>,
}

impl Session {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            ttff: None,
        }
    }
}

pub(crate) struct Core {
    state: State,
    cfg: Config,
    platform: Box<dyn Platform>,
    pool: SamplePool,
    hub: Hub,
    certificates: SuplCertificates,
    assisted_mode: AssistedMode,
    session: Option<Session>,
}

impl Core {
    fn set_state(&mut self, state: State) {
        if self.state != state {
            info!("{} -> {}", self.state, state);
            self.state = state;
        }
    }
    fn reject(&self, op: &str, err: Error) -> Error {
        debug!("{}: {} ({} state)", op, err, self.state);
        err
    }
    fn start(&mut self) -> Result<(), Error> {
        match self.state {
            State::Uninitialized | State::Disabled => Err(self.reject("start", Error::NotPermitted)),
            State::Active => Err(self.reject("start", Error::Duplicate)),
            State::Ready => {
                self.platform.start().map_err(|e| {
                    error!("failed to start engine: {}", e);
                    Error::Fault
                })?;
                self.session = Some(Session::new());
                self.set_state(State::Active);
                Ok(())
            },
        }
    }
    fn stop(&mut self) -> Result<(), Error> {
        match self.state {
            State::Uninitialized | State::Disabled => Err(self.reject("stop", Error::NotPermitted)),
            State::Ready => Err(self.reject("stop", Error::Duplicate)),
            State::Active => {
                self.platform.stop().map_err(|e| {
                    error!("failed to stop engine: {}", e);
                    Error::Fault
                })?;
                self.session = None;
                self.set_state(State::Ready);
                Ok(())
            },
        }
    }
}

pub(crate) struct Shared {
    core: Mutex<Core>,
}

impl SampleRelease for Shared {
    fn release(&self, sample: SampleRef) {
        if let Err(e) = self.core.lock().pool.release(sample) {
            warn!("{}: {}", sample, e);
        }
    }
}

/// GNSS device: lifecycle, configuration, position samples and observers.
/// Cheap to clone, every clone drives the same engine.
#[derive(Clone)]
pub struct Device {
    shared: Arc<Shared>,
}

impl Device {
    /// Builds a new [Device] on top of given [Platform].
    /// The device is [State::Uninitialized] until [Device::init].
    pub fn new<P: Platform + 'static>(platform: P, cfg: Config) -> Self {
        let core = Core {
            state: State::Uninitialized,
            certificates: SuplCertificates::new(&cfg),
            platform: Box::new(platform),
            pool: SamplePool::default(),
            hub: Hub::default(),
            assisted_mode: AssistedMode::default(),
            session: None,
            cfg,
        };
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(core),
            }),
        }
    }
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.shared.core.lock()
    }
    fn owner(&self) -> Weak<dyn SampleRelease> {
        Arc::downgrade(&self.shared) as Weak<dyn SampleRelease>
    }
    /// Current lifecycle [State]
    pub fn state(&self) -> State {
        self.lock().state
    }
    /// Initializes the engine, once. The device ends up Ready,
    /// or Active when [Config::start_on_init] is set.
    pub fn init(&self) -> Result<(), Error> {
        let mut core = self.lock();
        if core.state != State::Uninitialized {
            return Err(core.reject("init", Error::NotPermitted));
        }
        core.platform.init().map_err(|e| {
            error!("engine init failed: {}", e);
            Error::Fault
        })?;
        core.set_state(State::Ready);
        if core.cfg.start_on_init {
            core.start()?;
        }
        Ok(())
    }
    /// Acquires the hardware resource: Disabled to Ready
    pub fn enable(&self) -> Result<(), Error> {
        let mut core = self.lock();
        match core.state {
            State::Uninitialized => Err(core.reject("enable", Error::NotPermitted)),
            State::Ready | State::Active => Err(core.reject("enable", Error::Duplicate)),
            State::Disabled => {
                core.platform.enable().map_err(|e| {
                    error!("failed to enable engine: {}", e);
                    Error::Fault
                })?;
                core.set_state(State::Ready);
                Ok(())
            },
        }
    }
    /// Releases the hardware resource: Ready to Disabled
    pub fn disable(&self) -> Result<(), Error> {
        let mut core = self.lock();
        match core.state {
            State::Uninitialized | State::Active => {
                Err(core.reject("disable", Error::NotPermitted))
            },
            State::Disabled => Err(core.reject("disable", Error::Duplicate)),
            State::Ready => {
                core.platform.disable().map_err(|e| {
                    error!("failed to disable engine: {}", e);
                    Error::Fault
                })?;
                core.set_state(State::Disabled);
                Ok(())
            },
        }
    }
    /// Starts the engine: Ready to Active. Starts a new TTFF session.
    pub fn start(&self) -> Result<(), Error> {
        self.lock().start()
    }
    /// Stops the engine: Active to Ready
    pub fn stop(&self) -> Result<(), Error> {
        self.lock().stop()
    }
    /// Forces a restart of the running engine.
    /// On failure the engine remains stopped (Ready).
    pub fn force_restart(&self, restart: RestartType) -> Result<(), Error> {
        let mut core = self.lock();
        if core.state != State::Active {
            return Err(core.reject("restart", Error::NotPermitted));
        }
        core.stop()?;
        match core.platform.force_restart(restart) {
            Ok(()) => {
                info!("{} restart", restart);
                core.session = Some(Session::new());
                core.set_state(State::Active);
                Ok(())
            },
            Err(e) => {
                error!("{} restart failed: {}", restart, e);
                Err(Error::Fault)
            },
        }
    }
    /// Time to first fix of the current session.
    /// [Error::OutOfRange] while the session has no fix.
    pub fn ttff(&self) -> Result<Duration, Error> {
        let core = self.lock();
        match core.state {
            State::Uninitialized | State::Disabled => Err(core.reject("ttff", Error::NotPermitted)),
            State::Ready => Err(core.reject("ttff", Error::Fault)),
            State::Active => core
                .session
                .as_ref()
                .and_then(|session| session.ttff)
                .ok_or(Error::OutOfRange),
        }
    }
    /// Pushes a new fix, as produced by the platform.
    /// The fix becomes the last sample and is delivered to every handler.
    /// Returns the number of deliveries.
    pub fn report_position(&self, sample: PositionSample) -> Result<usize, Error> {
        let owner = self.owner();
        let mut core = self.lock();
        if core.state != State::Active {
            return Err(core.reject("report position", Error::NotPermitted));
        }
        if sample.fix_state != FixState::NoFix {
            if let Some(session) = core.session.as_mut() {
                if session.ttff.is_none() {
                    let ttff = session.started.elapsed();
                    info!("ttff: {:?}", ttff);
                    session.ttff = Some(ttff);
                }
            }
        }
        let snapshot = Arc::new(sample);
        let core = &mut *core;
        core.pool.set_last(snapshot.clone());
        Ok(core.hub.dispatch(&mut core.pool, &snapshot, &owner))
    }
    /// Registers `callback` for every new fix. The callback runs on the calling
    /// thread's [event::EventLoop] and owns each delivered [SampleRef].
    /// Fails with [Error::Fault] if this thread has no event loop.
    pub fn add_position_handler<F>(&self, callback: F) -> Result<PositionHandlerRef, Error>
    where
        F: FnMut(SampleRef) + 'static,
    {
        let mailbox = LoopHandle::current().ok_or_else(|| {
            warn!("position handler: no event loop on this thread");
            Error::Fault
        })?;
        let active = Arc::new(AtomicBool::new(true));
        let handler = self.lock().hub.register(mailbox, active.clone());
        event::insert_local(handler.id(), active, Box::new(callback))?;
        debug!("{} registered", handler);
        Ok(handler)
    }
    /// Removes a position handler, from any thread. Once this returns,
    /// the handler is not running and will never run again.
    /// [Error::Timeout] if its event loop did not acknowledge in time:
    /// no new delivery starts, but one may still be running.
    pub fn remove_position_handler(&self, handler: PositionHandlerRef) -> Result<(), Error> {
        let (registration, timeout) = {
            let mut core = self.lock();
            let registration = core.hub.unregister(handler).ok_or_else(|| {
                warn!("{}: unknown handler", handler);
                Error::BadParameter
            })?;
            (registration, core.cfg.removal_timeout())
        };
        registration.detach(timeout)?;
        debug!("{} removed", handler);
        Ok(())
    }
    /// Number of registered position handlers
    pub fn position_handlers(&self) -> usize {
        self.lock().hub.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::simu::{valid_fix, SimuPlatform};

    #[test]
    fn stale_release_leaves_pool_untouched() {
        let device = Device::new(SimuPlatform::default(), Config::default());
        device.init().unwrap();
        let sample = device.lock().pool.issue(Arc::new(valid_fix()));
        let other = device.lock().pool.issue(Arc::new(valid_fix()));

        device.shared.release(sample);
        assert_eq!(device.outstanding_samples(), 1);
        // released twice: logged, nothing else changes
        device.shared.release(sample);
        assert_eq!(device.outstanding_samples(), 1);
        assert!(device.lock().pool.get(other).is_ok());
    }
}
