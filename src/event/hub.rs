//! Position observer registry
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use crossbeam::channel::{self, RecvTimeoutError};
use log::{debug, warn};

use super::{remove_local, LoopHandle, Message};

use crate::{
    error::Error,
    pool::{PendingSample, SamplePool, SampleRelease},
    sample::PositionSample,
};

/// Handler identifiers are unique process-wide: every thread-local
/// handler table may hold registrations of several devices.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Reference onto one position handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionHandlerRef(u64);

impl PositionHandlerRef {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PositionHandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// One registered handler: where to post deliveries
pub(crate) struct Registration {
    id: u64,
    mailbox: LoopHandle,
    active: Arc<AtomicBool>,
}

impl Registration {
    /// Waits until the handler can no longer run.
    /// On the handler's own thread this is immediate, otherwise the loop
    /// acknowledges once every prior delivery has completed.
    pub fn detach(self, timeout: Duration) -> Result<(), Error> {
        if self.mailbox.is_current() {
            remove_local(self.id);
            return Ok(());
        }
        let (ack, acked) = channel::bounded(1);
        if self
            .mailbox
            .post(Message::Unregister { id: self.id, ack })
            .is_err()
        {
            debug!("handler#{}: event loop gone", self.id);
            return Ok(());
        }
        match acked.recv_timeout(timeout) {
            Ok(()) => Ok(()),
            // loop dropped with the request still queued
            Err(RecvTimeoutError::Disconnected) => Ok(()),
            Err(RecvTimeoutError::Timeout) => {
                warn!("handler#{}: removal not acknowledged", self.id);
                Err(Error::Timeout)
            },
        }
    }
}

#[derive(Default)]
pub(crate) struct Hub {
    registrations: BTreeMap<u64, Registration>,
}

impl Hub {
    /// Registers a handler reachable through `mailbox`. `active` is shared
    /// with the loop and gates every delivery.
    pub fn register(&mut self, mailbox: LoopHandle, active: Arc<AtomicBool>) -> PositionHandlerRef {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        self.registrations.insert(
            id,
            Registration {
                id,
                mailbox,
                active,
            },
        );
        PositionHandlerRef(id)
    }
    /// Withdraws a registration. No delivery starts once this returns.
    pub fn unregister(&mut self, handler: PositionHandlerRef) -> Option<Registration> {
        let registration = self.registrations.remove(&handler.id())?;
        registration.active.store(false, Ordering::Release);
        Some(registration)
    }
    pub fn len(&self) -> usize {
        self.registrations.len()
    }
    /// Posts one new reference onto `snapshot` to every registration,
    /// in registration order. Returns the number of posted deliveries.
    pub fn dispatch(
        &self,
        pool: &mut SamplePool,
        snapshot: &Arc<PositionSample>,
        owner: &Weak<dyn SampleRelease>,
    ) -> usize {
        let mut posted = 0;
        for (id, registration) in self.registrations.iter() {
            let sample = pool.issue(snapshot.clone());
            let msg = Message::Position {
                id: *id,
                sample: PendingSample::new(sample, owner.clone()),
            };
            match registration.mailbox.post(msg) {
                Ok(()) => posted += 1,
                Err(Message::Position { sample, .. }) => {
                    // owner is locked by our caller: release in place
                    warn!("handler#{}: event loop gone", id);
                    if let Err(e) = pool.release(sample.take()) {
                        warn!("handler#{}: undelivered sample: {}", id, e);
                    }
                },
                Err(_) => {},
            }
        }
        debug!("fix dispatched to {}/{} handler(s)", posted, self.len());
        posted
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::EventLoop;
    use parking_lot::Mutex;

    struct Owner(Mutex<SamplePool>);

    impl SampleRelease for Owner {
        fn release(&self, sample: crate::pool::SampleRef) {
            let _ = self.0.lock().release(sample);
        }
    }

    #[test]
    fn dead_loop_releases_in_place() {
        let owner = Arc::new(Owner(Mutex::new(SamplePool::default())));
        let weak = Arc::downgrade(&owner) as Weak<dyn SampleRelease>;
        let mut hub = Hub::default();

        let ev = EventLoop::attach().unwrap();
        let active = Arc::new(AtomicBool::new(true));
        let handler = hub.register(ev.handle(), active.clone());
        drop(ev);

        let snapshot = Arc::new(PositionSample::default());
        let posted = hub.dispatch(&mut owner.0.lock(), &snapshot, &weak);
        assert_eq!(posted, 0);
        assert_eq!(owner.0.lock().outstanding(), 0);

        let registration = hub.unregister(handler).unwrap();
        assert!(!active.load(Ordering::Acquire));
        assert_eq!(registration.detach(Duration::from_millis(10)), Ok(()));
        assert!(hub.unregister(handler).is_none());
    }

    #[test]
    fn handler_ids_unique_across_hubs() {
        let ev = EventLoop::attach().unwrap();
        let (mut a, mut b) = (Hub::default(), Hub::default());
        let ha = a.register(ev.handle(), Arc::new(AtomicBool::new(true)));
        let hb = b.register(ev.handle(), Arc::new(AtomicBool::new(true)));
        assert_ne!(ha, hb);
        // not registered with this hub
        assert!(a.unregister(hb).is_none());
        assert_eq!(a.len(), 1);
        assert!(b.unregister(hb).is_some());
    }

    #[test]
    fn undelivered_samples_released_by_loop() {
        let owner = Arc::new(Owner(Mutex::new(SamplePool::default())));
        let weak = Arc::downgrade(&owner) as Weak<dyn SampleRelease>;
        let mut hub = Hub::default();

        let ev = EventLoop::attach().unwrap();
        let active = Arc::new(AtomicBool::new(true));
        let handler = hub.register(ev.handle(), active);

        let snapshot = Arc::new(PositionSample::default());
        assert_eq!(hub.dispatch(&mut owner.0.lock(), &snapshot, &weak), 1);
        assert_eq!(owner.0.lock().outstanding(), 1);

        // never registered locally: the delivery is dropped
        hub.unregister(handler).unwrap().detach(Duration::ZERO).unwrap();
        assert_eq!(ev.run_pending(), 1);
        assert_eq!(owner.0.lock().outstanding(), 0);
    }
}
