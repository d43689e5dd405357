//! Position sample pool
//!
//! Samples are shared snapshots, handed out through generational [SampleRef]s:
//! a released slot bumps its generation, so stale or forged references
//! are rejected instead of reading whatever the slot holds now.
use std::sync::{Arc, Weak};

use log::debug;

use crate::{error::Error, sample::PositionSample};

/// Handle onto one issued [PositionSample].
/// Valid from issuance until released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleRef {
    index: u32,
    generation: u32,
}

impl SampleRef {
    /// Placeholder reference, never issued by any pool
    pub const fn dangling() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }
}

impl Default for SampleRef {
    fn default() -> Self {
        Self::dangling()
    }
}

impl std::fmt::Display for SampleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "sample#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    sample: Option<Arc<PositionSample>>,
}

/// Arena of issued sample references
#[derive(Debug, Default)]
pub(crate) struct SamplePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Last produced snapshot, kept independently of issued references
    last: Option<Arc<PositionSample>>,
    outstanding: usize,
}

impl SamplePool {
    /// Issues a new reference onto given snapshot
    pub fn issue(&mut self, sample: Arc<PositionSample>) -> SampleRef {
        self.outstanding += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.sample = Some(sample);
            SampleRef {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                sample: Some(sample),
            });
            SampleRef {
                index,
                generation: 1,
            }
        }
    }
    fn slot(&self, sample: SampleRef) -> Option<&Slot> {
        self.slots
            .get(sample.index as usize)
            .filter(|slot| slot.generation == sample.generation && slot.sample.is_some())
    }
    /// Returns the snapshot behind given reference
    pub fn get(&self, sample: SampleRef) -> Result<Arc<PositionSample>, Error> {
        self.slot(sample)
            .and_then(|slot| slot.sample.clone())
            .ok_or(Error::InvalidHandle)
    }
    /// Revokes given reference
    pub fn release(&mut self, sample: SampleRef) -> Result<(), Error> {
        if self.slot(sample).is_none() {
            return Err(Error::InvalidHandle);
        }
        let slot = &mut self.slots[sample.index as usize];
        slot.sample = None;
        self.outstanding -= 1;
        match slot.generation.checked_add(1) {
            Some(generation) => {
                slot.generation = generation;
                self.free.push(sample.index);
            },
            // generations exhausted: the slot is retired, never reissued
            None => debug!("{} retired", sample),
        }
        debug!("{} released", sample);
        Ok(())
    }
    pub fn set_last(&mut self, sample: Arc<PositionSample>) {
        self.last = Some(sample);
    }
    pub fn last(&self) -> Option<Arc<PositionSample>> {
        self.last.clone()
    }
    /// Number of references issued and not released yet
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

/// Owner of a [SamplePool], able to release references from any thread
pub(crate) trait SampleRelease: Send + Sync {
    fn release(&self, sample: SampleRef);
}

/// Reference issued for a delivery that did not reach its observer yet.
/// Released on drop, unless handed over with [PendingSample::take].
pub(crate) struct PendingSample {
    sample: SampleRef,
    armed: bool,
    owner: Weak<dyn SampleRelease>,
}

impl PendingSample {
    pub fn new(sample: SampleRef, owner: Weak<dyn SampleRelease>) -> Self {
        Self {
            sample,
            owner,
            armed: true,
        }
    }
    /// Hands the reference over: the receiver now owns it.
    pub fn take(mut self) -> SampleRef {
        self.armed = false;
        self.sample
    }
}

impl Drop for PendingSample {
    fn drop(&mut self) {
        if self.armed {
            if let Some(owner) = self.owner.upgrade() {
                debug!("{} never delivered", self.sample);
                owner.release(self.sample);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use parking_lot::Mutex;

    impl SampleRelease for Mutex<SamplePool> {
        fn release(&self, sample: SampleRef) {
            let _ = self.lock().release(sample);
        }
    }

    #[test]
    fn issue_get_release() {
        let mut pool = SamplePool::default();
        let snapshot = Arc::new(PositionSample::default());
        let a = pool.issue(snapshot.clone());
        let b = pool.issue(snapshot.clone());
        assert_ne!(a, b);
        assert_eq!(pool.outstanding(), 2);
        assert!(Arc::ptr_eq(&pool.get(a).unwrap(), &snapshot));

        assert_eq!(pool.release(a), Ok(()));
        assert_eq!(pool.get(a), Err(Error::InvalidHandle));
        assert_eq!(pool.release(a), Err(Error::InvalidHandle));
        assert!(pool.get(b).is_ok());
        assert_eq!(pool.outstanding(), 1);
    }

    #[test]
    fn stale_reference_on_reused_slot() {
        let mut pool = SamplePool::default();
        let a = pool.issue(Arc::new(PositionSample::default()));
        pool.release(a).unwrap();
        let b = pool.issue(Arc::new(PositionSample::default()));
        assert_ne!(a, b, "slot reuse must change generation");
        assert_eq!(pool.get(a), Err(Error::InvalidHandle));
        assert!(pool.get(b).is_ok());
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut pool = SamplePool::default();
        let a = pool.issue(Arc::new(PositionSample::default()));
        pool.slots[a.index as usize].generation = u32::MAX;
        let last = SampleRef {
            index: a.index,
            generation: u32::MAX,
        };
        assert!(pool.get(last).is_ok());
        assert_eq!(pool.release(last), Ok(()));
        assert_eq!(pool.outstanding(), 0);

        let b = pool.issue(Arc::new(PositionSample::default()));
        assert_ne!(b.index, a.index);
        assert_eq!(pool.get(last), Err(Error::InvalidHandle));
        assert_eq!(pool.release(last), Err(Error::InvalidHandle));
        for generation in [0, 1] {
            let stale = SampleRef {
                index: a.index,
                generation,
            };
            assert_eq!(pool.get(stale), Err(Error::InvalidHandle));
        }
    }

    #[test]
    fn dangling_is_never_valid() {
        let mut pool = SamplePool::default();
        assert_eq!(pool.get(SampleRef::dangling()), Err(Error::InvalidHandle));
        let _ = pool.issue(Arc::new(PositionSample::default()));
        assert_eq!(pool.get(SampleRef::default()), Err(Error::InvalidHandle));
        assert_eq!(pool.release(SampleRef::dangling()), Err(Error::InvalidHandle));
    }

    #[test]
    fn last_sample_outlives_references() {
        let mut pool = SamplePool::default();
        assert!(pool.last().is_none());
        let snapshot = Arc::new(PositionSample::default());
        pool.set_last(snapshot.clone());
        let a = pool.issue(snapshot);
        pool.release(a).unwrap();
        assert!(pool.last().is_some());
    }

    #[test]
    fn pending_sample_release_on_drop() {
        let owner = Arc::new(Mutex::new(SamplePool::default()));
        let weak: Weak<dyn SampleRelease> = Arc::downgrade(&owner) as Weak<dyn SampleRelease>;

        let a = owner.lock().issue(Arc::new(PositionSample::default()));
        let b = owner.lock().issue(Arc::new(PositionSample::default()));

        drop(PendingSample::new(a, weak.clone()));
        assert_eq!(owner.lock().get(a), Err(Error::InvalidHandle));

        let taken = PendingSample::new(b, weak).take();
        assert_eq!(taken, b);
        assert!(owner.lock().get(b).is_ok());
        assert_eq!(owner.lock().outstanding(), 1);
    }
}
