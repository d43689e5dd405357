//! Per-thread event loops
//!
//! Observers run on their own thread: each thread that wants position
//! notifications attaches an [EventLoop] and runs it. Other threads only ever
//! talk to a loop through its [LoopHandle] mailbox, so observer code never
//! executes concurrently with itself.
use std::{
    cell::RefCell,
    collections::HashMap,
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, ThreadId},
};

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, trace};

use crate::{
    error::Error,
    pool::{PendingSample, SampleRef},
};

pub(crate) mod hub;

/// Position notification callback. Runs on the thread it was registered from.
/// The callback owns the delivered [SampleRef] and must release it.
pub type PositionCallback = Box<dyn FnMut(SampleRef)>;

pub(crate) enum Message {
    /// Deliver a sample to a registered handler
    Position { id: u64, sample: PendingSample },
    /// Run a function on the loop thread
    Call(Box<dyn FnOnce() + Send>),
    /// Forget a handler, then acknowledge
    Unregister { id: u64, ack: Sender<()> },
    /// Leave [EventLoop::run]
    Stop,
}

struct Handler {
    active: Arc<AtomicBool>,
    /// None while the callback executes
    callback: Option<PositionCallback>,
}

struct Local {
    handle: LoopHandle,
    handlers: HashMap<u64, Handler>,
}

thread_local! {
    static LOCAL: RefCell<Option<Local>> = const { RefCell::new(None) };
}

/// Mailbox of an [EventLoop], usable from any thread
#[derive(Debug, Clone)]
pub struct LoopHandle {
    thread: ThreadId,
    tx: Sender<Message>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Position { id, .. } => write!(f, "Position({})", id),
            Self::Call(_) => write!(f, "Call"),
            Self::Unregister { id, .. } => write!(f, "Unregister({})", id),
            Self::Stop => write!(f, "Stop"),
        }
    }
}

impl LoopHandle {
    /// Mailbox of the loop attached to the calling thread, if any
    pub fn current() -> Option<Self> {
        LOCAL.with(|local| local.borrow().as_ref().map(|l| l.handle.clone()))
    }
    /// True when called from the thread this loop is attached to
    pub fn is_current(&self) -> bool {
        self.thread == thread::current().id()
    }
    /// Queues `f` for execution on the loop thread.
    /// Fails with [Error::Fault] once the loop is gone.
    pub fn queue_function<F>(&self, f: F) -> Result<(), Error>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(Message::Call(Box::new(f)))
            .map_err(|_| Error::Fault)
    }
    /// Asks the loop to return from [EventLoop::run].
    /// Messages queued before this one are processed first.
    pub fn stop(&self) {
        let _ = self.post(Message::Stop);
    }
    /// Posts a message, returning it when the loop is gone
    pub(crate) fn post(&self, msg: Message) -> Result<(), Message> {
        self.tx.send(msg).map_err(|e| e.into_inner())
    }
}

/// Event loop bound to the thread that attached it
pub struct EventLoop {
    handle: LoopHandle,
    rx: Receiver<Message>,
    _thread_bound: PhantomData<*const ()>,
}

impl EventLoop {
    /// Attaches a new loop to the calling thread.
    /// Fails with [Error::Duplicate] if this thread already has one.
    pub fn attach() -> Result<Self, Error> {
        LOCAL.with(|local| {
            let mut local = local.borrow_mut();
            if local.is_some() {
                return Err(Error::Duplicate);
            }
            let (tx, rx) = channel::unbounded();
            let handle = LoopHandle {
                thread: thread::current().id(),
                tx,
            };
            *local = Some(Local {
                handle: handle.clone(),
                handlers: HashMap::new(),
            });
            debug!("{:?}: event loop attached", handle.thread);
            Ok(Self {
                handle,
                rx,
                _thread_bound: PhantomData,
            })
        })
    }
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }
    /// Processes messages until [LoopHandle::stop]
    pub fn run(&self) {
        while let Ok(msg) = self.rx.recv() {
            if !self.process(msg) {
                break;
            }
        }
    }
    /// Processes the messages already queued, without waiting.
    /// Returns the number of processed messages.
    pub fn run_pending(&self) -> usize {
        let mut n = 0;
        while let Ok(msg) = self.rx.try_recv() {
            n += 1;
            if !self.process(msg) {
                break;
            }
        }
        n
    }
    /// Returns false on [Message::Stop]
    fn process(&self, msg: Message) -> bool {
        trace!("{:?}: {:?}", self.handle.thread, msg);
        match msg {
            Message::Stop => return false,
            Message::Call(f) => f(),
            Message::Position { id, sample } => deliver(id, sample),
            Message::Unregister { id, ack } => {
                remove_local(id);
                let _ = ack.send(());
            },
        }
        true
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        // handlers go first: undelivered samples are released when the queue drops
        let local = LOCAL
            .try_with(|local| local.borrow_mut().take())
            .ok()
            .flatten();
        drop(local);
        debug!("{:?}: event loop detached", self.handle.thread);
    }
}

/// Registers a handler on the calling thread's loop
pub(crate) fn insert_local(
    id: u64,
    active: Arc<AtomicBool>,
    callback: PositionCallback,
) -> Result<(), Error> {
    LOCAL.with(|local| match local.borrow_mut().as_mut() {
        Some(local) => {
            local.handlers.insert(
                id,
                Handler {
                    active,
                    callback: Some(callback),
                },
            );
            Ok(())
        },
        None => Err(Error::Fault),
    })
}

/// Forgets a handler of the calling thread's loop
pub(crate) fn remove_local(id: u64) {
    let handler = LOCAL.with(|local| {
        local
            .borrow_mut()
            .as_mut()
            .and_then(|local| local.handlers.remove(&id))
    });
    // callback captures are dropped outside of the borrow
    drop(handler);
}

fn deliver(id: u64, sample: PendingSample) {
    let callback = LOCAL.with(|local| {
        local
            .borrow_mut()
            .as_mut()
            .and_then(|local| local.handlers.get_mut(&id))
            .filter(|handler| handler.active.load(Ordering::Acquire))
            .and_then(|handler| handler.callback.take())
    });

    let Some(mut callback) = callback else {
        debug!("handler #{} gone: dropping delivery", id);
        return;
    };

    callback(sample.take());

    // put it back, unless the handler was removed meanwhile
    LOCAL.with(|local| {
        if let Some(handler) = local
            .borrow_mut()
            .as_mut()
            .and_then(|local| local.handlers.get_mut(&id))
        {
            handler.callback = Some(callback);
        }
    });
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sync::Semaphore;
    use std::time::Duration;

    #[test]
    fn single_loop_per_thread() {
        let ev = EventLoop::attach().unwrap();
        assert_eq!(EventLoop::attach().err(), Some(Error::Duplicate));
        assert!(LoopHandle::current().is_some());
        assert!(ev.handle().is_current());
        drop(ev);
        assert!(LoopHandle::current().is_none());
        assert!(EventLoop::attach().is_ok());
    }

    #[test]
    fn queued_functions_run_on_loop_thread() {
        let sem = Arc::new(Semaphore::default());
        let (tx, rx) = channel::bounded(1);

        let worker = {
            let sem = sem.clone();
            thread::spawn(move || {
                let ev = EventLoop::attach().unwrap();
                tx.send(ev.handle()).unwrap();
                sem.post();
                ev.run();
            })
        };

        sem.wait_timeout(Duration::from_secs(5)).unwrap();
        let handle = rx.recv().unwrap();
        assert!(!handle.is_current());

        let ran_on = Arc::new(parking_lot::Mutex::new(None));
        {
            let (ran_on, sem) = (ran_on.clone(), sem.clone());
            handle
                .queue_function(move || {
                    *ran_on.lock() = Some(thread::current().id());
                    sem.post();
                })
                .unwrap();
        }
        sem.wait_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(*ran_on.lock(), Some(handle.thread));

        handle.stop();
        worker.join().unwrap();
        assert_eq!(handle.queue_function(|| {}), Err(Error::Fault));
    }

    #[test]
    fn run_pending_stops_at_stop() {
        let ev = EventLoop::attach().unwrap();
        let handle = ev.handle();
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        for _ in 0..2 {
            let counter = counter.clone();
            handle
                .queue_function(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
        }
        handle.stop();
        handle.queue_function(|| {}).unwrap();
        assert_eq!(ev.run_pending(), 3);
        assert_eq!(counter.load(Ordering::Relaxed), 2);
        assert_eq!(ev.run_pending(), 1);
    }
}
