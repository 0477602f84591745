//! Decoupled processing on a dedicated worker thread.

use super::{NonReentrant, ShutdownMode, Step, Strategy, StrategyKind};
use crate::core::DefinitionError;
use crate::machine::{Outcome, Runtime, StateMachineError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, error, info, warn};

struct WorkItem<P> {
    runtime: Arc<Runtime<P>>,
    event: String,
    payload: P,
    sequence: u64,
}

struct QueueState<P> {
    items: VecDeque<WorkItem<P>>,
    next_sequence: u64,
    /// Cleared by shutdown. External submissions are refused afterwards.
    accepting: bool,
    /// Set once the worker must not take any further item.
    stopped: bool,
}

struct Shared<P> {
    state: Mutex<QueueState<P>>,
    available: Condvar,
}

impl<P> Shared<P> {
    /// Append an item unless the queue is closed to this submitter.
    ///
    /// The open check, the sequence stamp and the push share one critical
    /// section, so an item is either refused here or later served or counted
    /// as discarded by shutdown. During a graceful drain the worker itself
    /// may still submit, so that in-flight chains complete.
    fn push_if_open(
        &self,
        from_worker: bool,
        runtime: &Arc<Runtime<P>>,
        event: String,
        payload: P,
    ) -> Option<u64> {
        let sequence = {
            let mut state = self.state.lock();
            let open = state.accepting || (from_worker && !state.stopped);
            if !open {
                return None;
            }
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            state.items.push_back(WorkItem {
                runtime: Arc::clone(runtime),
                event,
                payload,
                sequence,
            });
            sequence
        };
        self.available.notify_one();
        Some(sequence)
    }

    /// Block until an item is available. `None` tells the worker to exit.
    fn take(&self) -> Option<WorkItem<P>> {
        let mut state = self.state.lock();
        loop {
            if state.stopped {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if !state.accepting {
                state.stopped = true;
                return None;
            }
            self.available.wait(&mut state);
        }
    }
}

/// Runs every event on one background worker, in FIFO order.
///
/// `process_event` only validates and enqueues; it never waits for the
/// transition. The worker feeds each item to a wrapped [`NonReentrant`]
/// strategy one step at a time. A follow-up event returned by an enter phase
/// goes to the back of the queue, behind whatever was already waiting.
///
/// Handlers running on the worker that call `process_event` on their own
/// machine just enqueue another item, so there is no recursion and no
/// reentrant locking.
///
/// Failures cannot reach the original caller, who has already returned. They
/// are logged and passed to the machine's observer.
pub(crate) struct Queued<P> {
    shared: Arc<Shared<P>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl<P: Send + 'static> Queued<P> {
    /// Start the worker thread.
    pub(crate) fn new(worker_name: &str) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                next_sequence: 0,
                accepting: true,
                stopped: false,
            }),
            available: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let proxied = NonReentrant::new();
        let handle = thread::Builder::new()
            .name(worker_name.to_owned())
            .spawn(move || run_worker(&worker_shared, &proxied))?;

        info!(worker = worker_name, "queue worker started");
        Ok(Self {
            shared,
            worker_id: handle.thread().id(),
            worker: Mutex::new(Some(handle)),
        })
    }
}

impl<P> Queued<P> {
    fn on_worker(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    fn close(&self, mode: ShutdownMode) -> usize {
        let discarded: Vec<WorkItem<P>> = {
            let mut state = self.shared.state.lock();
            state.accepting = false;
            match mode {
                ShutdownMode::Graceful => Vec::new(),
                ShutdownMode::Immediate => {
                    state.stopped = true;
                    state.items.drain(..).collect()
                }
            }
        };
        self.shared.available.notify_all();

        let count = discarded.len();
        if count > 0 {
            warn!(discarded = count, "queue closed, pending events discarded");
        }
        // Dropped outside the queue lock: an item may own the last reference
        // to its runtime.
        drop(discarded);

        // The worker cannot join itself; it exits on its own once it sees the
        // closed queue.
        if !self.on_worker() {
            let handle = self.worker.lock().take();
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    error!("queue worker panicked");
                }
                info!("queue worker stopped");
            }
        }
        count
    }
}

impl<P: Send + 'static> Strategy<P> for Queued<P> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Queued
    }

    fn process_event(
        &self,
        runtime: &Arc<Runtime<P>>,
        event: &str,
        payload: P,
    ) -> Result<Outcome, StateMachineError> {
        let sequence = self
            .shared
            .push_if_open(self.on_worker(), runtime, event.to_owned(), payload)
            .ok_or(StateMachineError::ShutDown)?;
        debug!(machine = %runtime.id(), event, sequence, "event enqueued");
        Ok(Outcome::Enqueued { sequence })
    }

    fn shutdown(&self, mode: ShutdownMode) -> usize {
        self.close(mode)
    }
}

impl<P> Drop for Queued<P> {
    fn drop(&mut self) {
        self.close(ShutdownMode::Graceful);
    }
}

fn run_worker<P>(shared: &Shared<P>, proxied: &NonReentrant) {
    while let Some(item) = shared.take() {
        let machine = item.runtime.id();
        let event = item.event.clone();
        let sequence = item.sequence;

        let served = panic::catch_unwind(AssertUnwindSafe(|| serve(shared, proxied, item)));
        if served.is_err() {
            error!(
                machine = %machine,
                event = %event,
                sequence,
                "handler panicked on queue worker"
            );
        }
    }
    debug!("queue worker exiting");
}

fn serve<P>(shared: &Shared<P>, proxied: &NonReentrant, item: WorkItem<P>) {
    let WorkItem {
        runtime,
        event,
        payload,
        sequence,
    } = item;
    debug!(machine = %runtime.id(), event = %event, sequence, "processing queued event");

    let failure = match proxied.process_step(&runtime, &event, payload) {
        Ok(Step::Committed {
            follow_up: Some(next),
        }) => {
            if runtime.definition().is_event(&next.event) {
                let event = next.event.clone();
                match shared.push_if_open(true, &runtime, next.event, next.payload) {
                    Some(chained) => {
                        debug!(
                            machine = %runtime.id(),
                            sequence = chained,
                            "follow-up event enqueued"
                        );
                        None
                    }
                    None => Some((event, StateMachineError::ShutDown)),
                }
            } else {
                Some((
                    next.event.clone(),
                    StateMachineError::from(DefinitionError::EventNotDefined(next.event)),
                ))
            }
        }
        Ok(_) => None,
        Err(err) => Some((event, err)),
    };

    if let Some((event, err)) = failure {
        warn!(machine = %runtime.id(), event = %event, error = %err, "queued event failed");
        runtime.notify_error(&event, &err);
    }
}
