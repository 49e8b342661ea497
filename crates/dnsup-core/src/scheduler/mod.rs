//! Update scheduler
//!
//! The Scheduler owns the Idle/Running state machine and is the only
//! component that decides when an [`UpdateOperation`] runs.
//!
//! ## State Machine
//!
//! ```text
//!            start(creds, interval)
//!   ┌──────┐ ─────────────────────▶ ┌─────────┐
//!   │ Idle │                        │ Running │──┐ timer fires every interval
//!   └──────┘ ◀───────────────────── └─────────┘◀─┘
//!                    stop()
//! ```
//!
//! ## Threading
//!
//! - Control state (state, timer handle, generation) sits behind a mutex
//!   that is never held across an await or while emitting to the sink
//! - The timer lives on its own task and only dispatches work
//! - Each update runs on a fresh worker task; results come back through
//!   the task's join handle
//! - A single-flight flag guards the worker: a trigger that finds an
//!   update in progress is logged and dropped, never queued
//!
//! ## Failure Policy
//!
//! A failed update never stops the scheduler and there is no backoff:
//! the fixed interval is the only pacing mechanism.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::operation::{UpdateOperation, UpdateResult};

/// Scheduler run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// No automatic updates are scheduled
    Idle,
    /// Automatic updates fire every interval
    Running,
}

/// Result of asking the scheduler for an on-demand update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The update ran to completion
    Completed(UpdateResult),
    /// Another update was in flight; this request was dropped
    Skipped,
}

/// What caused an update to be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Start,
    Timer,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Start => "start",
            Trigger::Timer => "timer",
            Trigger::Manual => "manual",
        })
    }
}

/// Periodic update scheduler
///
/// Cloning yields another handle to the same scheduler.
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`]
/// 2. [`Scheduler::start()`] runs an update immediately and arms the timer
/// 3. [`Scheduler::stop()`] cancels the timer; an in-flight update finishes
/// 4. [`Scheduler::run_once()`] may be called at any time
///
/// `start` and `stop` spawn and abort Tokio tasks, so they must be called
/// from within a Tokio runtime.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    operation: Arc<UpdateOperation>,
    control: Mutex<Control>,
    /// `true` while an update worker is running
    in_flight: watch::Sender<bool>,
}

struct Control {
    state: SchedulerState,
    /// Bumped on every start so a stale timer task can tell it was replaced
    generation: u64,
    interval: Option<Interval>,
    next_run: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Create an idle scheduler driving `operation`
    pub fn new(operation: UpdateOperation) -> Self {
        let (in_flight, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                operation: Arc::new(operation),
                control: Mutex::new(Control {
                    state: SchedulerState::Idle,
                    generation: 0,
                    interval: None,
                    next_run: None,
                    timer: None,
                }),
                in_flight,
            }),
        }
    }

    /// Start automatic updates
    ///
    /// Runs one update immediately, then one every `interval`. The
    /// interval is given by label (`"60 minutes"`, `"4 hours"`,
    /// `"6 hours"`, `"24 hours"`) or as an [`Interval`].
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Now running
    /// - `Err(Error::InvalidInterval)`: Unknown label; state unchanged
    /// - `Err(Error::AlreadyRunning)`: Already running; state unchanged
    pub fn start(&self, credentials: Credentials, interval: impl AsRef<str>) -> Result<()> {
        let inner = &self.inner;

        let interval = match inner.arm(&credentials, interval.as_ref()) {
            Ok(interval) => interval,
            Err(e) => {
                error!("Start rejected: {}", e);
                inner.log(match &e {
                    Error::AlreadyRunning => {
                        "ERROR: Automatic updates are already running.".to_string()
                    }
                    other => format!("ERROR: {}. Please select an update interval.", other),
                });
                return Err(e);
            }
        };

        info!("Automatic updates started (interval={})", interval);
        inner.log(format!(
            "Automatic updates started with interval: {}.",
            interval
        ));

        inner.spawn_update(credentials, Trigger::Start);
        Ok(())
    }

    /// Stop automatic updates
    ///
    /// Cancels the pending timer. An update already in flight is allowed to
    /// finish and log its result. Stopping an idle scheduler is a no-op.
    pub fn stop(&self) {
        let inner = &self.inner;

        let was_running = {
            let mut control = inner.lock_control();
            let was_running = control.state == SchedulerState::Running;
            control.state = SchedulerState::Idle;
            control.interval = None;
            control.next_run = None;
            if let Some(timer) = control.timer.take() {
                timer.abort();
            }
            was_running
        };

        if !was_running {
            debug!("Stop requested while idle");
            inner.log("Automatic updates are not running.".to_string());
            return;
        }

        info!("Automatic updates stopped");
        inner.log("Automatic updates stopped.".to_string());
    }

    /// Run one update now, independent of the timer
    ///
    /// Does not change [`SchedulerState`] or the timer.
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome::Completed)`: The update ran; see its result
    /// - `Ok(RunOutcome::Skipped)`: Another update was in flight
    /// - `Err(Error::Worker)`: The worker task panicked or was cancelled
    pub async fn run_once(&self, credentials: Credentials) -> Result<RunOutcome> {
        let Some(worker) = self.inner.spawn_update(credentials, Trigger::Manual) else {
            return Ok(RunOutcome::Skipped);
        };

        worker
            .await
            .map(RunOutcome::Completed)
            .map_err(|e| Error::worker(e.to_string()))
    }

    /// Wait until no update is in flight
    pub async fn drain(&self) {
        let mut rx = self.inner.in_flight.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|busy| !*busy).await;
    }

    /// Current run state
    pub fn state(&self) -> SchedulerState {
        self.inner.lock_control().state
    }

    /// Interval of the current run, if running
    pub fn interval(&self) -> Option<Interval> {
        self.inner.lock_control().interval
    }

    /// When the armed timer will next fire, if running
    pub fn next_run(&self) -> Option<Instant> {
        self.inner.lock_control().next_run
    }

    /// Whether an update is executing right now
    pub fn is_in_flight(&self) -> bool {
        *self.inner.in_flight.borrow()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.inner.lock_control();
        f.debug_struct("Scheduler")
            .field("state", &control.state)
            .field("interval", &control.interval)
            .field("in_flight", &*self.inner.in_flight.borrow())
            .finish()
    }
}

impl Inner {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        // Control fields are plain values updated in place; a poisoned lock
        // still holds a consistent snapshot
        self.control.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sink lines are only ever emitted with the control lock released
    fn log(&self, message: String) {
        self.operation.sink().log(message);
    }

    /// Move from Idle to Running and arm the timer
    ///
    /// Touches control state only; the caller reports the outcome.
    fn arm(self: &Arc<Self>, credentials: &Credentials, label: &str) -> Result<Interval> {
        let mut control = self.lock_control();

        if control.state == SchedulerState::Running {
            return Err(Error::AlreadyRunning);
        }
        let interval: Interval = label.parse()?;

        control.generation += 1;
        control.state = SchedulerState::Running;
        control.interval = Some(interval);

        let deadline = Instant::now() + interval.as_duration();
        control.next_run = Some(deadline);
        control.timer = Some(tokio::spawn(run_timer(
            Arc::downgrade(self),
            credentials.clone(),
            interval,
            deadline,
            control.generation,
        )));

        Ok(interval)
    }

    /// Dispatch an update on a worker task unless one is already in flight
    fn spawn_update(
        self: &Arc<Self>,
        credentials: Credentials,
        trigger: Trigger,
    ) -> Option<JoinHandle<UpdateResult>> {
        let Some(guard) = FlightGuard::acquire(self) else {
            warn!("Update skipped ({} trigger): an update is already in progress", trigger);
            self.log(format!(
                "Update skipped ({} trigger): an update is already in progress.",
                trigger
            ));
            return None;
        };

        debug!("Dispatching update ({} trigger)", trigger);
        let operation = Arc::clone(&self.operation);
        Some(tokio::spawn(async move {
            let _guard = guard;
            operation.execute(&credentials).await
        }))
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let control = self
            .control
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(timer) = control.timer.take() {
            timer.abort();
        }
    }
}

/// Holds the single-flight flag; clears it when the worker ends, even by panic
struct FlightGuard {
    inner: Arc<Inner>,
}

impl FlightGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        let acquired = inner.in_flight.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                true
            }
        });

        acquired.then(|| Self {
            inner: Arc::clone(inner),
        })
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.send_replace(false);
    }
}

/// Timer task: sleep until the deadline, dispatch, re-arm
async fn run_timer(
    inner: Weak<Inner>,
    credentials: Credentials,
    interval: Interval,
    mut deadline: Instant,
    generation: u64,
) {
    loop {
        tokio::time::sleep_until(deadline).await;

        match fire(&inner, &credentials, interval, generation) {
            Some(next) => deadline = next,
            None => break,
        }
    }
    debug!("Timer task for run {} exited", generation);
}

/// Handle one timer firing; returns the next deadline, or `None` when the
/// run this timer belongs to is over
fn fire(
    inner: &Weak<Inner>,
    credentials: &Credentials,
    interval: Interval,
    generation: u64,
) -> Option<Instant> {
    let inner = inner.upgrade()?;

    let next = {
        let mut control = inner.lock_control();
        if control.state != SchedulerState::Running || control.generation != generation {
            return None;
        }
        let next = Instant::now() + interval.as_duration();
        control.next_run = Some(next);
        next
    };

    debug!("Update timer fired (interval={})", interval);
    inner.spawn_update(credentials.clone(), Trigger::Timer);
    Some(next)
}
