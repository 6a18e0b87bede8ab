//! Experiment scheduler
//!
//! One producer (command submission) and one consumer (a dedicated worker
//! thread) share a [`TimerQueue`]. Every submission atomically replaces the
//! whole queue, so nothing from a superseded command fires once a newer one
//! has been accepted. A snapshot already being transmitted is not
//! interrupted.
//!
//! The worker owns the device session: sends are serialized by
//! construction.
//!
//! ```ignore
//! let scheduler = Scheduler::new(session, LinkConfig::new("/dev/ttyS5", 57_600));
//! scheduler.submit_experiment(&parse_experiment(body)?);
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use embassy_time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::arena::{Arena, Experiment, State};
use crate::generator::generate;
use crate::queue::{Next, ScheduledTask, SchedulerStatus, TimerQueue};
use crate::session::{DeviceSession, LinkConfig, transmit};

/// Convert fractional seconds into a delay, clamping negatives to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn seconds(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_micros((secs * 1_000_000.0).round() as u64)
    } else {
        Duration::from_ticks(0)
    }
}

/// Firing delay (seconds from submission) of every state of `experiment`,
/// clean-up snapshot included.
///
/// States fire back to back. A repeating experiment makes
/// `ceil(totalTime / cycle)` passes and stops a pass at the first state whose
/// delay is already past `totalTime`. The clean-up snapshot fires when the
/// last scheduled state's slot ends, measured with the duration of the
/// experiment's last state.
pub fn plan_experiment(experiment: &Experiment) -> Vec<(f64, Arena)> {
    let mut plan = Vec::new();
    let mut delay = 0.0;
    let mut last_delay = None;

    'passes: for _ in 0..experiment.passes() {
        for state in &experiment.states {
            if experiment.repeat && delay > experiment.total_time {
                break 'passes;
            }
            plan.push((delay, state.arena.clone()));
            last_delay = Some(delay);
            delay += state.time;
        }
    }

    if experiment.clean {
        if let (Some(last_delay), Some(last)) = (last_delay, experiment.states.last()) {
            plan.push((last_delay + last.time, last.arena.cleared()));
        }
    }
    plan
}

/// Owns the worker thread and the submission side of the queue.
pub struct Scheduler {
    queue: Arc<TimerQueue>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the worker. `session` is opened once per snapshot with `link`.
    pub fn new<S>(session: S, link: LinkConfig) -> Self
    where
        S: DeviceSession + Send + 'static,
    {
        let queue = Arc::new(TimerQueue::new());
        let worker_queue = Arc::clone(&queue);
        let worker = thread::Builder::new()
            .name("arena-worker".into())
            .spawn(move || run_worker(&worker_queue, session, &link));
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(error = %e, "Failed to spawn arena worker");
                None
            }
        };
        Self { queue, worker }
    }

    /// Drop everything pending and show `state` right away.
    pub fn submit_state(&self, state: &State) {
        let task = ScheduledTask {
            due: Instant::now(),
            arena: state.arena.clone(),
        };
        let cancelled = self.queue.replace([task]);
        info!(cancelled, "State accepted");
        self.wake();
    }

    /// Drop everything pending and schedule every state of `experiment`.
    pub fn submit_experiment(&self, experiment: &Experiment) {
        let now = Instant::now();
        let tasks: Vec<ScheduledTask> = plan_experiment(experiment)
            .into_iter()
            .map(|(delay, arena)| ScheduledTask {
                due: now.checked_add(seconds(delay)).unwrap_or(Instant::MAX),
                arena,
            })
            .collect();
        let count = tasks.len();
        let cancelled = self.queue.replace(tasks);
        info!(
            tasks = count,
            cancelled,
            repeat = experiment.repeat,
            clean = experiment.clean,
            "Experiment accepted"
        );
        self.wake();
    }

    /// Drop everything pending. Returns the number of discarded tasks.
    pub fn cancel_all(&self) -> usize {
        let cancelled = self.queue.cancel();
        info!(cancelled, "Pending tasks cancelled");
        self.wake();
        cancelled
    }

    pub fn status(&self) -> SchedulerStatus {
        self.queue.status()
    }

    /// Number of tasks waiting for their deadline.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn wake(&self) {
        if let Some(worker) = &self.worker {
            worker.thread().unpark();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.queue.close();
        if let Some(worker) = self.worker.take() {
            worker.thread().unpark();
            if worker.join().is_err() {
                error!("Arena worker panicked");
            }
        }
    }
}

fn run_worker<S: DeviceSession>(queue: &TimerQueue, mut session: S, link: &LinkConfig) {
    debug!("Arena worker started");
    loop {
        match queue.next(Instant::now()) {
            Next::Due { task, generation } => {
                let snapshot = match panic::catch_unwind(AssertUnwindSafe(|| generate(&task.arena))) {
                    Ok(snapshot) => snapshot,
                    Err(_) => {
                        error!("Snapshot generation panicked, task dropped");
                        queue.finish();
                        continue;
                    }
                };
                // A submission may have landed while generating.
                if queue.is_current(generation) {
                    let report = transmit(&mut session, link, &snapshot);
                    info!(
                        sent = report.sent,
                        failed = report.failed,
                        skipped = report.skipped,
                        overrides_skipped = snapshot.skipped.len(),
                        "Snapshot done"
                    );
                } else {
                    debug!("Snapshot superseded before transmission");
                }
                queue.finish();
            }
            Next::Wait(delay) => {
                thread::park_timeout(core::time::Duration::from_micros(delay.as_micros()));
            }
            Next::Empty => thread::park(),
            Next::Closed => break,
        }
    }
    debug!("Arena worker stopped");
}
