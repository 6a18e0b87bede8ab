//! Timer queue shared by the submission path and the worker.
//!
//! Guarded by a `critical-section` mutex, like the light composer's intent
//! channel. Every operation is one short critical section; nothing blocks
//! while holding it.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_time::{Duration, Instant};
use std::collections::VecDeque;

use crate::arena::Arena;

/// An arena snapshot waiting for its deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub due: Instant,
    pub arena: Arena,
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Nothing queued, nothing running
    Idle,
    /// Tasks waiting for their deadline
    Scheduled,
    /// A snapshot is being generated or transmitted
    Running,
    /// Pending tasks were discarded and nothing replaced them
    Cancelled,
}

/// What the worker should do next.
#[derive(Debug)]
pub enum Next {
    /// Run this task; `generation` identifies the submission it came from.
    Due { task: ScheduledTask, generation: u64 },
    /// Nothing due yet; the earliest task is this far away.
    Wait(Duration),
    Empty,
    Closed,
}

#[derive(Debug)]
struct QueueState {
    tasks: VecDeque<ScheduledTask>,
    generation: u64,
    running: bool,
    cancelled: bool,
    closed: bool,
}

impl QueueState {
    fn discard(&mut self) -> usize {
        let discarded = self.tasks.len();
        self.tasks.clear();
        self.generation += 1;
        discarded
    }
}

pub struct TimerQueue {
    inner: Mutex<RefCell<QueueState>>,
}

impl TimerQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(QueueState {
                tasks: VecDeque::new(),
                generation: 0,
                running: false,
                cancelled: false,
                closed: false,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut QueueState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }

    /// Discard everything pending and enqueue `tasks`, atomically.
    ///
    /// Returns the number of discarded tasks.
    pub fn replace(&self, tasks: impl IntoIterator<Item = ScheduledTask>) -> usize {
        let tasks: Vec<ScheduledTask> = tasks.into_iter().collect();
        self.with(|state| {
            let discarded = state.discard();
            state.tasks.extend(tasks);
            state.tasks.make_contiguous().sort_by_key(|task| task.due);
            state.cancelled = discarded > 0 && state.tasks.is_empty();
            discarded
        })
    }

    /// Discard everything pending.
    pub fn cancel(&self) -> usize {
        self.with(|state| {
            let discarded = state.discard();
            state.cancelled = discarded > 0 || state.cancelled;
            discarded
        })
    }

    /// Pop the earliest task if it is due at `now`.
    pub fn next(&self, now: Instant) -> Next {
        self.with(|state| {
            if state.closed {
                return Next::Closed;
            }
            let Some(first) = state.tasks.front() else {
                return Next::Empty;
            };
            if first.due > now {
                return Next::Wait(first.due - now);
            }
            match state.tasks.pop_front() {
                Some(task) => {
                    state.running = true;
                    state.cancelled = false;
                    Next::Due {
                        task,
                        generation: state.generation,
                    }
                }
                None => Next::Empty,
            }
        })
    }

    /// Mark the running task as done.
    pub fn finish(&self) {
        self.with(|state| state.running = false);
    }

    /// Whether no submission happened since `generation` was handed out.
    pub fn is_current(&self, generation: u64) -> bool {
        self.with(|state| state.generation == generation)
    }

    /// Stop the worker and drop pending tasks.
    pub fn close(&self) {
        self.with(|state| {
            state.discard();
            state.closed = true;
        });
    }

    pub fn len(&self) -> usize {
        self.with(|state| state.tasks.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> SchedulerStatus {
        self.with(|state| {
            if state.running {
                SchedulerStatus::Running
            } else if !state.tasks.is_empty() {
                SchedulerStatus::Scheduled
            } else if state.cancelled {
                SchedulerStatus::Cancelled
            } else {
                SchedulerStatus::Idle
            }
        })
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}
