//! Device session
//!
//! The controller sits behind one serial link. The transport is supplied by
//! the caller through [`DeviceSession`]; this module owns the contract it has
//! to follow and the loop that pushes one snapshot through it.

use embassy_time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::generator::Snapshot;

/// Link timing fixed by the controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTimings {
    /// Wait after opening before the first write is safe
    pub settle: Duration,
    /// Wait after each write before draining the response
    pub message_delay: Duration,
    /// Longest wait for a response
    pub read_timeout: Duration,
}

/// Timings of the stock arena controller.
pub const DEFAULT_LINK_TIMINGS: LinkTimings = LinkTimings {
    settle: Duration::from_secs(2),
    message_delay: Duration::from_micros(62_500),
    read_timeout: Duration::from_secs(5),
};

impl Default for LinkTimings {
    fn default() -> Self {
        DEFAULT_LINK_TIMINGS
    }
}

/// Where and how to reach the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub port: String,
    pub baud_rate: u32,
    pub timings: LinkTimings,
}

impl LinkConfig {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            timings: DEFAULT_LINK_TIMINGS,
        }
    }

    #[must_use]
    pub const fn with_timings(mut self, timings: LinkTimings) -> Self {
        self.timings = timings;
        self
    }
}

/// Transport failures.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot open {port}: {reason}")]
    Open { port: String, reason: String },
    #[error("write failed: {0}")]
    Write(String),
    #[error("no response within {0:?}")]
    Timeout(core::time::Duration),
    #[error("session is closed")]
    Closed,
}

impl DeviceError {
    /// Whether later sends on the same session can still succeed.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Write(_) | Self::Timeout(_))
    }
}

/// Abstract controller link
///
/// Implement this trait to support different transports. Implementations
/// must honor [`LinkTimings`]: `open` returns once the link has settled, and
/// `send` waits `message_delay` after writing, then returns whatever response
/// is buffered (empty if none), giving up after `read_timeout`.
pub trait DeviceSession {
    fn open(&mut self, link: &LinkConfig) -> Result<(), DeviceError>;

    /// Write one instruction and return the controller's response.
    fn send(&mut self, instruction: &str) -> Result<String, DeviceError>;

    fn close(&mut self);
}

/// Outcome of pushing one snapshot through a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitReport {
    pub sent: usize,
    pub failed: usize,
    /// Instructions never written because the session became unusable
    pub skipped: usize,
}

/// Send every instruction of `snapshot`, in order, over one open session.
///
/// Recoverable send errors are logged and the next instruction goes out.
/// Once the session is unusable the rest of the snapshot is dropped.
pub fn transmit<S: DeviceSession + ?Sized>(
    session: &mut S,
    link: &LinkConfig,
    snapshot: &Snapshot,
) -> TransmitReport {
    let mut report = TransmitReport::default();
    let total = snapshot.instructions.len();

    if let Err(e) = session.open(link) {
        error!(port = %link.port, error = %e, skipped = total, "Failed to open device session");
        report.skipped = total;
        return report;
    }
    info!(port = %link.port, baud = link.baud_rate, instructions = total, "Transmitting snapshot");

    for (i, instruction) in snapshot.instructions.iter().enumerate() {
        match session.send(&instruction.to_wire()) {
            Ok(response) => {
                report.sent += 1;
                debug!(block = %instruction.block, response = %response.trim_end(), "Instruction sent");
            }
            Err(e) if e.is_recoverable() => {
                report.failed += 1;
                warn!(block = %instruction.block, error = %e, "Instruction failed");
            }
            Err(e) => {
                report.failed += 1;
                report.skipped = total - i - 1;
                error!(error = %e, skipped = report.skipped, "Device session unusable, dropping rest of snapshot");
                break;
            }
        }
    }

    session.close();
    report
}

pub(crate) fn sleep(duration: Duration) {
    std::thread::sleep(core::time::Duration::from_micros(duration.as_micros()));
}

/// Session that talks to no hardware.
///
/// Logs and keeps every instruction it is given, and follows the timing
/// contract unless built with [`DryRunSession::instant`]. A simulated
/// controller latency set with [`DryRunSession::with_latency`] is bounded by
/// the link's `read_timeout`: a slower response times out.
#[derive(Debug, Default)]
pub struct DryRunSession {
    sent: Vec<String>,
    is_open: bool,
    timings: Option<LinkTimings>,
    skip_delays: bool,
    latency: Option<Duration>,
}

impl DryRunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dry run that never sleeps.
    pub fn instant() -> Self {
        Self {
            skip_delays: true,
            ..Self::default()
        }
    }

    /// Answer every instruction after `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Instructions written so far.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

impl DeviceSession for DryRunSession {
    fn open(&mut self, link: &LinkConfig) -> Result<(), DeviceError> {
        if !self.skip_delays {
            sleep(link.timings.settle);
        }
        self.timings = Some(link.timings);
        self.is_open = true;
        debug!(port = %link.port, baud = link.baud_rate, "Dry-run session opened");
        Ok(())
    }

    fn send(&mut self, instruction: &str) -> Result<String, DeviceError> {
        if !self.is_open {
            return Err(DeviceError::Closed);
        }
        debug!(instruction, "Dry-run instruction");
        self.sent.push(instruction.to_owned());
        let timings = self.timings.unwrap_or_default();
        if !self.skip_delays {
            sleep(timings.message_delay);
        }
        match self.latency {
            Some(latency) if latency > timings.read_timeout => {
                if !self.skip_delays {
                    sleep(timings.read_timeout);
                }
                Err(DeviceError::Timeout(core::time::Duration::from_micros(
                    timings.read_timeout.as_micros(),
                )))
            }
            Some(latency) => {
                if !self.skip_delays {
                    sleep(latency);
                }
                Ok(String::new())
            }
            None => Ok(String::new()),
        }
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}
