pub mod address;
pub mod arena;
pub mod color;
pub mod config;
pub mod error;
pub mod generator;
pub mod instruction;
pub mod queue;
pub mod scheduler;
pub mod session;

pub use address::{IndexSpec, expand_range, relative_to_absolute, wrap_negative};
pub use arena::{
    Arena, BlockOverride, EdgeOverride, Experiment, LedOverride, Receipt, State, parse_experiment,
    parse_state,
};
pub use config::HandlerConfig;
pub use error::{Error, Result};
pub use generator::{Snapshot, generate};
pub use instruction::Instruction;
pub use queue::SchedulerStatus;
pub use scheduler::{Scheduler, plan_experiment};
pub use session::{
    DEFAULT_LINK_TIMINGS, DeviceError, DeviceSession, DryRunSession, LinkConfig, LinkTimings,
    TransmitReport, transmit,
};

pub use color::{Color, Rgb};
pub use embassy_time::{Duration, Instant};
