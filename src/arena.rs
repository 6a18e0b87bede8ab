//! Arena model and command ingress
//!
//! Payloads arrive as JSON envelopes: `{"arena": {...}}` for a single state
//! and `{"experiment": {...}}` for a timed sequence. Shapes are checked here;
//! colors and index specs are resolved later, per override, so one bad
//! override cannot sink a whole experiment.

use serde::{Deserialize, Serialize};

use crate::address::IndexSpec;
use crate::error::{Error, Result};

/// Color name used for the "all off" snapshot.
pub const CLEARED_COLOR: &str = "none";

/// Most LEDs one arena may address.
pub const MAX_ARENA_LEDS: i64 = 1 << 20;

/// Most states one experiment may schedule, repetitions included.
pub const MAX_PLANNED_STATES: usize = 1 << 20;

fn cleared_color() -> String {
    CLEARED_COLOR.to_owned()
}

/// Full arena configuration: `edges × blocks × leds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Edge count `E`
    pub edges: u32,
    /// Blocks per edge `B`
    pub blocks: u32,
    /// LEDs per block `L`
    pub leds: u32,
    #[serde(default)]
    pub brightness: u8,
    /// Default color of every block
    #[serde(default = "cleared_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge: Vec<EdgeOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block: Vec<BlockOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub led: Vec<LedOverride>,
}

/// Color for one or more edges, with overrides relative to the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeOverride {
    pub index: IndexSpec,
    pub color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block: Vec<BlockOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub led: Vec<LedOverride>,
}

/// Color for one or more blocks, with LED overrides relative to the block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockOverride {
    pub index: IndexSpec,
    pub color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub led: Vec<LedOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedOverride {
    pub index: IndexSpec,
    pub color: String,
}

/// One arena configuration and how long it stays up, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub time: f64,
    pub arena: Arena,
}

/// Ordered, timed sequence of states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    /// Total duration in seconds; bounds repetition
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub repeat: bool,
    /// Append an "all off" state at the end
    #[serde(default = "default_clean")]
    pub clean: bool,
    pub states: Vec<State>,
}

const fn default_clean() -> bool {
    true
}

#[derive(Deserialize)]
struct ExperimentEnvelope {
    experiment: Experiment,
}

impl Arena {
    pub fn new(edges: u32, blocks: u32, leds: u32, color: &str) -> Self {
        Self {
            edges,
            blocks,
            leds,
            brightness: 0,
            color: color.to_owned(),
            edge: Vec::new(),
            block: Vec::new(),
            led: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.edges == 0 || self.blocks == 0 || self.leds == 0 {
            return Err(Error::MalformedCommand(format!(
                "arena dimensions must be at least 1, got {}x{}x{}",
                self.edges, self.blocks, self.leds
            )));
        }
        let leds = i64::from(self.edges)
            .checked_mul(i64::from(self.blocks))
            .and_then(|blocks| blocks.checked_mul(i64::from(self.leds)))
            .filter(|leds| *leds <= MAX_ARENA_LEDS);
        if leds.is_none() {
            return Err(Error::MalformedCommand(format!(
                "arena {}x{}x{} exceeds {MAX_ARENA_LEDS} LEDs",
                self.edges, self.blocks, self.leds
            )));
        }
        Ok(())
    }

    /// Number of addressable blocks, `E * B`.
    pub fn block_count(&self) -> i64 {
        i64::from(self.edges).saturating_mul(i64::from(self.blocks))
    }

    /// Number of addressable LEDs, `E * B * L`.
    pub fn led_count(&self) -> i64 {
        self.block_count().saturating_mul(i64::from(self.leds))
    }

    /// Copy of this arena with everything switched off.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            color: cleared_color(),
            edge: Vec::new(),
            block: Vec::new(),
            led: Vec::new(),
            ..self.clone()
        }
    }
}

impl State {
    pub fn new(time: f64, arena: Arena) -> Self {
        Self { time, arena }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(Error::MalformedCommand(format!(
                "state time must be a non-negative number of seconds, got {}",
                self.time
            )));
        }
        self.arena.validate()
    }
}

impl Experiment {
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<()> {
        if self.states.is_empty() {
            return Err(Error::malformed("experiment has no states"));
        }
        if !self.total_time.is_finite() || self.total_time < 0.0 {
            return Err(Error::MalformedCommand(format!(
                "totalTime must be a non-negative number of seconds, got {}",
                self.total_time
            )));
        }
        for state in &self.states {
            state.validate()?;
        }
        if self.repeat && (self.cycle_time() <= 0.0 || self.total_time <= 0.0) {
            return Err(Error::malformed(
                "repeating experiment needs a positive totalTime and state times",
            ));
        }
        let planned = if self.repeat {
            (self.total_time / self.cycle_time()).ceil() * self.states.len() as f64
        } else {
            self.states.len() as f64
        };
        if planned > MAX_PLANNED_STATES as f64 {
            return Err(Error::MalformedCommand(format!(
                "experiment would schedule {planned} states, at most {MAX_PLANNED_STATES} allowed"
            )));
        }
        Ok(())
    }

    /// Sum of state durations, one pass.
    pub fn cycle_time(&self) -> f64 {
        self.states.iter().map(|state| state.time).sum()
    }

    /// Number of passes over the states.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn passes(&self) -> u32 {
        if !self.repeat {
            return 1;
        }
        let cycle = self.cycle_time();
        if cycle <= 0.0 {
            return 1;
        }
        (self.total_time / cycle).ceil().min(f64::from(u32::MAX)) as u32
    }
}

/// Parse a `{"arena": {...}}` state payload.
pub fn parse_state(json: &str) -> Result<State> {
    let state: State = serde_json::from_str(json).map_err(Error::malformed)?;
    state.validate()?;
    Ok(state)
}

/// Parse an `{"experiment": {...}}` payload.
pub fn parse_experiment(json: &str) -> Result<Experiment> {
    let envelope: ExperimentEnvelope = serde_json::from_str(json).map_err(Error::malformed)?;
    envelope.experiment.validate()?;
    Ok(envelope.experiment)
}

/// Acknowledgement returned to a submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Receipt {
    Received { status: &'static str },
    Rejected { error: String },
}

impl Receipt {
    pub const fn received() -> Self {
        Self::Received { status: "received" }
    }

    pub fn rejected(err: &Error) -> Self {
        Self::Rejected {
            error: err.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
