//! Error types shared by the resolver, generator and scheduler.

use thiserror::Error;

use crate::session::DeviceError;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while accepting, resolving or transmitting arena commands.
///
/// Only [`Error::MalformedCommand`] ever reaches a submitter. The others are
/// local to one override or one instruction: they are logged and the rest of
/// the snapshot keeps going.
#[derive(Debug, Error)]
pub enum Error {
    /// Payload is not valid JSON or does not have the expected shape.
    #[error("malformed command: {0}")]
    MalformedCommand(String),
    /// Color name missing from the color table.
    #[error("unknown color: {0}")]
    UnknownColor(String),
    /// Index spec is empty, non-numeric or outside its scope.
    #[error("invalid index spec: {0}")]
    InvalidIndexSpec(String),
    /// Transport failure reported by the device session.
    #[error("device i/o: {0}")]
    DeviceIo(#[from] DeviceError),
}

impl Error {
    pub(crate) fn malformed(err: impl core::fmt::Display) -> Self {
        Self::MalformedCommand(err.to_string())
    }

    pub(crate) fn index(msg: impl Into<String>) -> Self {
        Self::InvalidIndexSpec(msg.into())
    }
}
