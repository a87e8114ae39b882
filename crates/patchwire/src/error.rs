//! Error types for the controller layer.

use std::fmt;

use patchwire_core::{PartId, SysexError};

/// Errors from the controller's encode/decode entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// A named packet template does not exist in the description table.
    UnknownPacket(String),
    /// A template references a parameter name the table doesn't know.
    UnknownParameter(String),
    /// No live instance exists for a (part, flat index) slot a template needs.
    MissingInstance { part: PartId, index: u32 },
    /// The underlying codec failed.
    Sysex(SysexError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPacket(name) => write!(f, "Unknown packet template: {}", name),
            Self::UnknownParameter(name) => write!(f, "Unknown parameter: {}", name),
            Self::MissingInstance { part, index } => {
                write!(f, "No parameter instance at index {} on part {}", index, part)
            }
            Self::Sysex(err) => write!(f, "Sysex codec error: {}", err),
        }
    }
}

impl std::error::Error for ControllerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sysex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SysexError> for ControllerError {
    fn from(err: SysexError) -> Self {
        Self::Sysex(err)
    }
}

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;
