//! Error types for the Patchwire core.

use std::fmt;

use crate::field::FieldKind;

/// Errors produced by the sysex codec and the parameter resolvers.
///
/// Every failure is a synchronous `Result` return; nothing in the core
/// panics on malformed wire data. A failed encode yields no buffer at all
/// and a failed parse leaves no partial output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SysexError {
    /// A named packet template does not exist in the description table.
    UnknownPacket(String),
    /// A field references a parameter name the description table doesn't know.
    UnknownParameter(String),
    /// Encode was not given a value for a direct (non-parameter) field.
    MissingValue(FieldKind),
    /// Encode was not given a value for a parameter field.
    MissingParameter { part: u8, name: String },
    /// The inbound buffer length does not match the template length.
    LengthMismatch { expected: usize, actual: usize },
    /// A literal byte in the buffer does not match the template.
    LiteralMismatch { index: usize, expected: u8, actual: u8 },
    /// A checksum byte does not match its recomputed value.
    ChecksumMismatch { index: usize, expected: u8, actual: u8 },
}

impl fmt::Display for SysexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPacket(name) => write!(f, "Unknown packet template: {}", name),
            Self::UnknownParameter(name) => write!(f, "Unknown parameter: {}", name),
            Self::MissingValue(kind) => write!(f, "Missing value for field: {:?}", kind),
            Self::MissingParameter { part, name } => {
                write!(f, "Missing value for parameter '{}' on part {}", name, part)
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "Buffer length mismatch: expected {}, got {}", expected, actual)
            }
            Self::LiteralMismatch { index, expected, actual } => write!(
                f,
                "Literal mismatch at byte {}: expected {:#04x}, got {:#04x}",
                index, expected, actual
            ),
            Self::ChecksumMismatch { index, expected, actual } => write!(
                f,
                "Checksum mismatch at byte {}: expected {:#04x}, got {:#04x}",
                index, expected, actual
            ),
        }
    }
}

impl std::error::Error for SysexError {}

/// Result type for Patchwire core operations.
pub type SysexResult<T> = Result<T, SysexError>;
