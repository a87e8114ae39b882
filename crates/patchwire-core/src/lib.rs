//! # patchwire-core
//!
//! Sysex codec and parameter-addressing core for the Patchwire control
//! surface. This crate translates between a device's wire-level sysex byte
//! streams and named, addressable synthesizer parameters. It has no external
//! dependencies and no I/O - pure data structures plus the codec logic.
//!
//! ## Main Types
//!
//! - [`FieldDef`] - typed descriptor for one byte position of a message
//! - [`SysexTemplate`] - data-defined layout of one sysex message, with
//!   [`create`](SysexTemplate::create) / [`parse`](SysexTemplate::parse)
//! - [`ParamAddress`] - (page, part, index) identity of a parameter slot
//! - [`ParameterDescriptions`] - the device's parameter and packet tables
//! - [`SysexError`] - codec and resolution failures
//!
//! The controller layer that binds templates to live parameter instances
//! lives in the `patchwire` crate.

pub mod address;
pub mod descriptions;
pub mod error;
pub mod field;
pub mod template;

// Re-exports for convenience
pub use address::{ParamAddress, PartId, PART_COUNT};
pub use descriptions::{Description, ParameterDescriptions};
pub use error::{SysexError, SysexResult};
pub use field::{ChecksumSpec, FieldDef, FieldKind, ParamField, PartSelector};
pub use template::{FieldValues, NamedValues, ParamValues, SysexTemplate};
