//! # patchwire
//!
//! Parameter registry and control-surface controller for the Patchwire
//! sysex layer.
//!
//! This crate binds the data-defined sysex codec from [`patchwire_core`] to
//! live parameter instances: it builds the full (page, part, index) address
//! map across all 16 parts at startup, dedupes shared parameters, tracks
//! same-address duplicates by uid, and stages outbound sysex for the
//! audio/MIDI output path to drain.
//!
//! ## Architecture
//!
//! ```text
//! description table (patchwire-core)
//!        |
//! Controller::register_parameters  ->  ParameterHost (plugin framework)
//!        |
//! Controller::create_sysex / parse_sysex  <->  SysexTemplate codec
//!        |
//! MidiOutQueue  ->  audio/MIDI output path
//! ```
//!
//! ## Main Types
//!
//! - [`Controller`] - the registry plus sysex encode/decode entry points
//! - [`Parameter`] - one live, atomically-valued parameter instance
//! - [`ParameterHost`] / [`ParameterGroup`] - host framework seam
//! - [`MidiOutQueue`] / [`MidiEvent`] - outbound staging buffer

pub mod controller;
pub mod error;
pub mod host;
pub mod parameter;
pub mod queue;

// Re-exports for convenience
pub use controller::{Controller, ParamHandle};
pub use error::{ControllerError, ControllerResult};
pub use host::{CollectingHost, NoHost, ParameterGroup, ParameterHost};
pub use parameter::Parameter;
pub use queue::{MidiEvent, MidiOutQueue, MidiSource};

// The core types controller users need constantly
pub use patchwire_core::{
    ChecksumSpec, Description, FieldDef, FieldKind, FieldValues, NamedValues, ParamAddress,
    ParamField, ParamValues, ParameterDescriptions, PartId, PartSelector, SysexError, SysexResult,
    SysexTemplate, PART_COUNT,
};
