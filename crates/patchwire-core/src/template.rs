//! Sysex packet templates and the encode/decode codec.
//!
//! A [`SysexTemplate`] is the data-defined layout of one sysex message: an
//! ordered field sequence (see [`field`](crate::field)) plus lookup tables
//! derived once at construction. The same template drives both directions -
//! [`create`](SysexTemplate::create) fills a buffer from supplied values,
//! [`parse`](SysexTemplate::parse) recovers values from a buffer - so the
//! wire format cannot drift between encode and decode.
//!
//! Templates are built once at plugin load from the device's static message
//! table and never mutated; a malformed table is a programming error, not a
//! runtime condition.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::address::{ParamAddress, PartId};
use crate::descriptions::ParameterDescriptions;
use crate::error::{SysexError, SysexResult};
use crate::field::{FieldDef, FieldKind};

// =============================================================================
// Value maps
// =============================================================================

/// Direct byte values keyed by field kind (device id, bank, part, ...).
///
/// Input of [`SysexTemplate::create`], output of [`SysexTemplate::parse`].
/// `Checksum` never appears here - it is computed on encode and verified on
/// decode.
pub type FieldValues = BTreeMap<FieldKind, u8>;

/// Parameter values keyed by (part, parameter name); input of
/// [`SysexTemplate::create`].
pub type NamedValues = BTreeMap<(PartId, String), u8>;

/// Parameter values keyed by resolved address; output of
/// [`SysexTemplate::parse`].
pub type ParamValues = BTreeMap<ParamAddress, u8>;

// =============================================================================
// SysexTemplate
// =============================================================================

/// The layout of one sysex message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysexTemplate {
    name: String,
    fields: Vec<FieldDef>,
    byte_index_by_kind: BTreeMap<FieldKind, usize>,
    byte_index_by_param: HashMap<String, usize>,
    has_parameters: bool,
}

impl SysexTemplate {
    /// Build a template from its ordered field sequence.
    ///
    /// Computes the byte length (= field count) and the kind/name to byte
    /// index lookups. First occurrence wins for both lookups.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        let mut byte_index_by_kind = BTreeMap::new();
        let mut byte_index_by_param = HashMap::new();
        let mut has_parameters = false;

        for (i, field) in fields.iter().enumerate() {
            byte_index_by_kind.entry(field.kind()).or_insert(i);
            if let FieldDef::Parameter(pf) = field {
                has_parameters = true;
                byte_index_by_param.entry(pf.name.clone()).or_insert(i);
            }
        }

        Self {
            name: name.into(),
            fields,
            byte_index_by_kind,
            byte_index_by_param,
            has_parameters,
        }
    }

    /// Template name (unique within a description table).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message length in bytes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` for a zero-length template.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The ordered field sequence.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Byte index of the first field of the given kind.
    pub fn byte_index_of(&self, kind: FieldKind) -> Option<usize> {
        self.byte_index_by_kind.get(&kind).copied()
    }

    /// Byte index of the first field referencing the named parameter.
    pub fn byte_index_of_parameter(&self, name: &str) -> Option<usize> {
        self.byte_index_by_param.get(name).copied()
    }

    /// `true` if any field references a named parameter.
    pub fn references_parameters(&self) -> bool {
        self.has_parameters
    }

    // =========================================================================
    // Encode
    // =========================================================================

    /// Encode a sysex buffer from direct values and named parameter values.
    ///
    /// Wildcard-part parameter fields take their effective part from the
    /// `Part` entry of `data` (part 0 when absent), matching how decode
    /// resolves them from the `Part` byte of the message.
    ///
    /// Checksum fields are filled in a second pass, after every data byte is
    /// in place, so their declared ranges are stable. On any missing value
    /// the encode fails as a whole - a partial buffer is never returned and
    /// must never be transmitted.
    pub fn create(&self, data: &FieldValues, params: &NamedValues) -> SysexResult<Vec<u8>> {
        let mut out = vec![0u8; self.fields.len()];
        let wildcard_part = data.get(&FieldKind::Part).copied().unwrap_or(0);

        for (i, field) in self.fields.iter().enumerate() {
            match field {
                FieldDef::Null => {}
                FieldDef::Byte(byte) => out[i] = *byte,
                FieldDef::Checksum(_) => {}
                FieldDef::Parameter(pf) => {
                    let part = pf.part.resolve(wildcard_part);
                    let value = params.get(&(part, pf.name.clone())).ok_or_else(|| {
                        SysexError::MissingParameter {
                            part,
                            name: pf.name.clone(),
                        }
                    })?;
                    out[i] |= pf.pack(*value);
                }
                FieldDef::DeviceId
                | FieldDef::Bank
                | FieldDef::Program
                | FieldDef::ParameterIndex
                | FieldDef::ParameterValue
                | FieldDef::Page
                | FieldDef::Part => {
                    let kind = field.kind();
                    let value = data
                        .get(&kind)
                        .ok_or(SysexError::MissingValue(kind))?;
                    out[i] = *value;
                }
            }
        }

        // All data bytes are final; patch the checksums.
        for (i, field) in self.fields.iter().enumerate() {
            if let FieldDef::Checksum(spec) = field {
                out[i] = spec.compute(&out, i);
            }
        }

        Ok(out)
    }

    // =========================================================================
    // Decode
    // =========================================================================

    /// Decode a sysex buffer into direct values and per-address parameter
    /// values.
    ///
    /// Literal mismatches fail the parse - that is what lets a caller probe
    /// all known templates against an arbitrary inbound buffer and accept
    /// the first one that fits. Checksum mismatches fail unless
    /// `ignore_checksum_errors` is set; they are never silently corrected.
    ///
    /// Parameter fields are resolved in a second pass so a wildcard part can
    /// use the `Part` byte regardless of byte order. Shared (non-part-
    /// sensitive) parameters resolve to part 0, matching the registry's
    /// aliasing. Failure yields no partial output.
    pub fn parse(
        &self,
        src: &[u8],
        descriptions: &ParameterDescriptions,
        ignore_checksum_errors: bool,
    ) -> SysexResult<(FieldValues, ParamValues)> {
        if src.len() != self.fields.len() {
            return Err(SysexError::LengthMismatch {
                expected: self.fields.len(),
                actual: src.len(),
            });
        }

        let mut data = FieldValues::new();

        for (i, field) in self.fields.iter().enumerate() {
            match field {
                FieldDef::Null | FieldDef::Parameter(_) => {}
                FieldDef::Byte(byte) => {
                    if src[i] != *byte {
                        return Err(SysexError::LiteralMismatch {
                            index: i,
                            expected: *byte,
                            actual: src[i],
                        });
                    }
                }
                FieldDef::Checksum(spec) => {
                    let expected = spec.compute(src, i);
                    if expected != src[i] && !ignore_checksum_errors {
                        return Err(SysexError::ChecksumMismatch {
                            index: i,
                            expected,
                            actual: src[i],
                        });
                    }
                }
                FieldDef::DeviceId
                | FieldDef::Bank
                | FieldDef::Program
                | FieldDef::ParameterIndex
                | FieldDef::ParameterValue
                | FieldDef::Page
                | FieldDef::Part => {
                    data.insert(field.kind(), src[i]);
                }
            }
        }

        let wildcard_part = data.get(&FieldKind::Part).copied().unwrap_or(0);
        let mut values = ParamValues::new();

        for (i, field) in self.fields.iter().enumerate() {
            if let FieldDef::Parameter(pf) = field {
                let address = self.resolve_address(pf, descriptions, wildcard_part)?;
                *values.entry(address).or_insert(0) |= pf.unpack(src[i]);
            }
        }

        Ok((data, values))
    }

    // =========================================================================
    // Parameter index resolution
    // =========================================================================

    /// The distinct addresses this template's parameter fields reference.
    ///
    /// `part` resolves wildcard fields, exactly as a `Part` value of `part`
    /// would during encode. An empty set just means the template carries no
    /// parameters; an unknown parameter name is a definition error.
    pub fn parameter_addresses(
        &self,
        descriptions: &ParameterDescriptions,
        part: PartId,
    ) -> SysexResult<BTreeSet<ParamAddress>> {
        let mut addresses = BTreeSet::new();

        for field in &self.fields {
            if let FieldDef::Parameter(pf) = field {
                addresses.insert(self.resolve_address(pf, descriptions, part)?);
            }
        }

        Ok(addresses)
    }

    fn resolve_address(
        &self,
        pf: &crate::field::ParamField,
        descriptions: &ParameterDescriptions,
        wildcard_part: PartId,
    ) -> SysexResult<ParamAddress> {
        let desc = descriptions
            .description_by_name(&pf.name)
            .ok_or_else(|| SysexError::UnknownParameter(pf.name.clone()))?;

        // Shared parameters always live on part 0.
        let part = if desc.part_sensitive {
            pf.part.resolve(wildcard_part)
        } else {
            0
        };

        Ok(ParamAddress::new(desc.page, part, desc.index))
    }
}
