//! Byte-field descriptors for sysex packet templates.
//!
//! A packet template is an ordered sequence of [`FieldDef`]s, one per byte
//! position - the position in the sequence *is* the byte offset within the
//! message. Each descriptor says how that byte is produced on encode and
//! consumed on decode: a literal constant, a direct value supplied by the
//! caller (device id, bank, program, ...), a masked/shifted slice of a named
//! parameter's value, or a checksum computed over a byte range.

use crate::address::PartId;

// =============================================================================
// Field kinds
// =============================================================================

/// Payload-free discriminant of a [`FieldDef`].
///
/// Used as the key of the direct-value map handed to encode and returned by
/// decode: the caller supplies one byte per kind it controls (`DeviceId`,
/// `Bank`, `Program`, `Page`, `Part`, `ParameterIndex`, `ParameterValue`).
/// `Checksum` is always computed, never supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// Reserved byte, written as zero and ignored on decode.
    Null,
    /// Literal constant byte (manufacturer id, framing, terminator, ...).
    Byte,
    /// Device id byte.
    DeviceId,
    /// Checksum over a declared byte range.
    Checksum,
    /// Bank number byte.
    Bank,
    /// Program number byte.
    Program,
    /// Masked/shifted slice of a named parameter's value.
    Parameter,
    /// Index of a parameter within its page.
    ParameterIndex,
    /// Full value of the parameter a `ParameterIndex` refers to.
    ParameterValue,
    /// Sysex page byte.
    Page,
    /// Multitimbral part byte.
    Part,
}

// =============================================================================
// Part selection
// =============================================================================

/// Which part a parameter field belongs to.
///
/// Most parameter fields are part-agnostic (`Any`) and take their effective
/// part from the `Part` byte of the same message; a field can instead be
/// pinned to one specific part, which some multi-part dump formats need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PartSelector {
    /// Wildcard - resolved from the message's `Part` value.
    #[default]
    Any,
    /// Pinned to one specific part.
    Fixed(PartId),
}

impl PartSelector {
    /// Resolve to a concrete part, substituting `fallback` for the wildcard.
    #[inline]
    pub fn resolve(self, fallback: PartId) -> PartId {
        match self {
            Self::Any => fallback,
            Self::Fixed(part) => part,
        }
    }
}

// =============================================================================
// Parameter fields
// =============================================================================

/// A byte position carrying bits of a named parameter's value.
///
/// `mask` and `shift` select which bits of the value land in this byte, so a
/// single logical value can span several bytes (e.g. a high/low nibble
/// split) or share one byte with other fields - encode ORs the packed bits
/// into the byte, decode ORs the unpacked bits into the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamField {
    /// Symbolic parameter name, resolved through the description table.
    pub name: String,
    /// Bit mask applied after shifting. Default `0xff` (whole byte).
    pub mask: u8,
    /// Right-shift applied to the value before masking. Default 0.
    pub shift: u8,
    /// Part this field belongs to. Default wildcard.
    pub part: PartSelector,
}

impl ParamField {
    /// Create a whole-byte, part-agnostic parameter field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mask: 0xff,
            shift: 0,
            part: PartSelector::Any,
        }
    }

    /// Set the bit mask.
    pub fn with_mask(mut self, mask: u8) -> Self {
        self.mask = mask;
        self
    }

    /// Set the right-shift.
    pub fn with_shift(mut self, shift: u8) -> Self {
        self.shift = shift;
        self
    }

    /// Pin the field to one specific part.
    pub fn with_part(mut self, part: PartId) -> Self {
        self.part = PartSelector::Fixed(part);
        self
    }

    /// Extract this field's bits from a full parameter value.
    #[inline]
    pub fn pack(&self, value: u8) -> u8 {
        (value >> self.shift) & self.mask
    }

    /// Recover this field's contribution to the full parameter value.
    #[inline]
    pub fn unpack(&self, byte: u8) -> u8 {
        (byte & self.mask) << self.shift
    }
}

// =============================================================================
// Checksums
// =============================================================================

/// Checksum specification: an inclusive byte range and an initial
/// accumulator value.
///
/// The checksum is the wrapping byte sum of the finished buffer over
/// `first..=last`, starting from `init`. The checksum's own byte position is
/// always excluded from the sum, so a range that happens to cover it stays
/// consistent between encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumSpec {
    /// First byte index of the summed range (inclusive).
    pub first: usize,
    /// Last byte index of the summed range (inclusive).
    pub last: usize,
    /// Initial accumulator value.
    pub init: u8,
}

impl ChecksumSpec {
    /// Create a checksum over `first..=last` with a zero accumulator.
    pub const fn new(first: usize, last: usize) -> Self {
        Self { first, last, init: 0 }
    }

    /// Set the initial accumulator value.
    pub const fn with_init(mut self, init: u8) -> Self {
        self.init = init;
        self
    }

    /// Compute the checksum over `buf`, skipping the checksum's own byte at
    /// `own_index`.
    pub fn compute(&self, buf: &[u8], own_index: usize) -> u8 {
        debug_assert!(self.last < buf.len(), "checksum range exceeds buffer");

        let mut sum = self.init;
        for (i, byte) in buf.iter().enumerate().take(self.last + 1).skip(self.first) {
            if i != own_index {
                sum = sum.wrapping_add(*byte);
            }
        }
        sum
    }
}

// =============================================================================
// Field definitions
// =============================================================================

/// One byte position of a packet template.
///
/// A closed tagged union: encode and decode match exhaustively over the
/// variants, so adding a field kind is a compile-time-checked change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDef {
    /// Reserved byte: zero on encode, ignored on decode.
    Null,
    /// Literal constant byte, verified on decode.
    Byte(u8),
    /// Device id supplied/extracted as a direct value.
    DeviceId,
    /// Computed checksum byte.
    Checksum(ChecksumSpec),
    /// Bank number direct value.
    Bank,
    /// Program number direct value.
    Program,
    /// Bits of a named parameter's value.
    Parameter(ParamField),
    /// Parameter-within-page index direct value.
    ParameterIndex,
    /// Parameter value direct value.
    ParameterValue,
    /// Page direct value.
    Page,
    /// Part direct value.
    Part,
}

impl FieldDef {
    /// Shorthand for a whole-byte, part-agnostic parameter field.
    pub fn param(name: impl Into<String>) -> Self {
        Self::Parameter(ParamField::new(name))
    }

    /// Shorthand for a masked/shifted parameter field.
    pub fn param_bits(name: impl Into<String>, mask: u8, shift: u8) -> Self {
        Self::Parameter(ParamField::new(name).with_mask(mask).with_shift(shift))
    }

    /// The payload-free discriminant of this field.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Null => FieldKind::Null,
            Self::Byte(_) => FieldKind::Byte,
            Self::DeviceId => FieldKind::DeviceId,
            Self::Checksum(_) => FieldKind::Checksum,
            Self::Bank => FieldKind::Bank,
            Self::Program => FieldKind::Program,
            Self::Parameter(_) => FieldKind::Parameter,
            Self::ParameterIndex => FieldKind::ParameterIndex,
            Self::ParameterValue => FieldKind::ParameterValue,
            Self::Page => FieldKind::Page,
            Self::Part => FieldKind::Part,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibble_pack_unpack() {
        let high = ParamField::new("Cutoff").with_mask(0x0f).with_shift(4);
        let low = ParamField::new("Cutoff").with_mask(0x0f);

        let value = 0xa5;
        assert_eq!(high.pack(value), 0x0a);
        assert_eq!(low.pack(value), 0x05);
        assert_eq!(high.unpack(0x0a) | low.unpack(0x05), value);
    }

    #[test]
    fn test_part_selector_resolve() {
        assert_eq!(PartSelector::Any.resolve(3), 3);
        assert_eq!(PartSelector::Fixed(7).resolve(3), 7);
    }

    #[test]
    fn test_checksum_skips_own_byte() {
        let spec = ChecksumSpec::new(0, 3).with_init(0x10);
        let buf = [1u8, 2, 0xee, 3];

        // Byte 2 is the checksum's own position and must not contribute.
        assert_eq!(spec.compute(&buf, 2), 0x10 + 1 + 2 + 3);
    }

    #[test]
    fn test_checksum_wraps() {
        let spec = ChecksumSpec::new(0, 1);
        let buf = [0xff, 0x02];
        assert_eq!(spec.compute(&buf, usize::MAX), 0x01);
    }

    #[test]
    fn test_field_kind() {
        assert_eq!(FieldDef::Byte(0xf0).kind(), FieldKind::Byte);
        assert_eq!(FieldDef::param("Cutoff").kind(), FieldKind::Parameter);
        assert_eq!(
            FieldDef::Checksum(ChecksumSpec::new(1, 4)).kind(),
            FieldKind::Checksum
        );
    }
}
