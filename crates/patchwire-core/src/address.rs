//! Parameter addressing types.
//!
//! A synthesizer parameter is identified on the wire by a (page, part, index)
//! triple: the sysex page grouping related parameters, the multitimbral part
//! (MIDI channel), and the ordinal within the page. [`ParamAddress`] is the
//! ordered map key used by the registry and by decode output.

use std::fmt;

/// Multitimbral part number (0-15, one per MIDI channel).
pub type PartId = u8;

/// Number of multitimbral parts a device exposes.
pub const PART_COUNT: usize = 16;

/// The wire-level identity of a logical parameter slot.
///
/// Two addresses with the same (page, index) but different parts are
/// distinct parameters, unless the underlying description is shared across
/// parts - shared parameters always resolve to part 0.
///
/// The derived `Ord` gives the (page, part, index) lexicographic total
/// order, which is what makes `ParamAddress` usable as a `BTreeMap` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamAddress {
    /// Sysex page this parameter lives on.
    pub page: u8,
    /// Multitimbral part (0-15).
    pub part: PartId,
    /// Ordinal within the page.
    pub index: u32,
}

impl ParamAddress {
    /// Create a new address.
    pub const fn new(page: u8, part: PartId, index: u32) -> Self {
        Self { page, part, index }
    }
}

impl fmt::Display for ParamAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {:#04x} part {} index {}",
            self.page, self.part, self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_ordering() {
        let a = ParamAddress::new(0, 0, 5);
        let b = ParamAddress::new(0, 1, 0);
        let c = ParamAddress::new(1, 0, 0);

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, ParamAddress::new(0, 0, 5));
    }
}
