//! Live parameter instances.
//!
//! One [`Parameter`] per (part x description) pair, constructed by the
//! registry at startup and alive for the process lifetime. The current
//! value is an atomic byte so the host/UI thread and the MIDI path can read
//! and write it without locking.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use patchwire_core::{Description, ParamAddress, PartId};

/// A live synthesizer parameter bound to exactly one address.
///
/// `uid` disambiguates instances that share an address because the
/// description table lists the same logical control more than once (layered
/// banks); the first instance at an address gets uid 0, duplicates count up
/// and are registered as derived.
pub struct Parameter {
    desc: Description,
    part: PartId,
    uid: u32,
    value: AtomicU8,
}

impl Parameter {
    /// Create an instance with the description's default value.
    pub fn new(desc: Description, part: PartId, uid: u32) -> Self {
        let value = AtomicU8::new(desc.default_value);
        Self {
            desc,
            part,
            uid,
            value,
        }
    }

    /// The static description this instance was built from.
    pub fn description(&self) -> &Description {
        &self.desc
    }

    /// The parameter's symbolic name.
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// The part this instance belongs to (0 for shared parameters).
    pub fn part(&self) -> PartId {
        self.part
    }

    /// Disambiguating uid among same-address instances.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// The instance's wire address.
    pub fn address(&self) -> ParamAddress {
        ParamAddress::new(self.desc.page, self.part, self.desc.index)
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }

    /// Set the current value.
    #[inline]
    pub fn set_value(&self, value: u8) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.desc.name)
            .field("address", &self.address())
            .field("uid", &self.uid)
            .field("value", &self.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_value_and_address() {
        let p = Parameter::new(
            Description::new("Cutoff", 1, 16).with_default(0x40),
            3,
            0,
        );

        assert_eq!(p.value(), 0x40);
        assert_eq!(p.address(), ParamAddress::new(1, 3, 16));
        assert_eq!(p.name(), "Cutoff");
    }

    #[test]
    fn test_set_value() {
        let p = Parameter::new(Description::new("Resonance", 0, 17), 0, 0);
        p.set_value(0x7f);
        assert_eq!(p.value(), 0x7f);
    }
}
