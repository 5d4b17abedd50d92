//! Object identity
//!
//! Every logical object carries a random (version 4) UUID. Shallow copies
//! share it; every deep clone mints a new one.

use std::fmt;

/// UUID naming one logical object instance
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(u128);

const VERSION_MASK: u128 = 0xf << 76;
const VERSION_4: u128 = 0x4 << 76;
const VARIANT_MASK: u128 = 0x3 << 62;
const VARIANT_RFC4122: u128 = 0x2 << 62;

impl Identity {
    /// Mint a fresh random identity
    pub fn new() -> Self {
        let bits: u128 = rand::random();
        Self((bits & !VERSION_MASK & !VARIANT_MASK) | VERSION_4 | VARIANT_RFC4122)
    }

    /// Identity from its raw 128-bit value
    pub const fn from_u128(bits: u128) -> Self {
        Self(bits)
    }

    /// Raw 128-bit value
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Big-endian byte representation
    pub const fn to_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identity {
    /// Hyphenated lowercase form, `xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff
        )
    }
}

impl fmt::Debug for Identity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}
