//! Per-type dispatch: the `TypeOps` trait and the `VTable` fragment
//!
//! A type author either implements [`TypeOps`] (overriding only the
//! capabilities the type needs) or fills in a [`VTable`] of plain function
//! pointers. Both fall back to the generic behaviour in [`defaults`] for
//! anything left out.

use std::cmp::Ordering;
use std::fmt;

use super::Object;
use crate::runtime::memory::MemoryBlock;

/// Polymorphic operations of one registered type
///
/// `clone_payload` and `release` work on the raw payload; the remaining
/// capabilities see the whole object.
pub trait TypeOps {
    /// Produce an independent copy of `payload` for a deep clone
    fn clone_payload(
        &self,
        payload: &MemoryBlock,
    ) -> MemoryBlock {
        defaults::clone_payload(payload)
    }

    /// Tear down `payload` before its last reference is freed
    fn release(
        &self,
        payload: &MemoryBlock,
    ) {
        defaults::release(payload)
    }

    /// Three-way comparison
    fn cmp(
        &self,
        a: &Object,
        b: &Object,
    ) -> Ordering {
        defaults::cmp(a, b)
    }

    /// Whether the payload is well formed for this type
    fn is_valid(
        &self,
        object: &Object,
    ) -> bool {
        defaults::is_valid(object)
    }

    /// Byte size of the stored representation
    fn size(
        &self,
        object: &Object,
    ) -> usize {
        defaults::size(object)
    }

    /// Number of logical elements
    fn length(
        &self,
        object: &Object,
    ) -> usize {
        defaults::length(object)
    }

    /// Hash of the object
    fn hash(
        &self,
        object: &Object,
    ) -> u64 {
        defaults::hash(object)
    }

    /// Textual form
    fn to_string(
        &self,
        object: &Object,
    ) -> String {
        defaults::to_string(object)
    }
}

/// The all-default behaviour, used for unregistered type ids
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOps;

impl TypeOps for DefaultOps {}

/// Function-pointer vtable fragment
///
/// Unset entries are filled with the generic defaults by
/// [`VTable::complete`], which registration does automatically.
#[derive(Clone, Copy, Default)]
pub struct VTable {
    pub clone: Option<fn(&MemoryBlock) -> MemoryBlock>,
    pub release: Option<fn(&MemoryBlock)>,
    pub cmp: Option<fn(&Object, &Object) -> Ordering>,
    pub valid: Option<fn(&Object) -> bool>,
    pub size: Option<fn(&Object) -> usize>,
    pub length: Option<fn(&Object) -> usize>,
    pub hash: Option<fn(&Object) -> u64>,
    pub to_string: Option<fn(&Object) -> String>,
}

impl VTable {
    /// An empty fragment (every capability defaulted)
    pub const fn new() -> Self {
        Self {
            clone: None,
            release: None,
            cmp: None,
            valid: None,
            size: None,
            length: None,
            hash: None,
            to_string: None,
        }
    }

    pub fn with_clone(
        mut self,
        f: fn(&MemoryBlock) -> MemoryBlock,
    ) -> Self {
        self.clone = Some(f);
        self
    }

    pub fn with_release(
        mut self,
        f: fn(&MemoryBlock),
    ) -> Self {
        self.release = Some(f);
        self
    }

    pub fn with_cmp(
        mut self,
        f: fn(&Object, &Object) -> Ordering,
    ) -> Self {
        self.cmp = Some(f);
        self
    }

    pub fn with_valid(
        mut self,
        f: fn(&Object) -> bool,
    ) -> Self {
        self.valid = Some(f);
        self
    }

    pub fn with_size(
        mut self,
        f: fn(&Object) -> usize,
    ) -> Self {
        self.size = Some(f);
        self
    }

    pub fn with_length(
        mut self,
        f: fn(&Object) -> usize,
    ) -> Self {
        self.length = Some(f);
        self
    }

    pub fn with_hash(
        mut self,
        f: fn(&Object) -> u64,
    ) -> Self {
        self.hash = Some(f);
        self
    }

    pub fn with_to_string(
        mut self,
        f: fn(&Object) -> String,
    ) -> Self {
        self.to_string = Some(f);
        self
    }

    /// Fill every unset entry with the generic default
    pub fn complete(self) -> Self {
        Self {
            clone: Some(self.clone.unwrap_or(defaults::clone_payload)),
            release: Some(self.release.unwrap_or(defaults::release)),
            cmp: Some(self.cmp.unwrap_or(defaults::cmp)),
            valid: Some(self.valid.unwrap_or(defaults::is_valid)),
            size: Some(self.size.unwrap_or(defaults::size)),
            length: Some(self.length.unwrap_or(defaults::length)),
            hash: Some(self.hash.unwrap_or(defaults::hash)),
            to_string: Some(self.to_string.unwrap_or(defaults::to_string)),
        }
    }

    /// Whether every entry is set
    pub fn is_complete(&self) -> bool {
        self.clone.is_some()
            && self.release.is_some()
            && self.cmp.is_some()
            && self.valid.is_some()
            && self.size.is_some()
            && self.length.is_some()
            && self.hash.is_some()
            && self.to_string.is_some()
    }
}

impl TypeOps for VTable {
    fn clone_payload(
        &self,
        payload: &MemoryBlock,
    ) -> MemoryBlock {
        self.clone.unwrap_or(defaults::clone_payload)(payload)
    }

    fn release(
        &self,
        payload: &MemoryBlock,
    ) {
        self.release.unwrap_or(defaults::release)(payload)
    }

    fn cmp(
        &self,
        a: &Object,
        b: &Object,
    ) -> Ordering {
        self.cmp.unwrap_or(defaults::cmp)(a, b)
    }

    fn is_valid(
        &self,
        object: &Object,
    ) -> bool {
        self.valid.unwrap_or(defaults::is_valid)(object)
    }

    fn size(
        &self,
        object: &Object,
    ) -> usize {
        self.size.unwrap_or(defaults::size)(object)
    }

    fn length(
        &self,
        object: &Object,
    ) -> usize {
        self.length.unwrap_or(defaults::length)(object)
    }

    fn hash(
        &self,
        object: &Object,
    ) -> u64 {
        self.hash.unwrap_or(defaults::hash)(object)
    }

    fn to_string(
        &self,
        object: &Object,
    ) -> String {
        self.to_string.unwrap_or(defaults::to_string)(object)
    }
}

impl fmt::Debug for VTable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("VTable")
            .field("clone", &self.clone.is_some())
            .field("release", &self.release.is_some())
            .field("cmp", &self.cmp.is_some())
            .field("valid", &self.valid.is_some())
            .field("size", &self.size.is_some())
            .field("length", &self.length.is_some())
            .field("hash", &self.hash.is_some())
            .field("to_string", &self.to_string.is_some())
            .finish()
    }
}

/// Type-agnostic behaviour
pub mod defaults {
    use std::cmp::Ordering;

    use crate::runtime::memory::MemoryBlock;
    use crate::runtime::object::Object;
    use crate::util::hash::hash_u128;

    /// Byte copy of the payload
    pub fn clone_payload(payload: &MemoryBlock) -> MemoryBlock {
        payload.deep_clone()
    }

    /// Nothing to tear down for plain bytes
    pub fn release(_payload: &MemoryBlock) {}

    /// Byte-wise payload comparison
    ///
    /// Meaningless for payloads that embed owned pointers; such types must
    /// register their own `cmp`.
    pub fn cmp(
        a: &Object,
        b: &Object,
    ) -> Ordering {
        a.block().cmp(b.block())
    }

    /// Live, non-null payload
    pub fn is_valid(object: &Object) -> bool {
        !object.block().is_null()
    }

    /// Payload byte size
    pub fn size(object: &Object) -> usize {
        object.block().size()
    }

    /// A generic object counts as one element
    pub fn length(_object: &Object) -> usize {
        1
    }

    /// Hash of the identity
    pub fn hash(object: &Object) -> u64 {
        hash_u128(object.identity().as_u128())
    }

    /// Identity, type id and raw memory dump
    pub fn to_string(object: &Object) -> String {
        format!(
            "<object {} type={} {}>",
            object.identity(),
            object.type_id(),
            object.block().to_debug_string()
        )
    }
}
