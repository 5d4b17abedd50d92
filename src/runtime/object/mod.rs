//! Polymorphic objects
//!
//! An `Object` couples a [`MemoryBlock`] payload with a type id and an
//! [`Identity`]. All polymorphic operations look up the type's [`TypeOps`]
//! in the object's [`TypeRegistry`] and dispatch through it; unregistered
//! type ids get the generic defaults.
//!
//! # Ownership
//! - `copy()` / `Clone` is shallow: same identity, type id and payload
//!   address, refcount + 1.
//! - `deep_clone()` runs the type's `clone_payload` and wraps the result in
//!   a new object with a fresh identity.
//! - `payload_mut()` is copy-on-write: a shared object is deep-cloned
//!   first, so the caller always mutates an exclusively owned payload.
//! - When the last reference goes away (explicit `release()` or drop) the
//!   type's `release` callback runs before the block is freed.

mod identity;
pub mod vtable;

pub use identity::Identity;
pub use vtable::{DefaultOps, TypeOps, VTable};

use std::cell::{Ref, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::runtime::memory::{MemoryBlock, Scalar};
use crate::runtime::registry::{TypeId, TypeRegistry};

/// A typed, identity-carrying, reference-counted payload
pub struct Object {
    type_id: TypeId,
    identity: Identity,
    payload: MemoryBlock,
    registry: TypeRegistry,
}

impl Object {
    /// Wrap `payload` in a new object bound to the thread's default registry
    pub fn new(
        type_id: TypeId,
        payload: MemoryBlock,
    ) -> Self {
        Self::new_in(&TypeRegistry::current(), type_id, payload)
    }

    /// Wrap `payload` in a new object dispatching through `registry`
    ///
    /// The object must own its payload exclusively. A block that is still
    /// shared with other holders is cloned through the type's
    /// `clone_payload`, and the caller's aliases keep the original.
    pub fn new_in(
        registry: &TypeRegistry,
        type_id: TypeId,
        payload: MemoryBlock,
    ) -> Self {
        crate::contract!(!payload.is_null(), "object payload must not be null");
        let payload = if payload.refcount() > 1 {
            debug!(type_id = %type_id, "shared payload cloned for new object");
            registry.lookup_or_default(type_id).clone_payload(&payload)
        } else {
            payload
        };
        Self {
            type_id,
            identity: Identity::new(),
            payload,
            registry: registry.clone(),
        }
    }

    /// New object whose payload is a copy of `bytes`
    pub fn from_bytes(
        type_id: TypeId,
        bytes: &[u8],
    ) -> Self {
        Self::new(type_id, MemoryBlock::from_bytes(bytes))
    }

    /// Shallow copy: same identity and payload, refcount + 1
    pub fn copy(&self) -> Self {
        self.check_live();
        Self {
            type_id: self.type_id,
            identity: self.identity,
            payload: self.payload.copy(),
            registry: self.registry.clone(),
        }
    }

    /// Deep clone through the type's `clone_payload`, with a fresh identity
    pub fn deep_clone(&self) -> Self {
        self.check_live();
        let payload = self.ops().clone_payload(&self.payload);
        Self {
            type_id: self.type_id,
            identity: Identity::new(),
            payload,
            registry: self.registry.clone(),
        }
    }

    /// Drop this reference
    ///
    /// The last reference runs the type's `release` callback and frees the
    /// payload. The handle is null afterwards; releasing again is a no-op.
    pub fn release(&mut self) {
        if self.payload.is_null() {
            return;
        }
        if self.payload.refcount() == 1 {
            self.ops().release(&self.payload);
        }
        self.payload.release();
    }

    /// Whether this handle has been released
    pub fn is_released(&self) -> bool {
        self.payload.is_null()
    }

    #[track_caller]
    fn check_live(&self) {
        if self.payload.is_null() {
            crate::util::contract::violation(format_args!(
                "use of released object {} (type {})",
                self.identity, self.type_id
            ));
        }
    }

    /// The dispatch table for this object's type
    pub fn ops(&self) -> Rc<dyn TypeOps> {
        self.registry.lookup_or_default(self.type_id)
    }

    /// Registry this object dispatches through
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn block(&self) -> &MemoryBlock {
        &self.payload
    }

    /// Three-way comparison through the type's `cmp`
    pub fn cmp(
        &self,
        other: &Object,
    ) -> Ordering {
        self.check_live();
        other.check_live();
        TypeOps::cmp(&*self.ops(), self, other)
    }

    pub fn lt(
        &self,
        other: &Object,
    ) -> bool {
        self.cmp(other) == Ordering::Less
    }

    pub fn eq(
        &self,
        other: &Object,
    ) -> bool {
        self.cmp(other) == Ordering::Equal
    }

    pub fn gt(
        &self,
        other: &Object,
    ) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    /// Type-specific validity check
    pub fn is_valid(&self) -> bool {
        !self.payload.is_null() && self.ops().is_valid(self)
    }

    /// Byte size of the stored representation
    pub fn size(&self) -> usize {
        self.check_live();
        self.ops().size(self)
    }

    /// Number of logical elements
    pub fn length(&self) -> usize {
        self.check_live();
        self.ops().length(self)
    }

    /// `length() == 0`
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Hash through the type's `hash`
    pub fn hash(&self) -> u64 {
        self.check_live();
        TypeOps::hash(&*self.ops(), self)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Number of live references to the payload (0 once released)
    pub fn refcount(&self) -> usize {
        self.payload.refcount()
    }

    /// Payload address
    pub fn as_ptr(&self) -> *const u8 {
        self.payload.as_ptr()
    }

    /// Whether both handles alias the same payload
    pub fn ptr_eq(
        &self,
        other: &Object,
    ) -> bool {
        self.payload.ptr_eq(&other.payload)
    }

    /// Read-only view of the payload bytes
    pub fn payload(&self) -> Ref<'_, [u8]> {
        self.check_live();
        self.payload.bytes()
    }

    /// Mutable view of the payload bytes (copy-on-write)
    pub fn payload_mut(&mut self) -> RefMut<'_, [u8]> {
        self.make_unique();
        self.payload.bytes_mut()
    }

    /// Ensure this handle owns its payload exclusively
    ///
    /// A shared object is replaced by a deep clone (new payload, new
    /// identity); the other holders keep the original. Returns whether a
    /// clone happened.
    pub fn make_unique(&mut self) -> bool {
        self.check_live();
        if self.payload.refcount() <= 1 {
            return false;
        }
        let unique = self.deep_clone();
        debug!(
            type_id = %self.type_id,
            from = %self.identity,
            to = %unique.identity,
            "copy-on-write clone"
        );
        *self = unique;
        true
    }

    /// Read a scalar from the payload
    #[track_caller]
    pub fn read<T: Scalar>(
        &self,
        offset: usize,
    ) -> T {
        self.check_live();
        self.payload.read_at(offset)
    }

    /// Write a scalar into the payload (copy-on-write)
    #[track_caller]
    pub fn write<T: Scalar>(
        &mut self,
        offset: usize,
        value: T,
    ) {
        self.make_unique();
        self.payload.write_at(offset, value);
    }

    /// Resize the payload (copy-on-write)
    pub fn resize_payload(
        &mut self,
        new_size: usize,
    ) {
        self.make_unique();
        self.payload.resize(new_size);
    }
}

impl Clone for Object {
    /// Shallow copy, see [`Object::copy`]
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        self.release();
    }
}

impl PartialEq for Object {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Object::cmp(self, other) == Ordering::Equal
    }
}

impl PartialOrd for Object {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(Object::cmp(self, other))
    }
}

impl fmt::Display for Object {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.is_released() {
            return write!(f, "<released object {}>", self.identity);
        }
        f.write_str(&TypeOps::to_string(&*self.ops(), self))
    }
}

impl fmt::Debug for Object {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_id", &self.type_id)
            .field("identity", &self.identity)
            .field("refcount", &self.refcount())
            .field("payload", &self.payload)
            .finish()
    }
}

#[cfg(test)]
mod tests;
