//! Library string type
//!
//! `StringHandle` is an [`Object`] of type [`STRING_TYPE`] whose payload is
//! UTF-8 text. It adds no ownership rules of its own: copies are shallow,
//! `deep_clone` mints a new identity, and mutation is copy-on-write. Its
//! vtable is registered lazily the first time a string is created in a
//! registry.

use std::cell::Ref;
use std::cmp::Ordering;
use std::fmt;

use crate::runtime::memory::MemoryBlock;
use crate::runtime::object::{Identity, Object, TypeOps};
use crate::runtime::registry::{TypeId, TypeRegistry};
use crate::util::hash::hash_bytes;

/// Library type id of strings
pub const STRING_TYPE: TypeId = TypeId::library(1);

/// Dispatch table for strings
#[derive(Debug, Clone, Copy, Default)]
pub struct StringOps;

fn text(payload: &[u8]) -> &str {
    std::str::from_utf8(payload).unwrap_or("")
}

impl TypeOps for StringOps {
    /// Lexicographic by code point (UTF-8 byte order is code point order)
    fn cmp(
        &self,
        a: &Object,
        b: &Object,
    ) -> Ordering {
        text(&a.payload()).cmp(text(&b.payload()))
    }

    fn is_valid(
        &self,
        object: &Object,
    ) -> bool {
        std::str::from_utf8(&object.payload()).is_ok()
    }

    fn size(
        &self,
        object: &Object,
    ) -> usize {
        object.payload().len()
    }

    /// Number of code points
    fn length(
        &self,
        object: &Object,
    ) -> usize {
        text(&object.payload()).chars().count()
    }

    fn hash(
        &self,
        object: &Object,
    ) -> u64 {
        hash_bytes(&object.payload())
    }

    fn to_string(
        &self,
        object: &Object,
    ) -> String {
        text(&object.payload()).to_owned()
    }
}

/// Register the string vtable in `registry` unless already present
pub fn register_string_type(registry: &TypeRegistry) -> bool {
    registry.ensure_registered(STRING_TYPE, || StringOps)
}

/// Reference-counted UTF-8 string
#[derive(Clone)]
pub struct StringHandle {
    object: Object,
}

impl StringHandle {
    /// New string in the thread's default registry
    pub fn new(s: &str) -> Self {
        Self::new_in(&TypeRegistry::current(), s)
    }

    /// New string dispatching through `registry`
    pub fn new_in(
        registry: &TypeRegistry,
        s: &str,
    ) -> Self {
        register_string_type(registry);
        Self {
            object: Object::new_in(registry, STRING_TYPE, MemoryBlock::from_bytes(s.as_bytes())),
        }
    }

    /// View an existing string object as a `StringHandle`
    ///
    /// The object must have type [`STRING_TYPE`] and hold valid UTF-8.
    pub fn from_object(object: Object) -> Self {
        if object.type_id() != STRING_TYPE || std::str::from_utf8(&object.payload()).is_err() {
            crate::util::contract::violation(format_args!(
                "object {} of type {} is not a string",
                object.identity(),
                object.type_id()
            ));
        }
        Self { object }
    }

    /// Borrow the text
    pub fn as_str(&self) -> Ref<'_, str> {
        Ref::map(self.object.payload(), text)
    }

    /// Shallow copy (shared payload, refcount + 1)
    pub fn copy(&self) -> Self {
        Self {
            object: self.object.copy(),
        }
    }

    /// Independent copy with a fresh identity
    pub fn deep_clone(&self) -> Self {
        Self {
            object: self.object.deep_clone(),
        }
    }

    /// Append text (copy-on-write)
    pub fn push_str(
        &mut self,
        s: &str,
    ) {
        let old = self.object.payload().len();
        self.object.resize_payload(old + s.len());
        self.object.payload_mut()[old..].copy_from_slice(s.as_bytes());
    }

    /// Byte size of the UTF-8 text
    pub fn byte_len(&self) -> usize {
        self.object.size()
    }

    /// Number of code points
    pub fn char_len(&self) -> usize {
        self.object.length()
    }

    pub fn is_empty(&self) -> bool {
        self.object.is_empty()
    }

    pub fn cmp(
        &self,
        other: &StringHandle,
    ) -> Ordering {
        self.object.cmp(&other.object)
    }

    pub fn hash(&self) -> u64 {
        self.object.hash()
    }

    pub fn refcount(&self) -> usize {
        self.object.refcount()
    }

    pub fn identity(&self) -> Identity {
        self.object.identity()
    }

    /// Whether both handles share one payload
    pub fn ptr_eq(
        &self,
        other: &StringHandle,
    ) -> bool {
        self.object.ptr_eq(&other.object)
    }

    /// The underlying object
    pub fn as_object(&self) -> &Object {
        &self.object
    }

    pub fn into_object(self) -> Object {
        self.object
    }
}

impl From<&str> for StringHandle {
    fn from(s: &str) -> Self {
        StringHandle::new(s)
    }
}

impl PartialEq for StringHandle {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        StringHandle::cmp(self, other) == Ordering::Equal
    }
}

impl Eq for StringHandle {}

impl PartialOrd for StringHandle {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(StringHandle::cmp(self, other))
    }
}

impl Ord for StringHandle {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        StringHandle::cmp(self, other)
    }
}

impl fmt::Display for StringHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for StringHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?}", &*self.as_str())
    }
}
