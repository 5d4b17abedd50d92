//! Type dispatch registry
//!
//! Maps a [`TypeId`] to the [`TypeOps`] registered for it. Storage is a
//! [`PartitionedRegistry`]: library ids (negative) and client ids
//! (non-negative) live in separate fixed-bucket tables, and the first
//! registration for an id wins.
//!
//! A `TypeRegistry` is a cheap, clonable handle to shared, single-threaded
//! state. Objects keep the handle they were created with, so dropping a
//! registry (or calling [`shutdown`]) never invalidates live objects.
//!
//! Each thread has a default registry used by `Object::new`, created by
//! [`init`] (or lazily on first use) and torn down by [`shutdown`]. Code
//! that wants isolation, such as parallel tests, creates its own with
//! [`TypeRegistry::new`] and uses `Object::new_in`.

pub mod partitioned;

pub use partitioned::{Partition, PartitionedRegistry, BUCKET_COUNT};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::runtime::object::{DefaultOps, TypeOps, VTable};

/// Numeric type id
///
/// Negative ids are reserved for the library, non-negative ids for client
/// code. Prefer the [`TypeId::library`] and [`TypeId::client`] constructors
/// over building raw ids by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub i64);

impl TypeId {
    /// The `n`th library type id (`n > 0`), stored as `-n`
    pub const fn library(n: i64) -> Self {
        assert!(n > 0, "library type ids are numbered from 1");
        TypeId(-n)
    }

    /// A client type id (`n >= 0`)
    pub const fn client(n: i64) -> Self {
        assert!(n >= 0, "client type ids are non-negative");
        TypeId(n)
    }

    /// Raw id
    pub const fn raw(&self) -> i64 {
        self.0
    }

    /// Namespace this id belongs to
    pub fn partition(&self) -> Partition {
        Partition::of(self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TypeId {
    fn from(raw: i64) -> Self {
        TypeId(raw)
    }
}

type OpsTable = PartitionedRegistry<Rc<dyn TypeOps>>;

/// Handle to a type dispatch table
#[derive(Clone)]
pub struct TypeRegistry {
    table: Rc<RefCell<OpsTable>>,
    fallback: Rc<dyn TypeOps>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            table: Rc::new(RefCell::new(PartitionedRegistry::new())),
            fallback: Rc::new(DefaultOps),
        }
    }

    /// The calling thread's default registry, created on first use
    pub fn current() -> Self {
        init()
    }

    /// Register `ops` for `type_id`
    ///
    /// Returns `true` if this is the first registration. A repeated
    /// registration is stored but never returned by lookups.
    pub fn register<T: TypeOps + 'static>(
        &self,
        type_id: TypeId,
        ops: T,
    ) -> bool {
        self.register_rc(type_id, Rc::new(ops))
    }

    /// Register a shared `ops` instance for `type_id`
    pub fn register_rc(
        &self,
        type_id: TypeId,
        ops: Rc<dyn TypeOps>,
    ) -> bool {
        let first = self.table.borrow_mut().insert(type_id.raw(), ops);
        if first {
            debug!(type_id = %type_id, partition = %type_id.partition(), "type registered");
        } else {
            warn!(type_id = %type_id, "type already registered, keeping the first registration");
        }
        first
    }

    /// Register a function-pointer fragment, filling unset entries with defaults
    pub fn register_vtable(
        &self,
        type_id: TypeId,
        vtable: VTable,
    ) -> bool {
        self.register(type_id, vtable.complete())
    }

    /// Register `type_id` with `make()` unless something is already registered
    ///
    /// Used for lazy, once-only registration on a type's first use. Returns
    /// whether a registration happened.
    pub fn ensure_registered<T, F>(
        &self,
        type_id: TypeId,
        make: F,
    ) -> bool
    where
        T: TypeOps + 'static,
        F: FnOnce() -> T,
    {
        if self.is_registered(type_id) {
            return false;
        }
        self.register(type_id, make())
    }

    /// The first ops registered for `type_id`
    pub fn lookup(
        &self,
        type_id: TypeId,
    ) -> Option<Rc<dyn TypeOps>> {
        self.table.borrow().get(type_id.raw()).cloned()
    }

    /// The registered ops, or the generic defaults for unknown ids
    pub fn lookup_or_default(
        &self,
        type_id: TypeId,
    ) -> Rc<dyn TypeOps> {
        match self.lookup(type_id) {
            Some(ops) => ops,
            None => {
                trace!(type_id = %type_id, "dispatch on unregistered type, using defaults");
                Rc::clone(&self.fallback)
            }
        }
    }

    /// Whether `type_id` has a registration
    pub fn is_registered(
        &self,
        type_id: TypeId,
    ) -> bool {
        self.table.borrow().contains(type_id.raw())
    }

    /// Number of stored registrations, shadowed duplicates included
    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored registrations in one partition
    pub fn partition_len(
        &self,
        partition: Partition,
    ) -> usize {
        self.table.borrow().partition_len(partition)
    }

    /// Buckets per partition
    pub fn bucket_count(&self) -> usize {
        BUCKET_COUNT
    }

    /// Whether both handles refer to the same registry
    pub fn ptr_eq(
        &self,
        other: &TypeRegistry,
    ) -> bool {
        Rc::ptr_eq(&self.table, &other.table)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("TypeRegistry")
            .field(&*self.table.borrow())
            .finish()
    }
}

thread_local! {
    static DEFAULT_REGISTRY: RefCell<Option<TypeRegistry>> = const { RefCell::new(None) };
}

/// Create the thread's default registry if needed and return it
pub fn init() -> TypeRegistry {
    DEFAULT_REGISTRY.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| {
                debug!("type registry initialised");
                TypeRegistry::new()
            })
            .clone()
    })
}

/// Tear down the thread's default registry
///
/// Objects created earlier keep their own handle and stay usable. The next
/// `init()` (or `Object::new`) starts from an empty registry.
pub fn shutdown() {
    let old = DEFAULT_REGISTRY.with(|slot| slot.borrow_mut().take());
    if old.is_some() {
        debug!("type registry shut down");
    }
}

#[cfg(test)]
mod tests;
