//! Object runtime
//!
//! Layers, bottom up:
//!
//! - [`memory`]: refcounted, zero-initialised byte blocks
//! - [`registry`]: type id to dispatch table, split by sign
//! - [`object`]: typed identity over a block, with copy-on-write
//! - [`string`]: the library string type, built on objects
//! - [`exception`]: error codes sharing the registry layout
//! - [`value`]: tagged union over scalars, strings and objects
//!
//! Everything here is single-threaded. Handles are `!Send`, so the
//! compiler keeps a block, object or registry on the thread that made it.

pub mod exception;
pub mod memory;
pub mod object;
pub mod registry;
pub mod string;
pub mod value;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use crate::util::config::RuntimeConfig;
use crate::util::logger;

use self::exception::ExceptionRegistry;
use self::memory::MemoryBlock;
use self::object::Object;
use self::registry::{TypeId, TypeRegistry};
use self::string::StringHandle;
use self::value::Value;

thread_local! {
    static DEFAULT_LEASE: RefCell<Weak<DefaultLease>> = const { RefCell::new(Weak::new()) };
}

/// Shared claim on the thread's default registry
///
/// Every runtime built by [`Runtime::init`] on a thread, and every clone of
/// one, holds the same lease. The default registry is torn down only when
/// the last holder shuts down.
#[derive(Debug)]
struct DefaultLease;

fn acquire_default_lease() -> Rc<DefaultLease> {
    DEFAULT_LEASE.with(|slot| {
        let existing = slot.borrow().upgrade();
        existing.unwrap_or_else(|| {
            let lease = Rc::new(DefaultLease);
            *slot.borrow_mut() = Rc::downgrade(&lease);
            lease
        })
    })
}

/// A configured runtime: type registry, error codes and settings
#[derive(Debug, Clone)]
pub struct Runtime {
    config: RuntimeConfig,
    types: TypeRegistry,
    exceptions: ExceptionRegistry,
    default_lease: Option<Rc<DefaultLease>>,
}

impl Runtime {
    /// Initialise the runtime on the thread's default registry
    pub fn init(config: RuntimeConfig) -> Self {
        let lease = acquire_default_lease();
        Self::build(config, registry::init(), Some(lease))
    }

    /// Runtime with a private registry, leaving the thread default alone
    pub fn isolated(config: RuntimeConfig) -> Self {
        Self::build(config, TypeRegistry::new(), None)
    }

    fn build(
        config: RuntimeConfig,
        types: TypeRegistry,
        default_lease: Option<Rc<DefaultLease>>,
    ) -> Self {
        if config.install_logger {
            logger::init_with_level(config.log_level);
        }
        if config.register_builtin_types {
            string::register_string_type(&types);
        }
        let exceptions = ExceptionRegistry::with_library_errors();
        info!(
            types = types.len(),
            errors = exceptions.len(),
            float_epsilon = config.float_epsilon,
            "runtime initialised"
        );
        Self {
            config,
            types,
            exceptions,
            default_lease,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn exceptions(&self) -> &ExceptionRegistry {
        &self.exceptions
    }

    /// New object dispatching through this runtime's registry
    pub fn new_object(
        &self,
        type_id: TypeId,
        payload: MemoryBlock,
    ) -> Object {
        Object::new_in(&self.types, type_id, payload)
    }

    pub fn new_string(
        &self,
        s: &str,
    ) -> StringHandle {
        StringHandle::new_in(&self.types, s)
    }

    /// Compare using the configured float tolerance
    pub fn compare(
        &self,
        a: &Value,
        b: &Value,
    ) -> Ordering {
        a.cmp_with_epsilon(b, self.config.float_epsilon)
    }

    pub fn values_equal(
        &self,
        a: &Value,
        b: &Value,
    ) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// Tear down this runtime
    ///
    /// A runtime on the thread default registry resets that default only
    /// when no other runtime (or clone) from [`Runtime::init`] is still
    /// alive on the thread.
    pub fn shutdown(self) {
        if let Some(lease) = self.default_lease {
            if Rc::strong_count(&lease) == 1 {
                registry::shutdown();
            } else {
                debug!("default registry still held by another runtime");
            }
        }
        info!("runtime shut down");
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::init(RuntimeConfig::default())
    }
}
