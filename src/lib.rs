//! objcore: an embeddable object runtime
//!
//! Refcounted memory blocks, objects with identity and copy-on-write
//! payloads, a sign-partitioned type-dispatch registry and a tagged
//! `Value` union built on top of them.
//!
//! # Example
//!
//! ```
//! use objcore::{MemoryBlock, Object, TypeId, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::new();
//! let a = Object::new_in(&registry, TypeId::client(1), MemoryBlock::from_bytes(b"abc"));
//! let mut b = a.copy();
//! assert_eq!(a.refcount(), 2);
//!
//! b.payload_mut()[0] = b'x';
//! assert_ne!(a.identity(), b.identity());
//! assert_eq!(&*a.payload(), b"abc");
//!
//! let v = Value::new_object(&a);
//! assert_eq!(v.length(), 1);
//! ```
//!
//! # Crate Features
//!
//! - `debug`: keep contract checks in release builds

#![doc(html_root_url = "https://docs.rs/objcore")]
#![warn(rust_2018_idioms)]

pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use runtime::exception::{ErrorCode, ExceptionError, ExceptionRegistry};
pub use runtime::memory::{MemoryBlock, MemoryLayout};
pub use runtime::object::{DefaultOps, Identity, Object, TypeOps, VTable};
pub use runtime::registry::{Partition, TypeId, TypeRegistry};
pub use runtime::string::{StringHandle, STRING_TYPE};
pub use runtime::value::{Value, ValueError, ValueTag};
pub use runtime::Runtime;
pub use util::config::{ConfigError, RuntimeConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "objcore";
