//! Error-code registry
//!
//! Error codes share the type-id numbering scheme: negative codes belong to
//! the library, non-negative codes to clients. Each code maps to a message
//! and an optional handler run by [`ExceptionRegistry::raise`]. As with
//! types, the first registration of a code wins.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, error, warn};

use super::registry::partitioned::{Partition, PartitionedRegistry};

/// A library or client error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    pub const fn library(n: i64) -> Self {
        assert!(n > 0, "library error codes are numbered from 1");
        ErrorCode(-n)
    }

    pub const fn client(n: i64) -> Self {
        assert!(n >= 0, "client error codes are non-negative");
        ErrorCode(n)
    }

    pub const fn raw(&self) -> i64 {
        self.0
    }

    pub fn partition(&self) -> Partition {
        Partition::of(self.0)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Reserved library codes
///
/// Preloaded with messages by [`ExceptionRegistry::with_library_errors`] so
/// embedders can raise or look them up. The runtime's own contract
/// violations and allocation failures do not go through `raise`.
pub mod codes {
    use super::ErrorCode;

    pub const OUT_OF_MEMORY: ErrorCode = ErrorCode::library(1);
    pub const NULL_HANDLE: ErrorCode = ErrorCode::library(2);
    pub const RELEASED_OBJECT: ErrorCode = ErrorCode::library(3);
    pub const VARIANT_MISMATCH: ErrorCode = ErrorCode::library(4);
    pub const BAD_ALIGNMENT: ErrorCode = ErrorCode::library(5);
    pub const OUT_OF_RANGE: ErrorCode = ErrorCode::library(6);
    pub const NOT_A_STRING: ErrorCode = ErrorCode::library(7);
}

const LIBRARY_ERRORS: &[(ErrorCode, &str)] = &[
    (codes::OUT_OF_MEMORY, "out of memory"),
    (codes::NULL_HANDLE, "use of a null memory block"),
    (codes::RELEASED_OBJECT, "use of a released object"),
    (codes::VARIANT_MISMATCH, "value accessed as the wrong variant"),
    (codes::BAD_ALIGNMENT, "alignment is not a power of two"),
    (codes::OUT_OF_RANGE, "access outside a memory block"),
    (codes::NOT_A_STRING, "object is not a string"),
];

/// Handler invoked when a code is raised
pub type ErrorHandler = Rc<dyn Fn(ErrorCode, &str)>;

#[derive(Clone)]
struct ErrorEntry {
    message: String,
    handler: Option<ErrorHandler>,
}

/// Raise failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExceptionError {
    #[error("Unknown error code: {0}")]
    UnknownCode(ErrorCode),
}

/// Shared handle to an error-code table
#[derive(Clone)]
pub struct ExceptionRegistry {
    table: Rc<RefCell<PartitionedRegistry<ErrorEntry>>>,
}

impl ExceptionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            table: Rc::new(RefCell::new(PartitionedRegistry::new())),
        }
    }

    /// Registry preloaded with the library codes in [`codes`]
    pub fn with_library_errors() -> Self {
        let registry = Self::new();
        for &(code, message) in LIBRARY_ERRORS {
            registry.insert(code, message, None);
        }
        registry
    }

    /// Register a code with no handler
    pub fn register(
        &self,
        code: ErrorCode,
        message: &str,
    ) -> bool {
        self.insert(code, message, None)
    }

    /// Register a code with a handler
    pub fn register_with_handler<F>(
        &self,
        code: ErrorCode,
        message: &str,
        handler: F,
    ) -> bool
    where
        F: Fn(ErrorCode, &str) + 'static,
    {
        self.insert(code, message, Some(Rc::new(handler)))
    }

    fn insert(
        &self,
        code: ErrorCode,
        message: &str,
        handler: Option<ErrorHandler>,
    ) -> bool {
        let entry = ErrorEntry {
            message: message.to_owned(),
            handler,
        };
        let first = self.table.borrow_mut().insert(code.0, entry);
        if first {
            debug!(code = code.0, text = message, "registered error code");
        } else {
            warn!(code = code.0, "error code already registered, keeping the first entry");
        }
        first
    }

    /// Message registered for `code`
    pub fn message(
        &self,
        code: ErrorCode,
    ) -> Option<String> {
        self.table.borrow().get(code.0).map(|e| e.message.clone())
    }

    pub fn is_registered(
        &self,
        code: ErrorCode,
    ) -> bool {
        self.table.borrow().contains(code.0)
    }

    /// Log `code` and run its handler
    pub fn raise(
        &self,
        code: ErrorCode,
    ) -> Result<(), ExceptionError> {
        // Clone out so the handler may register further codes.
        let entry = self
            .table
            .borrow()
            .get(code.0)
            .cloned()
            .ok_or(ExceptionError::UnknownCode(code))?;
        error!(code = code.0, text = %entry.message, "error raised");
        if let Some(handler) = entry.handler {
            handler(code, &entry.message);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    pub fn partition_len(
        &self,
        partition: Partition,
    ) -> usize {
        self.table.borrow().partition_len(partition)
    }
}

impl Default for ExceptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExceptionRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ExceptionRegistry")
            .field("library", &self.partition_len(Partition::Library))
            .field("client", &self.partition_len(Partition::Client))
            .finish()
    }
}
