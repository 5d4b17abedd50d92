//! Contract checks
//!
//! Programmer errors (null handles, wrong `Value` variant, cross-variant
//! comparison, bad alignment) are not recoverable conditions. They are
//! logged and asserted while checks are enabled: always in debug builds,
//! and in release builds when the `debug` feature is on.

use std::fmt;

/// Whether `contract!` checks are compiled in.
pub const CHECKS_ENABLED: bool = cfg!(any(debug_assertions, feature = "debug"));

/// Assert a runtime contract.
///
/// ```
/// objcore::contract!(1 + 1 == 2, "arithmetic is broken");
/// ```
#[macro_export]
macro_rules! contract {
    ($cond:expr, $($arg:tt)+) => {
        if $crate::util::contract::CHECKS_ENABLED && !($cond) {
            $crate::util::contract::violation(format_args!($($arg)+));
        }
    };
}

/// Report a contract violation and abort the current operation.
///
/// Used directly where no sensible value can be produced, regardless of
/// whether `contract!` checks are enabled.
#[cold]
#[track_caller]
pub fn violation(args: fmt::Arguments<'_>) -> ! {
    tracing::error!("contract violation: {}", args);
    panic!("contract violation: {}", args)
}
