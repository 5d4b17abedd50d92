//! Tagged runtime values
//!
//! [`Value`] is the uniform slot type: a signed or unsigned integer, a
//! float, a string handle or an object handle, with compare, hash, length,
//! size and stringify operations that work whatever the variant.

pub mod runtime_value;
pub use runtime_value::*;

#[cfg(test)]
mod tests;
