//! Utility types and functions

pub mod config;
pub mod contract;
pub mod hash;
pub mod logger;
