//! Value 单元测试


use crate::runtime::registry::TypeRegistry;
use crate::runtime::value::{Value, ValueTag};
