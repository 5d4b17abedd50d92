//! Tagged value over scalars and handles

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::contract;
use crate::runtime::object::Object;
use crate::runtime::registry::TypeRegistry;
use crate::runtime::string::StringHandle;
use crate::util::config::DEFAULT_FLOAT_EPSILON;
use crate::util::contract::violation;
use crate::util::hash::mix64;

/// Which variant a [`Value`] holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueTag {
    Int,
    UInt,
    Float,
    Str,
    Obj,
}

impl ValueTag {
    pub fn name(&self) -> &'static str {
        match self {
            ValueTag::Int => "int",
            ValueTag::UInt => "uint",
            ValueTag::Float => "float",
            ValueTag::Str => "string",
            ValueTag::Obj => "object",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checked accessor failure
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("Variant mismatch: expected {expected}, found {found}")]
    VariantMismatch { expected: ValueTag, found: ValueTag },
}

/// Runtime value
///
/// Numeric variants are copied by value. `Str` and `Obj` hold a refcounted
/// handle, so cloning a `Value` is a shallow copy of that handle.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(StringHandle),
    Obj(Object),
}

impl Value {
    pub fn new_int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn new_uint(n: u64) -> Self {
        Value::UInt(n)
    }

    pub fn new_float(x: f64) -> Self {
        Value::Float(x)
    }

    /// String value sharing `s`'s payload
    pub fn new_string(s: &StringHandle) -> Self {
        Value::Str(s.copy())
    }

    /// String value built from text in the default registry
    pub fn new_str(s: &str) -> Self {
        Value::Str(StringHandle::new(s))
    }

    /// String value built from text in `registry`
    pub fn new_str_in(
        registry: &TypeRegistry,
        s: &str,
    ) -> Self {
        Value::Str(StringHandle::new_in(registry, s))
    }

    /// Object value sharing `object`'s payload
    pub fn new_object(object: &Object) -> Self {
        Value::Obj(object.copy())
    }

    /// Shallow copy
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Copy whose handle payloads are independent
    pub fn deep_clone(&self) -> Self {
        match self {
            Value::Str(s) => Value::Str(s.deep_clone()),
            Value::Obj(o) => Value::Obj(o.deep_clone()),
            other => other.clone(),
        }
    }

    pub fn type_tag(&self) -> ValueTag {
        match self {
            Value::Int(_) => ValueTag::Int,
            Value::UInt(_) => ValueTag::UInt,
            Value::Float(_) => ValueTag::Float,
            Value::Str(_) => ValueTag::Str,
            Value::Obj(_) => ValueTag::Obj,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_) | Value::Float(_))
    }
}

// Accessors. `as_*` treat a wrong variant as a programming error; `to_*`
// and `try_as_*` let callers probe.
impl Value {
    #[cold]
    #[track_caller]
    fn mismatch(
        &self,
        expected: ValueTag,
    ) -> ! {
        violation(format_args!(
            "value accessed as {}, but holds {}",
            expected,
            self.type_tag()
        ))
    }

    #[track_caller]
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            _ => self.mismatch(ValueTag::Int),
        }
    }

    #[track_caller]
    pub fn as_uint(&self) -> u64 {
        match self {
            Value::UInt(n) => *n,
            _ => self.mismatch(ValueTag::UInt),
        }
    }

    #[track_caller]
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Float(x) => *x,
            _ => self.mismatch(ValueTag::Float),
        }
    }

    #[track_caller]
    pub fn as_string(&self) -> &StringHandle {
        match self {
            Value::Str(s) => s,
            _ => self.mismatch(ValueTag::Str),
        }
    }

    #[track_caller]
    pub fn as_object(&self) -> &Object {
        match self {
            Value::Obj(o) => o,
            _ => self.mismatch(ValueTag::Obj),
        }
    }

    pub fn to_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn to_string_handle(&self) -> Option<&StringHandle> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_object(&self) -> Option<&Object> {
        match self {
            Value::Obj(o) => Some(o),
            _ => None,
        }
    }

    fn expect_tag(
        &self,
        expected: ValueTag,
    ) -> Result<(), ValueError> {
        let found = self.type_tag();
        if found == expected {
            Ok(())
        } else {
            Err(ValueError::VariantMismatch { expected, found })
        }
    }

    pub fn try_as_int(&self) -> Result<i64, ValueError> {
        self.expect_tag(ValueTag::Int)?;
        Ok(self.as_int())
    }

    pub fn try_as_uint(&self) -> Result<u64, ValueError> {
        self.expect_tag(ValueTag::UInt)?;
        Ok(self.as_uint())
    }

    pub fn try_as_float(&self) -> Result<f64, ValueError> {
        self.expect_tag(ValueTag::Float)?;
        Ok(self.as_float())
    }

    pub fn try_as_string(&self) -> Result<&StringHandle, ValueError> {
        self.expect_tag(ValueTag::Str)?;
        Ok(self.as_string())
    }

    pub fn try_as_object(&self) -> Result<&Object, ValueError> {
        self.expect_tag(ValueTag::Obj)?;
        Ok(self.as_object())
    }
}

/// Tolerant float ordering
///
/// `a` and `b` are equal when `|a - b| <= epsilon * max(|a|, |b|)`; outside
/// that band they order numerically. Every NaN, whatever its sign, orders
/// after every number and equal to any other NaN.
pub fn float_cmp(
    a: f64,
    b: f64,
    epsilon: f64,
) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    if a == b || (a - b).abs() <= epsilon * a.abs().max(b.abs()) {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

impl Value {
    /// Compare two values of the same variant
    ///
    /// Floats compare with [`DEFAULT_FLOAT_EPSILON`].
    pub fn cmp(
        &self,
        other: &Value,
    ) -> Ordering {
        self.cmp_with_epsilon(other, DEFAULT_FLOAT_EPSILON)
    }

    /// Compare with an explicit float tolerance
    pub fn cmp_with_epsilon(
        &self,
        other: &Value,
        epsilon: f64,
    ) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::UInt(a), Value::UInt(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => float_cmp(*a, *b, epsilon),
            (Value::Str(a), Value::Str(b)) => StringHandle::cmp(a, b),
            (Value::Obj(a), Value::Obj(b)) => a.cmp(b),
            _ => {
                contract!(
                    false,
                    "cannot compare a {} value with a {} value",
                    self.type_tag(),
                    other.type_tag()
                );
                self.type_tag().cmp(&other.type_tag())
            }
        }
    }

    pub fn lt(
        &self,
        other: &Value,
    ) -> bool {
        self.cmp(other) == Ordering::Less
    }

    pub fn eq(
        &self,
        other: &Value,
    ) -> bool {
        self.cmp(other) == Ordering::Equal
    }

    pub fn gt(
        &self,
        other: &Value,
    ) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    /// 1 for scalars, code points for strings, dispatched for objects
    pub fn length(&self) -> usize {
        match self {
            Value::Int(_) | Value::UInt(_) | Value::Float(_) => 1,
            Value::Str(s) => s.char_len(),
            Value::Obj(o) => o.length(),
        }
    }

    /// Byte size of the stored representation
    pub fn size(&self) -> usize {
        match self {
            Value::Int(_) => std::mem::size_of::<i64>(),
            Value::UInt(_) => std::mem::size_of::<u64>(),
            Value::Float(_) => std::mem::size_of::<f64>(),
            Value::Str(s) => s.byte_len(),
            Value::Obj(o) => o.size(),
        }
    }

    /// Variant-aware hash
    ///
    /// Floats are hashed by bit pattern with `-0.0` folded into `0.0` and
    /// every NaN folded into one, so values that are equal only within
    /// tolerance may hash apart.
    pub fn hash(&self) -> u64 {
        match self {
            Value::Int(n) => mix64(*n as u64),
            Value::UInt(n) => mix64(*n),
            Value::Float(x) => {
                let x = if *x == 0.0 {
                    0.0
                } else if x.is_nan() {
                    f64::NAN
                } else {
                    *x
                };
                mix64(x.to_bits())
            }
            Value::Str(s) => s.hash(),
            Value::Obj(o) => o.hash(),
        }
    }
}

impl PartialEq for Value {
    /// Values of different variants are never equal
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.type_tag() == other.type_tag() && Value::cmp(self, other) == Ordering::Equal
    }
}

impl PartialOrd for Value {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        if self.type_tag() == other.type_tag() {
            Some(Value::cmp(self, other))
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Obj(o) => write!(f, "{}", o),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new_str(s)
    }
}

impl From<StringHandle> for Value {
    fn from(s: StringHandle) -> Self {
        Value::Str(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Obj(o)
    }
}
