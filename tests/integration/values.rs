//! Value integration tests

use std::cmp::Ordering;
use std::panic;

use objcore::{MemoryBlock, Runtime, RuntimeConfig, TypeId, Value, ValueTag};

#[test]
fn test_int_round_trip() {
    for n in [i64::MIN, -1, 0, 1, i64::MAX] {
        assert_eq!(Value::new_int(n).as_int(), n);
    }
    assert_eq!(Value::new_int(-1).cmp(&Value::new_int(1)), Ordering::Less);
}

#[test]
fn test_as_string_on_int_panics() {
    let result = panic::catch_unwind(|| {
        let v = Value::new_int(1);
        v.as_string().char_len()
    });
    assert!(result.is_err());
}

#[test]
fn test_float_tolerance() {
    let eps = objcore::util::config::DEFAULT_FLOAT_EPSILON;
    assert!(Value::new_float(1.0).eq(&Value::new_float(1.0 + eps / 2.0)));
    assert!(!Value::new_float(1.0).eq(&Value::new_float(1.1)));
}

#[test]
fn test_heterogeneous_slots() {
    let rt = Runtime::isolated(RuntimeConfig::default());
    let obj = rt.new_object(TypeId(77), MemoryBlock::from_bytes(b"raw"));
    let slots = vec![
        Value::from(-3i64),
        Value::from(3u64),
        Value::from(0.25),
        Value::from(rt.new_string("ünï")),
        Value::new_object(&obj),
    ];

    let tags: Vec<ValueTag> = slots.iter().map(Value::type_tag).collect();
    assert_eq!(
        tags,
        [ValueTag::Int, ValueTag::UInt, ValueTag::Float, ValueTag::Str, ValueTag::Obj]
    );
    let lengths: Vec<usize> = slots.iter().map(Value::length).collect();
    assert_eq!(lengths, [1, 1, 1, 3, 1]);
    assert_eq!(slots[3].size(), 5);
    assert_eq!(slots[4].size(), 3);
    assert_eq!(slots[3].to_string(), "ünï");
    assert_eq!(obj.refcount(), 2);

    drop(slots);
    assert_eq!(obj.refcount(), 1);
}
