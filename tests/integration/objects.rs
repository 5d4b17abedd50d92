//! Object integration tests
//!
//! Default dispatch, copy-on-write, and a client type with its own vtable.

use std::cmp::Ordering;

use objcore::{MemoryBlock, Object, TypeId, TypeOps, TypeRegistry};

/// A point payload: two little-endian i32 coordinates
struct PointOps;

const POINT: TypeId = TypeId::client(12);

fn coords(o: &Object) -> (i32, i32) {
    (o.read::<i32>(0), o.read::<i32>(4))
}

impl TypeOps for PointOps {
    fn cmp(
        &self,
        a: &Object,
        b: &Object,
    ) -> Ordering {
        coords(a).cmp(&coords(b))
    }

    fn length(
        &self,
        _object: &Object,
    ) -> usize {
        2
    }

    fn to_string(
        &self,
        object: &Object,
    ) -> String {
        let (x, y) = coords(object);
        format!("({}, {})", x, y)
    }
}

fn point(
    reg: &TypeRegistry,
    x: i32,
    y: i32,
) -> Object {
    let mut p = Object::new_in(reg, POINT, MemoryBlock::new(8));
    p.write::<i32>(0, x);
    p.write::<i32>(4, y);
    p
}

#[test]
fn test_unregistered_defaults() {
    let reg = TypeRegistry::new();
    let obj = Object::new_in(&reg, TypeId(4242), MemoryBlock::from_bytes(b"?"));
    assert_eq!(obj.length(), 1);
    let text = obj.to_string();
    assert!(text.contains("4242"));
    assert!(text.contains(&obj.identity().to_string()));
}

#[test]
fn test_client_type_dispatch() {
    let reg = TypeRegistry::new();
    reg.register(POINT, PointOps);

    let a = point(&reg, 1, -2);
    let b = point(&reg, 1, 5);
    assert_eq!(a.to_string(), "(1, -2)");
    assert_eq!(a.length(), 2);
    assert!(a < b);
    // size falls back to the payload size
    assert_eq!(a.size(), 8);
}

#[test]
fn test_copy_on_write() {
    let reg = TypeRegistry::new();
    let a = Object::new_in(&reg, TypeId(3), MemoryBlock::from_bytes(&[1, 2, 3]));
    let mut b = a.copy();
    assert_eq!(a.refcount(), 2);
    assert_eq!(b.refcount(), 2);
    assert_eq!(a.as_ptr(), b.as_ptr());

    let (a_ptr, a_id) = (a.as_ptr(), a.identity());
    b.payload_mut()[1] = 0;

    assert_ne!(b.as_ptr(), a_ptr);
    assert_ne!(b.identity(), a_id);
    assert_eq!(a.as_ptr(), a_ptr);
    assert_eq!(a.identity(), a_id);
    assert_eq!(a.refcount(), 1);
    assert_eq!(&*a.payload(), &[1, 2, 3]);
}

#[test]
fn test_cow_keeps_client_type() {
    let reg = TypeRegistry::new();
    reg.register(POINT, PointOps);
    let a = point(&reg, 3, 4);
    let mut b = a.copy();
    b.write::<i32>(0, 30);
    assert_eq!(a.to_string(), "(3, 4)");
    assert_eq!(b.to_string(), "(30, 4)");
    assert_eq!(b.type_id(), POINT);
}
