//! TypeRegistry 单元测试
//!
//! 测试分区隔离、首次注册优先、默认回退与线程默认注册表的生命周期

use crate::runtime::memory::MemoryBlock;
use crate::runtime::object::{Object, TypeOps, VTable};
use crate::runtime::registry::{self, Partition, TypeId, TypeRegistry};

fn length_five(_: &Object) -> usize {
    5
}

fn length_seven(_: &Object) -> usize {
    7
}

struct Named(&'static str);

impl TypeOps for Named {
    fn to_string(
        &self,
        _object: &Object,
    ) -> String {
        self.0.to_string()
    }
}

#[cfg(test)]
mod type_id_tests {
    use super::*;

    #[test]
    fn test_type_id_constructors() {
        assert_eq!(TypeId::library(1), TypeId(-1));
        assert_eq!(TypeId::client(0), TypeId(0));
        assert_eq!(TypeId::library(3).partition(), Partition::Library);
        assert_eq!(TypeId::client(3).partition(), Partition::Client);
        assert_eq!(TypeId::from(-9).raw(), -9);
        assert_eq!(TypeId(-4).to_string(), "-4");
    }

    #[test]
    #[should_panic(expected = "numbered from 1")]
    fn test_type_id_library_zero() {
        let _ = TypeId::library(0);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn test_type_id_client_negative() {
        let _ = TypeId::client(-1);
    }
}

#[cfg(test)]
mod registration_tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let reg = TypeRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.register(TypeId(10), Named("ten")));
        assert!(reg.is_registered(TypeId(10)));
        assert!(!reg.is_registered(TypeId(11)));
        assert!(reg.lookup(TypeId(11)).is_none());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.bucket_count(), usize::BITS as usize);

        let obj = Object::new_in(&reg, TypeId(10), MemoryBlock::new(1));
        assert_eq!(obj.to_string(), "ten");
    }

    #[test]
    fn test_partition_isolation() {
        let reg = TypeRegistry::new();
        reg.register_vtable(TypeId(-5), VTable::new().with_length(length_five));
        reg.register_vtable(TypeId(5), VTable::new().with_length(length_seven));

        let lib = Object::new_in(&reg, TypeId(-5), MemoryBlock::new(1));
        let client = Object::new_in(&reg, TypeId(5), MemoryBlock::new(1));
        assert_eq!(lib.length(), 5);
        assert_eq!(client.length(), 7);
        assert_eq!(reg.partition_len(Partition::Library), 1);
        assert_eq!(reg.partition_len(Partition::Client), 1);
    }

    #[test]
    fn test_partition_isolation_one_side_only() {
        let reg = TypeRegistry::new();
        reg.register_vtable(TypeId(-5), VTable::new().with_length(length_five));

        // the client id with the same magnitude stays unregistered
        assert!(!reg.is_registered(TypeId(5)));
        let client = Object::new_in(&reg, TypeId(5), MemoryBlock::new(1));
        assert_eq!(client.length(), 1);
    }

    #[test]
    fn test_first_registration_wins() {
        let reg = TypeRegistry::new();
        assert!(reg.register_vtable(TypeId(7), VTable::new().with_length(length_five)));
        assert!(!reg.register_vtable(TypeId(7), VTable::new().with_length(length_seven)));

        let obj = Object::new_in(&reg, TypeId(7), MemoryBlock::new(1));
        assert_eq!(obj.length(), 5);
        // the shadowed registration is still stored
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_ensure_registered_once() {
        let reg = TypeRegistry::new();
        let mut calls = 0;
        assert!(reg.ensure_registered(TypeId(-2), || {
            calls += 1;
            Named("lazy")
        }));
        assert!(!reg.ensure_registered(TypeId(-2), || {
            calls += 1;
            Named("again")
        }));
        assert_eq!(calls, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_register_vtable_is_completed() {
        let reg = TypeRegistry::new();
        reg.register_vtable(TypeId(3), VTable::new());
        let obj = Object::new_in(&reg, TypeId(3), MemoryBlock::from_bytes(b"abc"));
        assert_eq!(obj.length(), 1);
        assert_eq!(obj.size(), 3);
        assert!(obj.is_valid());
    }

    #[test]
    fn test_handles_share_state() {
        let reg = TypeRegistry::new();
        let other = reg.clone();
        other.register(TypeId(1), Named("shared"));
        assert!(reg.is_registered(TypeId(1)));
        assert!(reg.ptr_eq(&other));
        assert!(!reg.ptr_eq(&TypeRegistry::new()));
    }

    #[test]
    fn test_registry_debug() {
        let reg = TypeRegistry::new();
        assert!(format!("{:?}", reg).contains("TypeRegistry"));
    }
}

#[cfg(test)]
mod default_registry_tests {
    use super::*;

    #[test]
    fn test_init_returns_same_registry() {
        let a = registry::init();
        let b = TypeRegistry::current();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_shutdown_starts_fresh() {
        let before = registry::init();
        before.register(TypeId(42), Named("before"));
        let obj = Object::from_bytes(TypeId(42), &[1]);

        registry::shutdown();
        let after = registry::init();
        assert!(!after.ptr_eq(&before));
        assert!(!after.is_registered(TypeId(42)));

        // objects keep dispatching through the registry they were built with
        assert_eq!(obj.to_string(), "before");
        registry::shutdown();
    }

    #[test]
    fn test_shutdown_twice_is_harmless() {
        registry::shutdown();
        registry::shutdown();
        assert!(registry::init().is_empty());
    }
}
