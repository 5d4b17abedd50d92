//! MemoryBlock 单元测试
//!
//! 测试引用计数内存块的分配、浅拷贝、深拷贝与释放

use crate::runtime::memory::{MemoryBlock, DEFAULT_ALIGNMENT};
use std::cmp::Ordering;

#[cfg(test)]
mod block_lifecycle_tests {
    use super::*;

    #[test]
    fn test_block_new() {
        let block = MemoryBlock::new(100);
        assert_eq!(block.size(), 100);
        assert_eq!(block.refcount(), 1);
        assert!(!block.is_null());
        assert!(block.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_block_zero_length() {
        let a = MemoryBlock::new(0);
        let b = MemoryBlock::new(0);
        assert_eq!(a.size(), 0);
        assert_eq!(a.refcount(), 1);
        assert!(!a.as_ptr().is_null());
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert!(a.total_size() >= a.size());
    }

    #[test]
    fn test_block_default_alignment() {
        let block = MemoryBlock::new(3);
        assert_eq!(block.alignment(), DEFAULT_ALIGNMENT);
        assert!(block.is_aligned(DEFAULT_ALIGNMENT));
        assert!(!block.is_aligned(0));
    }

    #[test]
    fn test_block_new_aligned() {
        let block = MemoryBlock::new_aligned(10, 256);
        assert_eq!(block.size(), 10);
        assert_eq!(block.alignment(), 256);
        assert!(block.is_aligned(256));
        assert!(block.total_size() >= 256);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_block_bad_alignment() {
        let _ = MemoryBlock::new_aligned(10, 3);
    }

    #[test]
    fn test_block_copy_is_alias() {
        let a = MemoryBlock::new(16);
        let b = a.copy();

        assert_eq!(a.as_ptr(), b.as_ptr());
        assert!(a.ptr_eq(&b));
        assert_eq!(a.refcount(), 2);
        assert_eq!(b.refcount(), 2);

        // writes are shared between aliases
        b.write_at::<u32>(0, 7);
        assert_eq!(a.read_at::<u32>(0), 7);
    }

    #[test]
    fn test_block_clone_trait_is_shallow() {
        let a = MemoryBlock::new(4);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.refcount(), 2);
    }

    #[test]
    fn test_block_deep_clone() {
        let a = MemoryBlock::from_bytes(b"payload");
        let b = a.deep_clone();

        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(a.refcount(), 1);
        assert_eq!(b.refcount(), 1);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(b.alignment(), a.alignment());

        // independent from here on
        b.bytes_mut()[0] = b'P';
        assert_eq!(&*a.bytes(), b"payload");
        assert_eq!(&*b.bytes(), b"Payload");
    }

    #[test]
    fn test_block_deep_clone_aligned() {
        let a = MemoryBlock::from_bytes(&[1, 2, 3]);
        let b = a.deep_clone_aligned(64);
        assert!(b.is_aligned(64));
        assert_eq!(&*b.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_block_release() {
        let mut a = MemoryBlock::new(8);
        let mut b = a.copy();
        assert_eq!(a.refcount(), 2);

        b.release();
        assert!(b.is_null());
        assert_eq!(b.refcount(), 0);
        assert_eq!(a.refcount(), 1);

        a.release();
        assert!(a.is_null());
        assert!(a.as_ptr().is_null());

        // releasing a null handle is a no-op
        a.release();
        assert!(a.is_null());
    }

    #[test]
    #[should_panic(expected = "null memory block")]
    fn test_block_null_use() {
        let block = MemoryBlock::null();
        let _ = block.size();
    }
}

#[cfg(test)]
mod block_resize_tests {
    use super::*;

    #[test]
    fn test_block_grow_preserves_prefix() {
        let mut block = MemoryBlock::from_bytes(&[1, 2, 3, 4]);
        block.resize(100);
        assert_eq!(block.size(), 100);
        assert_eq!(&block.bytes()[..4], &[1, 2, 3, 4]);
        assert!(block.bytes()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_block_shrink_preserves_prefix() {
        let mut block = MemoryBlock::from_bytes(b"abcdefgh");
        block.resize(3);
        assert_eq!(&*block.bytes(), b"abc");
    }

    #[test]
    fn test_block_regrow_within_capacity_is_zeroed() {
        let mut block = MemoryBlock::from_bytes(&[9; 16]);
        block.resize(4);
        block.resize(16);
        assert_eq!(&block.bytes()[..4], &[9; 4]);
        assert!(block.bytes()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_block_resize_aligned() {
        let mut block = MemoryBlock::from_bytes(&[5, 6, 7]);
        block.resize_aligned(40, 128);
        assert!(block.is_aligned(128));
        assert_eq!(block.alignment(), 128);
        assert_eq!(&block.bytes()[..3], &[5, 6, 7]);
    }

    #[test]
    fn test_block_resize_visible_to_aliases() {
        let mut a = MemoryBlock::new(4);
        let b = a.copy();
        a.resize(32);
        assert_eq!(b.size(), 32);
        assert_eq!(a.as_ptr(), b.as_ptr());
    }
}

#[cfg(test)]
mod block_compare_tests {
    use super::*;

    #[test]
    fn test_block_cmp_first_difference_decides() {
        let a = MemoryBlock::from_bytes(&[1, 2, 3]);
        let b = MemoryBlock::from_bytes(&[1, 3, 0]);
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(b.cmp(&a), Ordering::Greater);
    }

    #[test]
    fn test_block_cmp_prefix() {
        let a = MemoryBlock::from_bytes(&[1, 2]);
        let b = MemoryBlock::from_bytes(&[1, 2, 0]);
        assert_eq!(a.cmp(&b), Ordering::Less);
    }

    #[test]
    fn test_block_cmp_self() {
        let a = MemoryBlock::from_bytes(&[4, 4]);
        assert_eq!(a.cmp(&a.copy()), Ordering::Equal);
    }
}

#[cfg(test)]
mod block_scalar_tests {
    use super::*;

    #[test]
    fn test_block_write_read_i64() {
        let block = MemoryBlock::new(16);
        block.write_at::<i64>(8, -42);
        assert_eq!(block.read_at::<i64>(8), -42);
    }

    #[test]
    fn test_block_write_read_f64_unaligned() {
        let block = MemoryBlock::new(16);
        block.write_at::<f64>(3, 3.14159);
        assert!((block.read_at::<f64>(3) - 3.14159).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "outside block")]
    fn test_block_read_out_of_range() {
        let block = MemoryBlock::new(4);
        let _ = block.read_at::<u64>(0);
    }

    #[test]
    fn test_block_debug_string() {
        let block = MemoryBlock::from_bytes(&[0xab, 0xcd]);
        let dump = block.to_debug_string();
        assert!(dump.contains("size: 2"));
        assert!(dump.contains("refcount: 1"));
        assert!(dump.contains("ab cd"));
        assert_eq!(format!("{:?}", MemoryBlock::null()), "MemoryBlock(null)");
    }

    #[test]
    fn test_block_debug_string_truncates() {
        let block = MemoryBlock::new(100);
        assert!(block.to_debug_string().contains(".."));
    }
}

#[cfg(test)]
mod block_property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_new_size_and_refcount(size in 1usize..4096) {
            let block = MemoryBlock::new(size);
            prop_assert_eq!(block.size(), size);
            prop_assert_eq!(block.refcount(), 1);
        }

        #[test]
        fn prop_copy_increments_refcount(copies in 1usize..16) {
            let block = MemoryBlock::new(8);
            let aliases: Vec<MemoryBlock> = (0..copies).map(|_| block.copy()).collect();
            prop_assert_eq!(block.refcount(), copies + 1);
            prop_assert!(aliases.iter().all(|a| a.as_ptr() == block.as_ptr()));
            drop(aliases);
            prop_assert_eq!(block.refcount(), 1);
        }

        #[test]
        fn prop_deep_clone_equal_and_independent(bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
            let block = MemoryBlock::from_bytes(&bytes);
            let clone = block.deep_clone();
            prop_assert_ne!(block.as_ptr(), clone.as_ptr());
            prop_assert_eq!(block.cmp(&clone), Ordering::Equal);
            prop_assert_eq!(block.refcount(), 1);
            prop_assert_eq!(clone.refcount(), 1);
        }

        #[test]
        fn prop_resize_keeps_prefix(
            bytes in proptest::collection::vec(any::<u8>(), 0..128),
            new_size in 0usize..256,
        ) {
            let mut block = MemoryBlock::from_bytes(&bytes);
            block.resize(new_size);
            let keep = bytes.len().min(new_size);
            prop_assert_eq!(block.size(), new_size);
            prop_assert_eq!(&block.bytes()[..keep], &bytes[..keep]);
        }
    }
}
