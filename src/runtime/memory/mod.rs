//! Reference-counted memory blocks
//!
//! A `MemoryBlock` is a size- and alignment-tracked heap allocation with a
//! non-atomic reference count. It is the substrate every object payload
//! lives in.
//!
//! Two copy operations exist with distinct semantics:
//! - [`MemoryBlock::copy`] (and `Clone`) is shallow: same address, refcount + 1.
//!   All holders alias one allocation.
//! - [`MemoryBlock::deep_clone`] allocates a new block, copies the bytes and
//!   starts at refcount 1, independent of the source from then on.
//!
//! Blocks are confined to one thread (`Rc`, not `Arc`). The bytes are
//! zero-initialised on allocation and on growth.
//!
//! Allocation failure is fatal, see [`allocator`].

mod allocator;

pub use allocator::{MemoryLayout, DEFAULT_ALIGNMENT};

use std::cell::{Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ptr::NonNull;
use std::rc::Rc;

use tracing::trace;

/// Plain scalar types that may be read from and written to raw block bytes.
///
/// Every bit pattern is a valid value for these types.
pub trait Scalar: Copy + sealed::Sealed {}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}
            impl Scalar for $t {}
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

/// The allocation itself: pointer, logical size, layout.
struct RawBuf {
    ptr: NonNull<u8>,
    /// Logical size requested by the caller
    size: usize,
    /// Allocated layout (capacity ≥ size)
    layout: MemoryLayout,
}

impl RawBuf {
    fn new(
        size: usize,
        align: usize,
    ) -> Self {
        let layout = layout_for(size, align);
        let ptr = allocator::allocate(layout);
        trace!(size, align, addr = ?ptr, "memory block allocated");
        Self { ptr, size, layout }
    }

    fn as_slice(&self) -> &[u8] {
        // Safety: ptr is valid for layout.size() ≥ size initialised bytes
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // Safety: as above, and &mut self guarantees exclusivity
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    fn resize(
        &mut self,
        new_size: usize,
        align: usize,
    ) {
        let new_layout = layout_for(new_size, align);
        if align == self.layout.align() {
            if new_layout.size() != self.layout.size() {
                // Safety: ptr/layout pair came from the allocator
                self.ptr = unsafe { allocator::reallocate(self.ptr, self.layout, new_layout) };
                self.layout = new_layout;
            } else if new_size > self.size {
                // growing inside the existing capacity: expose zeroed bytes
                // Safety: range lies inside the allocation
                unsafe {
                    std::ptr::write_bytes(self.ptr.as_ptr().add(self.size), 0, new_size - self.size);
                }
            }
        } else {
            // realloc cannot change alignment
            let ptr = allocator::allocate(new_layout);
            let keep = self.size.min(new_size);
            // Safety: both regions are valid for `keep` bytes and distinct
            unsafe {
                std::ptr::copy_nonoverlapping(self.ptr.as_ptr(), ptr.as_ptr(), keep);
                allocator::deallocate(self.ptr, self.layout);
            }
            self.ptr = ptr;
            self.layout = new_layout;
        }
        trace!(old = self.size, new = new_size, addr = ?self.ptr, "memory block resized");
        self.size = new_size;
    }
}

impl Drop for RawBuf {
    fn drop(&mut self) {
        trace!(size = self.size, addr = ?self.ptr, "memory block freed");
        // Safety: ptr/layout pair came from the allocator and is dropped once
        unsafe { allocator::deallocate(self.ptr, self.layout) }
    }
}

fn layout_for(
    size: usize,
    align: usize,
) -> MemoryLayout {
    if !align.is_power_of_two() {
        crate::util::contract::violation(format_args!(
            "memory block alignment must be a power of two, got {}",
            align
        ));
    }
    MemoryLayout::from_size_align(size, align).unwrap_or_else(|| {
        crate::util::contract::violation(format_args!(
            "memory block size {} overflows with alignment {}",
            size, align
        ))
    })
}

/// Reference-counted raw heap allocation
///
/// A handle may be null (see [`MemoryBlock::null`] and
/// [`MemoryBlock::release`]). Using a null handle for anything other than
/// `release`, `is_null` and `refcount` is a contract violation.
pub struct MemoryBlock {
    inner: Option<Rc<RefCell<RawBuf>>>,
}

impl MemoryBlock {
    /// Allocate `size` zeroed bytes with the default alignment
    ///
    /// Zero-length blocks are valid and own a distinct address.
    pub fn new(size: usize) -> Self {
        Self::new_aligned(size, DEFAULT_ALIGNMENT)
    }

    /// Allocate `size` zeroed bytes aligned to `align` (a power of two)
    pub fn new_aligned(
        size: usize,
        align: usize,
    ) -> Self {
        Self {
            inner: Some(Rc::new(RefCell::new(RawBuf::new(size, align)))),
        }
    }

    /// Allocate a block holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_bytes_aligned(bytes, DEFAULT_ALIGNMENT)
    }

    /// Allocate an aligned block holding a copy of `bytes`
    pub fn from_bytes_aligned(
        bytes: &[u8],
        align: usize,
    ) -> Self {
        let block = Self::new_aligned(bytes.len(), align);
        block.bytes_mut().copy_from_slice(bytes);
        block
    }

    /// The null handle
    pub const fn null() -> Self {
        Self { inner: None }
    }

    /// Whether this handle is null
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    #[track_caller]
    fn raw(&self) -> &Rc<RefCell<RawBuf>> {
        match &self.inner {
            Some(inner) => inner,
            None => crate::util::contract::violation(format_args!("use of a null memory block")),
        }
    }

    /// Shallow copy: same allocation, refcount + 1
    pub fn copy(&self) -> Self {
        Self {
            inner: Some(Rc::clone(self.raw())),
        }
    }

    /// Deep clone: new allocation with the same bytes and alignment, refcount 1
    pub fn deep_clone(&self) -> Self {
        self.deep_clone_aligned(self.alignment())
    }

    /// Deep clone into a block aligned to `align`
    pub fn deep_clone_aligned(
        &self,
        align: usize,
    ) -> Self {
        let src = self.bytes();
        let block = Self::new_aligned(src.len(), align);
        block.bytes_mut().copy_from_slice(&src);
        trace!(from = ?self.as_ptr(), to = ?block.as_ptr(), "memory block cloned");
        block
    }

    /// Drop this reference
    ///
    /// Decrements the refcount and nulls the handle; the allocation is freed
    /// when the count reaches zero. Releasing a null handle is a no-op.
    pub fn release(&mut self) {
        self.inner = None;
    }

    /// Resize, preserving the first `min(old, new)` bytes
    ///
    /// The allocation is shared by every alias of this block, so all of them
    /// observe the new size.
    pub fn resize(
        &mut self,
        new_size: usize,
    ) {
        let align = self.alignment();
        self.resize_aligned(new_size, align);
    }

    /// Resize and realign, preserving the first `min(old, new)` bytes
    pub fn resize_aligned(
        &mut self,
        new_size: usize,
        align: usize,
    ) {
        self.raw().borrow_mut().resize(new_size, align);
    }

    /// Byte-wise comparison
    ///
    /// Compares up to the shorter size; the first differing byte decides,
    /// and a common prefix orders the shorter block first. Only meaningful
    /// for payloads made purely of scalars.
    pub fn cmp(
        &self,
        other: &MemoryBlock,
    ) -> Ordering {
        if self.ptr_eq(other) {
            return Ordering::Equal;
        }
        let (a, b) = (self.bytes(), other.bytes());
        a[..].cmp(&b[..])
    }

    /// Logical size in bytes
    pub fn size(&self) -> usize {
        self.raw().borrow().size
    }

    /// Bytes reserved for this block including header and alignment slop
    pub fn total_size(&self) -> usize {
        // Rc header (strong + weak counts) and the RefCell<RawBuf> record
        let header = 2 * mem::size_of::<usize>() + mem::size_of::<RefCell<RawBuf>>();
        self.raw().borrow().layout.size() + header
    }

    /// Alignment of the allocation
    pub fn alignment(&self) -> usize {
        self.raw().borrow().layout.align()
    }

    /// Number of live handles to this allocation (0 for a null handle)
    pub fn refcount(&self) -> usize {
        self.inner.as_ref().map_or(0, Rc::strong_count)
    }

    /// Whether the data address is a multiple of `n`
    pub fn is_aligned(
        &self,
        n: usize,
    ) -> bool {
        n != 0 && self.as_ptr() as usize % n == 0
    }

    /// Address of the first data byte (null for a null handle)
    pub fn as_ptr(&self) -> *const u8 {
        match &self.inner {
            Some(inner) => inner.borrow().ptr.as_ptr(),
            None => std::ptr::null(),
        }
    }

    /// Whether both handles alias the same allocation
    pub fn ptr_eq(
        &self,
        other: &MemoryBlock,
    ) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Read-only view of the bytes
    pub fn bytes(&self) -> Ref<'_, [u8]> {
        Ref::map(self.raw().borrow(), RawBuf::as_slice)
    }

    /// Mutable view of the bytes
    ///
    /// Writes are visible through every alias; copy-on-write is the
    /// object layer's job.
    pub fn bytes_mut(&self) -> RefMut<'_, [u8]> {
        RefMut::map(self.raw().borrow_mut(), RawBuf::as_mut_slice)
    }

    /// Read a scalar stored at byte `offset`
    #[track_caller]
    pub fn read_at<T: Scalar>(
        &self,
        offset: usize,
    ) -> T {
        let bytes = self.bytes();
        check_range::<T>(offset, bytes.len());
        // Safety: range checked above; every bit pattern is a valid T
        unsafe { bytes.as_ptr().add(offset).cast::<T>().read_unaligned() }
    }

    /// Write a scalar at byte `offset`
    #[track_caller]
    pub fn write_at<T: Scalar>(
        &self,
        offset: usize,
        value: T,
    ) {
        let mut bytes = self.bytes_mut();
        check_range::<T>(offset, bytes.len());
        // Safety: range checked above
        unsafe { bytes.as_mut_ptr().add(offset).cast::<T>().write_unaligned(value) }
    }

    /// Human-readable dump: address, sizes, refcount and leading bytes
    pub fn to_debug_string(&self) -> String {
        if self.is_null() {
            return "MemoryBlock(null)".to_string();
        }
        const PREVIEW: usize = 32;
        let bytes = self.bytes();
        let mut hex: Vec<String> = bytes
            .iter()
            .take(PREVIEW)
            .map(|b| format!("{:02x}", b))
            .collect();
        if bytes.len() > PREVIEW {
            hex.push("..".to_string());
        }
        format!(
            "MemoryBlock@{:p} {{ size: {}, total: {}, align: {}, refcount: {}, data: [{}] }}",
            self.as_ptr(),
            bytes.len(),
            self.total_size(),
            self.alignment(),
            self.refcount(),
            hex.join(" ")
        )
    }
}

#[track_caller]
fn check_range<T>(
    offset: usize,
    len: usize,
) {
    let end = offset.checked_add(mem::size_of::<T>());
    if end.map_or(true, |end| end > len) {
        crate::util::contract::violation(format_args!(
            "access of {} bytes at offset {} outside block of {} bytes",
            mem::size_of::<T>(),
            offset,
            len
        ));
    }
}

impl Clone for MemoryBlock {
    /// Shallow copy, see [`MemoryBlock::copy`]
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Default for MemoryBlock {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for MemoryBlock {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.to_debug_string())
    }
}

impl fmt::Display for MemoryBlock {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.to_debug_string())
    }
}

#[cfg(test)]
mod tests;
