//! Raw allocation layer for memory blocks
//!
//! Thin wrappers around `std::alloc` that validate layouts and treat
//! allocation failure as fatal: the failure is logged and the process is
//! terminated through `handle_alloc_error`. Callers never see an
//! out-of-memory error value.

use core::alloc::Layout;
use core::ptr::NonNull;
use std::alloc;

/// Alignment used by `MemoryBlock::new` (what `malloc` guarantees on 64-bit targets).
pub const DEFAULT_ALIGNMENT: usize = 2 * std::mem::size_of::<usize>();

/// Memory layout helper
///
/// Wraps `std::alloc::Layout` with convenient constructors. The stored
/// size is the allocated capacity: the requested size rounded up to the
/// alignment, and never zero, so every block owns a distinct address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    size: usize,
    align: usize,
}

impl MemoryLayout {
    /// Create a layout from size and alignment
    ///
    /// # Returns
    /// `Some(MemoryLayout)` if alignment is valid (power of 2) and the
    /// rounded size does not overflow, `None` otherwise.
    pub fn from_size_align(
        size: usize,
        align: usize,
    ) -> Option<Self> {
        if align == 0 || !align.is_power_of_two() {
            return None;
        }

        let size = size.max(1);
        // Adjust size to meet alignment requirements
        let aligned_size = size.checked_add(align - 1)? & !(align - 1);
        if aligned_size > isize::MAX as usize {
            return None;
        }

        Some(Self {
            size: aligned_size,
            align,
        })
    }

    /// Create a layout for type T
    pub fn new<T>() -> Self {
        Self::from_size_align(std::mem::size_of::<T>(), std::mem::align_of::<T>())
            .unwrap_or(Self {
                size: 1,
                align: 1,
            })
    }

    /// Get the size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the alignment
    pub fn align(&self) -> usize {
        self.align
    }

    /// Convert to std::alloc::Layout
    pub fn to_std_layout(&self) -> Layout {
        // Safety: size and align are validated in from_size_align
        unsafe { Layout::from_size_align_unchecked(self.size, self.align) }
    }
}

/// Allocate zeroed memory for `layout`.
pub(crate) fn allocate(layout: MemoryLayout) -> NonNull<u8> {
    // Safety: layout size is never zero
    let ptr = unsafe { alloc::alloc_zeroed(layout.to_std_layout()) };
    NonNull::new(ptr).unwrap_or_else(|| out_of_memory(layout))
}

/// Grow or shrink an allocation, keeping its alignment.
///
/// Bytes past the old size are zeroed.
///
/// # Safety
/// `ptr` must have been returned by `allocate`/`reallocate` with `old`.
pub(crate) unsafe fn reallocate(
    ptr: NonNull<u8>,
    old: MemoryLayout,
    new: MemoryLayout,
) -> NonNull<u8> {
    debug_assert_eq!(old.align(), new.align());
    let raw = alloc::realloc(ptr.as_ptr(), old.to_std_layout(), new.size());
    let raw = NonNull::new(raw).unwrap_or_else(|| out_of_memory(new));
    if new.size() > old.size() {
        std::ptr::write_bytes(raw.as_ptr().add(old.size()), 0, new.size() - old.size());
    }
    raw
}

/// Release an allocation.
///
/// # Safety
/// `ptr` must have been returned by `allocate`/`reallocate` with `layout`
/// and must not be used afterwards.
pub(crate) unsafe fn deallocate(
    ptr: NonNull<u8>,
    layout: MemoryLayout,
) {
    alloc::dealloc(ptr.as_ptr(), layout.to_std_layout());
}

#[cold]
fn out_of_memory(layout: MemoryLayout) -> ! {
    tracing::error!(
        size = layout.size(),
        align = layout.align(),
        "memory block allocation failed, terminating"
    );
    alloc::handle_alloc_error(layout.to_std_layout())
}
