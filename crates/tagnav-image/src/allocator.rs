use std::alloc;
use std::alloc::Layout;

use thiserror::Error;

/// An error type for image allocator operations.
#[derive(Debug, Error, PartialEq)]
pub enum AllocatorError {
    /// The requested buffer layout is invalid.
    #[error("Invalid image layout {0}")]
    LayoutError(#[from] core::alloc::LayoutError),

    /// The allocator returned a null handle.
    #[error("Null pointer")]
    NullPointer,
}

/// A trait for allocating and deallocating the memory of a frame buffer.
///
/// # Safety
///
/// Implementations must be thread-safe and must return either a pointer valid
/// for `layout.size()` bytes or an error.
pub trait ImageAllocator: Clone {
    /// Allocates memory for a buffer with the given layout.
    fn alloc(&self, layout: Layout) -> Result<*mut u8, AllocatorError>;

    /// Deallocates memory previously returned by [`ImageAllocator::alloc`].
    fn dealloc(&self, ptr: *mut u8, layout: Layout);
}

/// An image allocator that uses the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuAllocator;

impl ImageAllocator for CpuAllocator {
    /// Allocates memory with the system allocator.
    ///
    /// A zero-sized layout is rejected before reaching the system allocator.
    fn alloc(&self, layout: Layout) -> Result<*mut u8, AllocatorError> {
        if layout.size() == 0 {
            return Err(AllocatorError::NullPointer);
        }
        let ptr = unsafe { alloc::alloc(layout) };
        if ptr.is_null() {
            Err(AllocatorError::NullPointer)?
        }
        Ok(ptr)
    }

    #[allow(clippy::not_unsafe_ptr_arg_deref)]
    fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if !ptr.is_null() {
            unsafe { alloc::dealloc(ptr, layout) }
        }
    }
}
