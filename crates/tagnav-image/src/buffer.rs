use std::alloc::Layout;
use std::ptr::NonNull;

use crate::{
    allocator::{CpuAllocator, ImageAllocator},
    error::ImageError,
    image::ImageSize,
};

/// Borrowed view of a single-channel image, laid out the way the native
/// detector expects it: `height` rows of `stride` bytes, of which the first
/// `width` are pixels.
#[derive(Clone, Copy, Debug)]
pub struct ImageU8View<'a> {
    /// Width of the image in pixels.
    pub width: usize,
    /// Height of the image in pixels.
    pub height: usize,
    /// Number of bytes between the starts of two consecutive rows.
    pub stride: usize,
    /// Row-major pixel data, `stride * height` bytes long.
    pub data: &'a [u8],
}

impl ImageU8View<'_> {
    /// Size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Returns the pixel value at `(x, y)`, or `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x).copied()
    }
}

/// Allocation owned by a frame buffer. Dropping it returns the memory to the
/// allocator, so the memory is released exactly once.
struct RawStorage<A: ImageAllocator> {
    ptr: NonNull<u8>,
    layout: Layout,
    alloc: A,
}

impl<A: ImageAllocator> RawStorage<A> {
    fn new(len: usize, alloc: A) -> Result<Self, ImageError> {
        let layout = Layout::array::<u8>(len).map_err(crate::AllocatorError::from)?;
        let ptr = alloc.alloc(layout)?;
        let ptr = NonNull::new(ptr).ok_or(crate::AllocatorError::NullPointer)?;

        // SAFETY: the allocator returned a block valid for `len` bytes.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, len) };

        Ok(Self { ptr, layout, alloc })
    }

    fn as_slice(&self) -> &[u8] {
        // SAFETY: the pointer is valid and initialized for `layout.size()` bytes
        // for as long as `self` is alive.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl<A: ImageAllocator> Drop for RawStorage<A> {
    fn drop(&mut self) {
        self.alloc.dealloc(self.ptr.as_ptr(), self.layout);
    }
}

// SAFETY: the storage uniquely owns its allocation.
unsafe impl<A: ImageAllocator + Send> Send for RawStorage<A> {}
// SAFETY: shared references only hand out shared slices.
unsafe impl<A: ImageAllocator + Sync> Sync for RawStorage<A> {}

/// Fixed-size single-channel image buffer shared with the detector.
///
/// The buffer is allocated once per capture resolution and overwritten every
/// frame. Writing requires `&mut self` and reading the detector view requires
/// `&self`, so a frame can never be written while the detector reads it.
///
/// The memory is returned to the allocator by [`FrameBuffer::release`] or,
/// if that was never called, when the buffer is dropped.
///
/// # Examples
///
/// ```
/// use tagnav_image::{FrameBuffer, ImageSize};
///
/// let mut buffer = FrameBuffer::acquire(ImageSize { width: 4, height: 2 })?;
/// buffer.write(&[7u8; 8])?;
/// assert_eq!(buffer.view()?.get(3, 1), Some(7));
///
/// buffer.release();
/// buffer.release(); // no-op
/// # Ok::<(), tagnav_image::ImageError>(())
/// ```
pub struct FrameBuffer<A: ImageAllocator = CpuAllocator> {
    size: ImageSize,
    stride: usize,
    storage: Option<RawStorage<A>>,
}

impl FrameBuffer<CpuAllocator> {
    /// Allocates a `width x height` buffer with `stride == width`.
    pub fn acquire(size: ImageSize) -> Result<Self, ImageError> {
        Self::acquire_with(size, 1, CpuAllocator)
    }

    /// Allocates a buffer whose rows are padded to a multiple of `alignment` bytes.
    pub fn acquire_aligned(size: ImageSize, alignment: usize) -> Result<Self, ImageError> {
        Self::acquire_with(size, alignment, CpuAllocator)
    }
}

impl<A: ImageAllocator> FrameBuffer<A> {
    /// Allocates a buffer using a custom allocator.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `alignment` - The row alignment in bytes, `1` for tightly packed rows.
    /// * `alloc` - The allocator providing the memory.
    pub fn acquire_with(size: ImageSize, alignment: usize, alloc: A) -> Result<Self, ImageError> {
        if alignment == 0 {
            return Err(ImageError::InvalidAlignment(alignment));
        }
        if size.is_empty() {
            return Err(ImageError::InvalidImageSize(size));
        }

        let stride = size
            .width
            .checked_next_multiple_of(alignment)
            .ok_or(ImageError::InvalidImageSize(size))?;
        let len = stride
            .checked_mul(size.height)
            .ok_or(ImageError::InvalidImageSize(size))?;

        let storage = RawStorage::new(len, alloc)?;
        log::debug!("acquired frame buffer {size} with stride {stride}");

        Ok(Self {
            size,
            stride,
            storage: Some(storage),
        })
    }

    /// Size of the image in pixels.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Width of the image in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Height of the image in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Number of bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of bytes a frame written with [`FrameBuffer::write`] must have.
    #[inline]
    pub fn len(&self) -> usize {
        self.stride * self.size.height
    }

    /// Always false: a buffer is never acquired with zero dimensions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once the buffer memory has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.storage.is_none()
    }

    /// The buffer contents, including row padding.
    pub fn as_slice(&self) -> Result<&[u8], ImageError> {
        self.storage
            .as_ref()
            .map(RawStorage::as_slice)
            .ok_or(ImageError::Released)
    }

    /// The view handed to the detector.
    pub fn view(&self) -> Result<ImageU8View<'_>, ImageError> {
        Ok(ImageU8View {
            width: self.size.width,
            height: self.size.height,
            stride: self.stride,
            data: self.as_slice()?,
        })
    }

    /// Copies a full frame into the buffer.
    ///
    /// `bytes` must hold exactly `stride * height` bytes, otherwise
    /// [`ImageError::SizeMismatch`] is returned and the previous contents are
    /// left untouched.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        let expected = self.len();
        let storage = self.storage.as_mut().ok_or(ImageError::Released)?;

        if bytes.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        storage.as_mut_slice().copy_from_slice(bytes);
        Ok(())
    }

    /// Copies a tightly packed `width * height` frame into the buffer, one row
    /// at a time so that row padding is respected.
    pub fn write_packed(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        let width = self.size.width;
        let stride = self.stride;
        let expected = self.size.area();
        let storage = self.storage.as_mut().ok_or(ImageError::Released)?;

        if bytes.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        storage
            .as_mut_slice()
            .chunks_exact_mut(stride)
            .zip(bytes.chunks_exact(width))
            .for_each(|(dst, src)| dst[..width].copy_from_slice(src));

        Ok(())
    }

    /// Returns the buffer memory to the allocator.
    ///
    /// The memory is freed by the first call; any later call is a no-op.
    pub fn release(&mut self) {
        match self.storage.take() {
            Some(storage) => {
                drop(storage);
                log::debug!("released frame buffer {}", self.size);
            }
            None => log::debug!("frame buffer {} already released", self.size),
        }
    }
}

impl<A: ImageAllocator> std::fmt::Debug for FrameBuffer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("size", &self.size)
            .field("stride", &self.stride)
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::AllocatorError;

    #[derive(Clone, Default)]
    struct CountingAllocator {
        allocs: Arc<AtomicUsize>,
        deallocs: Arc<AtomicUsize>,
    }

    impl ImageAllocator for CountingAllocator {
        fn alloc(&self, layout: Layout) -> Result<*mut u8, AllocatorError> {
            self.allocs.fetch_add(1, Ordering::SeqCst);
            CpuAllocator.alloc(layout)
        }

        fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            self.deallocs.fetch_add(1, Ordering::SeqCst);
            CpuAllocator.dealloc(ptr, layout)
        }
    }

    #[derive(Clone)]
    struct NullAllocator;

    impl ImageAllocator for NullAllocator {
        fn alloc(&self, _layout: Layout) -> Result<*mut u8, AllocatorError> {
            Ok(std::ptr::null_mut())
        }

        fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {}
    }

    #[test]
    fn acquire_zero_initialized() -> Result<(), ImageError> {
        let buffer = FrameBuffer::acquire([5, 3].into())?;
        assert_eq!(buffer.stride(), 5);
        assert_eq!(buffer.len(), 15);
        assert!(buffer.as_slice()?.iter().all(|&v| v == 0));
        Ok(())
    }

    #[test]
    fn acquire_aligned_pads_rows() -> Result<(), ImageError> {
        let buffer = FrameBuffer::acquire_aligned([100, 2].into(), 96)?;
        assert_eq!(buffer.stride(), 192);
        assert_eq!(buffer.len(), 384);
        Ok(())
    }

    #[test]
    fn acquire_rejects_invalid_requests() {
        assert_eq!(
            FrameBuffer::acquire([0, 10].into()).unwrap_err(),
            ImageError::InvalidImageSize([0, 10].into())
        );
        assert_eq!(
            FrameBuffer::acquire_aligned([10, 10].into(), 0).unwrap_err(),
            ImageError::InvalidAlignment(0)
        );
    }

    #[test]
    fn acquire_null_handle_is_allocation_error() {
        let res = FrameBuffer::acquire_with([4, 4].into(), 1, NullAllocator);
        assert_eq!(
            res.unwrap_err(),
            ImageError::Allocation(AllocatorError::NullPointer)
        );
    }

    #[test]
    fn write_packed_respects_stride() -> Result<(), ImageError> {
        let mut buffer = FrameBuffer::acquire_aligned([3, 2].into(), 4)?;
        buffer.write_packed(&[1, 2, 3, 4, 5, 6])?;
        assert_eq!(buffer.as_slice()?, &[1, 2, 3, 0, 4, 5, 6, 0]);

        let view = buffer.view()?;
        assert_eq!(view.get(2, 1), Some(6));
        assert_eq!(view.get(3, 1), None);
        Ok(())
    }

    #[test]
    fn release_frees_exactly_once() -> Result<(), ImageError> {
        let alloc = CountingAllocator::default();
        let mut buffer = FrameBuffer::acquire_with([8, 8].into(), 1, alloc.clone())?;

        buffer.release();
        buffer.release();
        drop(buffer);

        assert_eq!(alloc.allocs.load(Ordering::SeqCst), 1);
        assert_eq!(alloc.deallocs.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn drop_releases_unreleased_buffer() -> Result<(), ImageError> {
        let alloc = CountingAllocator::default();
        {
            let _buffer = FrameBuffer::acquire_with([8, 8].into(), 1, alloc.clone())?;
        }
        assert_eq!(alloc.deallocs.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn access_after_release_fails() -> Result<(), ImageError> {
        let mut buffer = FrameBuffer::acquire([2, 2].into())?;
        buffer.release();
        assert!(buffer.is_released());
        assert_eq!(buffer.view().unwrap_err(), ImageError::Released);
        assert_eq!(buffer.write(&[0; 4]).unwrap_err(), ImageError::Released);
        Ok(())
    }
}
