//! Memory-locked buffers for reconstructed secrets
//!
//! A [`SecureBuffer`] is zero-filled on allocation and `mlock`ed so the kernel
//! never writes its pages to swap. Dropping it scrubs the contents, unlocks the
//! pages and frees the allocation, in that order. Ownership makes the release
//! happen exactly once, on every path that let go of the buffer.

use std::alloc::{self, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use zeroize::Zeroize;

/// Errors raised while acquiring a secure buffer
#[derive(Debug, thiserror::Error)]
pub enum SecureBufferError {
    #[error("failed to allocate {len} bytes for a secure buffer")]
    Allocation { len: usize },
    #[error("failed to lock {len} bytes in memory: {source}")]
    Lock {
        len: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Size of a virtual memory page
pub fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size)
        .ok()
        .filter(|s| s.is_power_of_two())
        .unwrap_or(4096)
}

/// Layout covering `len` bytes in whole, page-aligned pages
fn page_layout(len: usize) -> Option<Layout> {
    let page = page_size();
    let size = len.checked_add(page - 1)? & !(page - 1);
    Layout::from_size_align(size, page).ok()
}

/// Zero-initialized, memory-locked byte buffer
///
/// Each buffer owns whole pages, so unlocking one never unlocks a neighbour.
pub struct SecureBuffer {
    ptr: NonNull<u8>,
    len: usize,
    /// `None` for empty buffers, which allocate nothing
    layout: Option<Layout>,
}

// SAFETY: the allocation is owned exclusively and only reached through `&self`/`&mut self`
unsafe impl Send for SecureBuffer {}
// SAFETY: shared access is read-only
unsafe impl Sync for SecureBuffer {}

impl SecureBuffer {
    /// Allocate `len` zeroed bytes and lock them into physical memory.
    ///
    /// On failure nothing stays allocated or locked.
    pub fn allocate(len: usize) -> Result<Self, SecureBufferError> {
        if len == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len,
                layout: None,
            });
        }

        let layout = page_layout(len).ok_or(SecureBufferError::Allocation { len })?;
        // SAFETY: the layout has a non-zero size
        let ptr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
            .ok_or(SecureBufferError::Allocation { len })?;

        // SAFETY: the pointer and size describe the allocation made above
        let rc = unsafe { libc::mlock(ptr.as_ptr().cast(), layout.size()) };
        if rc != 0 {
            let source = std::io::Error::last_os_error();
            // SAFETY: allocated above with this layout and never handed out
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) };
            return Err(SecureBufferError::Lock { len, source });
        }

        Ok(Self {
            ptr,
            len,
            layout: Some(layout),
        })
    }

    /// Scrub, unlock and free the buffer.
    ///
    /// Equivalent to dropping it; spelled out where the release point matters.
    pub fn release(self) {
        drop(self)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes held locked, a whole number of pages
    pub fn locked_len(&self) -> usize {
        self.layout.map_or(0, |layout| layout.size())
    }
}

impl Deref for SecureBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `len` initialized bytes, or dangling with `len == 0`
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for SecureBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `deref`, and `&mut self` guarantees exclusive access
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        let Some(layout) = self.layout else {
            return;
        };

        // SAFETY: the whole region was allocated zeroed in `allocate` and is still live
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), layout.size()) }.zeroize();

        // SAFETY: same region that was locked in `allocate`
        let rc = unsafe { libc::munlock(self.ptr.as_ptr().cast(), layout.size()) };
        if rc != 0 {
            tracing::warn!(
                len = self.len,
                "munlock failed: {}",
                std::io::Error::last_os_error()
            );
        }

        // SAFETY: allocated in `allocate` with this layout, freed only here
        unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
    }
}

impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_zeroed() {
        let buf = SecureBuffer::allocate(4096).unwrap();
        assert_eq!(buf.len(), 4096);
        assert!(buf.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_write_then_read_back() {
        let mut buf = SecureBuffer::allocate(5).unwrap();
        buf.copy_from_slice(b"hello");
        assert_eq!(&buf[..], b"hello");
        buf.release();
    }

    #[test]
    fn test_empty_buffer_locks_nothing() {
        let buf = SecureBuffer::allocate(0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.locked_len(), 0);
        drop(buf);
    }

    #[test]
    fn test_debug_does_not_print_contents() {
        let mut buf = SecureBuffer::allocate(6).unwrap();
        buf.copy_from_slice(b"s3cr3t");
        let rendered = format!("{:?}", buf);
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("len: 6"));
    }

    #[test]
    fn test_buffers_own_whole_pages() {
        let page = page_size();
        let a = SecureBuffer::allocate(32).unwrap();
        let b = SecureBuffer::allocate(page + 1).unwrap();

        assert_eq!(a.locked_len(), page);
        assert_eq!(b.locked_len(), 2 * page);
        for buf in [&a, &b] {
            assert_eq!(buf.as_ptr() as usize % page, 0);
        }

        let a_range = a.as_ptr() as usize..a.as_ptr() as usize + a.locked_len();
        let b_start = b.as_ptr() as usize;
        let b_end = b_start + b.locked_len();
        assert!(b_end <= a_range.start || b_start >= a_range.end);
    }

    #[test]
    fn test_absurd_allocation_fails_cleanly() {
        let err = SecureBuffer::allocate(usize::MAX).unwrap_err();
        assert!(matches!(err, SecureBufferError::Allocation { .. }));
    }
}
