//! Byte range copies and pinned buffers.

use std::ptr::NonNull;

use cbridge_core::Address;

/// Copy `n` bytes starting at `addr` into a fresh buffer.
///
/// # Safety
///
/// `addr..addr + n` must be readable.
pub unsafe fn read_bytes(addr: Address, n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    // SAFETY: source readability is the caller's contract; `out` is a
    // fresh allocation of exactly `n` bytes so the ranges cannot overlap.
    unsafe { std::ptr::copy_nonoverlapping(addr.as_ptr::<u8>(), out.as_mut_ptr(), n) };
    out
}

/// Copy the first `n` bytes of `buffer` to `addr`.
///
/// # Panics
///
/// Panics if `n > buffer.len()`.
///
/// # Safety
///
/// `addr..addr + n` must be writable and must not overlap `buffer`.
pub unsafe fn write_bytes(addr: Address, buffer: &[u8], n: usize) {
    let src = &buffer[..n];
    // SAFETY: destination writability and disjointness are the caller's
    // contract; `src` holds exactly `n` initialized bytes.
    unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), addr.as_mut_ptr::<u8>(), n) };
}

/// A byte buffer at a fixed native address.
///
/// The storage is allocated once and never resized or moved, so
/// [`address`](Pinned::address) stays valid for the buffer's whole
/// lifetime. There is no separate unpin: the pin ends when the buffer is
/// dropped.
///
/// Native code may write through the address at any time; Rust-side views
/// ([`as_slice`](Pinned::as_slice), [`to_vec`](Pinned::to_vec)) observe
/// those writes.
pub struct Pinned {
    ptr: NonNull<[u8]>,
}

// SAFETY: `Pinned` uniquely owns its allocation, like `Box<[u8]>`.
unsafe impl Send for Pinned {}
// SAFETY: shared access only hands out `&[u8]` and the address.
unsafe impl Sync for Pinned {}

impl Pinned {
    /// Pin the bytes of `data`.
    pub fn new(data: Vec<u8>) -> Self {
        let raw = Box::into_raw(data.into_boxed_slice());
        Self {
            // SAFETY: Box::into_raw never returns null.
            ptr: unsafe { NonNull::new_unchecked(raw) },
        }
    }

    /// Pin `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Native address of the first byte.
    pub fn address(&self) -> Address {
        Address::from_mut_ptr(self.ptr.as_ptr().cast::<u8>())
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.ptr.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current contents.
    ///
    /// Must not be held across a native write to the same bytes.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr came from a live boxed slice owned by self.
        unsafe { self.ptr.as_ref() }
    }

    /// Copy of the current contents.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl Drop for Pinned {
    fn drop(&mut self) {
        // SAFETY: ptr was produced by Box::into_raw in `new` and is
        // released exactly once.
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}

impl std::fmt::Debug for Pinned {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pinned")
            .field("address", &self.address())
            .field("len", &self.len())
            .finish()
    }
}

/// Native address backing a pinned buffer.
pub fn pin_address(buffer: &Pinned) -> Address {
    buffer.address()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn read_copies_exact_range() {
        let data = [1u8, 2, 3, 4, 5];
        let addr = Address::from_ptr(data.as_ptr()).add(1);
        assert_eq!(unsafe { read_bytes(addr, 3) }, vec![2, 3, 4]);
    }

    #[test]
    fn zero_length_read_is_empty() {
        assert!(unsafe { read_bytes(Address::from_ptr(&0u8), 0) }.is_empty());
    }

    #[test]
    fn write_honours_n_not_buffer_len() {
        let pinned = Pinned::zeroed(4);
        unsafe { write_bytes(pinned.address(), &[9, 9, 9, 9], 2) };
        assert_eq!(pinned.to_vec(), vec![9, 9, 0, 0]);
    }

    #[test]
    #[should_panic]
    fn write_more_than_supplied_panics() {
        let pinned = Pinned::zeroed(8);
        unsafe { write_bytes(pinned.address(), &[1, 2], 3) };
    }

    #[test]
    fn pinned_address_is_stable() {
        let pinned = Pinned::new(vec![7; 32]);
        let first = pin_address(&pinned);
        let moved = pinned;
        assert_eq!(pin_address(&moved), first);
        assert_eq!(moved.len(), 32);
    }

    #[test]
    fn native_writes_visible_through_slice() {
        let pinned = Pinned::zeroed(3);
        let addr = pinned.address();
        unsafe { addr.add(1).as_mut_ptr::<u8>().write(0xAB) };
        assert_eq!(pinned.as_slice(), &[0, 0xAB, 0]);
    }

    #[test]
    fn empty_pinned_buffer() {
        let pinned = Pinned::new(Vec::new());
        assert!(pinned.is_empty());
        assert!(!pinned.address().is_null());
    }

    proptest! {
        #[test]
        fn write_then_read_reproduces_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let target = Pinned::zeroed(bytes.len());
            unsafe { write_bytes(target.address(), &bytes, bytes.len()) };
            let back = unsafe { read_bytes(target.address(), bytes.len()) };
            prop_assert_eq!(back, bytes);
        }
    }
}
