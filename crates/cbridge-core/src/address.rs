//! The [`Address`] handle: a raw native memory location as an opaque integer.

use std::fmt;

/// A raw native memory location.
///
/// Addresses cross the managed boundary as 64-bit integers (JNI `jlong`).
/// Wrapping them keeps accidental arithmetic out of the API while leaving
/// pointer arithmetic available through [`offset`](Address::offset),
/// [`add`](Address::add) and [`distance_from`](Address::distance_from).
///
/// An `Address` carries no type, size or lifetime. Whether it is valid to
/// read or write is entirely the caller's responsibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Address(u64);

impl Address {
    /// The null address.
    pub const NULL: Address = Address(0);

    /// Wrap a raw integer address.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Reinterpret a JNI `jlong` as an address.
    pub const fn from_jlong(raw: i64) -> Self {
        Self(raw as u64)
    }

    /// The address as a JNI `jlong`.
    pub const fn to_jlong(self) -> i64 {
        self.0 as i64
    }

    /// Address of the value behind a pointer.
    ///
    /// Exposes the pointer's provenance so that the address can later be
    /// turned back into a usable pointer with [`as_ptr`](Address::as_ptr).
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr.expose_provenance() as u64)
    }

    /// Address of the value behind a mutable pointer.
    pub fn from_mut_ptr<T>(ptr: *mut T) -> Self {
        Self(ptr.expose_provenance() as u64)
    }

    /// Reinterpret the address as a pointer to `T`.
    pub fn as_ptr<T>(self) -> *const T {
        std::ptr::with_exposed_provenance(self.0 as usize)
    }

    /// Reinterpret the address as a mutable pointer to `T`.
    pub fn as_mut_ptr<T>(self) -> *mut T {
        std::ptr::with_exposed_provenance_mut(self.0 as usize)
    }

    /// Whether this is the null address.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Move the address by a signed number of bytes. Wraps on overflow.
    pub const fn offset(self, bytes: i64) -> Self {
        Self(self.0.wrapping_add_signed(bytes))
    }

    /// Move the address forward by `bytes`. Wraps on overflow.
    pub const fn add(self, bytes: u64) -> Self {
        Self(self.0.wrapping_add(bytes))
    }

    /// Signed byte distance `self - origin`.
    pub const fn distance_from(self, origin: Address) -> i64 {
        self.0.wrapping_sub(origin.0) as i64
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for Address {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<Address> for u64 {
    fn from(a: Address) -> Self {
        a.0
    }
}
