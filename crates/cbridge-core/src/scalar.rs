//! Typed scalar views over raw memory.
//!
//! The embedded language knows four native scalar widths. Each maps to a
//! Rust primitive implementing the sealed [`Scalar`] trait:
//!
//! | Kind | Rust | JNI |
//! |---|---|---|
//! | int32 | `i32` | `jint` |
//! | int64 | `i64` | `jlong` |
//! | float64 | `f64` | `jdouble` |
//! | char16 | `u16` | `jchar` |
//!
//! No type tag is ever stored next to a value. The caller picks the view.

use std::fmt;

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
    impl Sealed for u16 {}
}

/// Width tag for the supported scalar views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// IEEE-754 double.
    Float64,
    /// UTF-16 code unit.
    Char16,
}

impl ScalarKind {
    /// Size of the view in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::Int32 => 4,
            Self::Int64 | Self::Float64 => 8,
            Self::Char16 => 2,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int32 => "int",
            Self::Int64 => "long",
            Self::Float64 => "double",
            Self::Char16 => "char",
        };
        f.write_str(name)
    }
}

/// A primitive that can be read from or written to a raw address.
///
/// Sealed: only `i32`, `i64`, `f64` and `u16` implement it.
pub trait Scalar: Copy + PartialEq + fmt::Debug + Send + Sync + 'static + sealed::Sealed {
    /// The width tag of this view.
    const KIND: ScalarKind;
}

impl Scalar for i32 {
    const KIND: ScalarKind = ScalarKind::Int32;
}

impl Scalar for i64 {
    const KIND: ScalarKind = ScalarKind::Int64;
}

impl Scalar for f64 {
    const KIND: ScalarKind = ScalarKind::Float64;
}

impl Scalar for u16 {
    const KIND: ScalarKind = ScalarKind::Char16;
}
