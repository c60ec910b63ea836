//! Host C type sizes and the `EOF` sentinel.
//!
//! The embedded language lays out structures with the host compiler's
//! `sizeof`, which is not the same thing as the JVM widths in
//! [`ScalarKind`](crate::ScalarKind): C `long` is 4 bytes on Windows and
//! C `char` is one byte everywhere.

use std::ffi::{c_char, c_double, c_int, c_long};
use std::fmt;

/// The C end-of-file marker returned by `getc` and friends.
pub const EOF: i32 = -1;

/// A native C scalar type the embedded language can ask the size of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CType {
    /// `int`
    Int,
    /// `long`
    Long,
    /// `double`
    Double,
    /// `char`
    Char,
}

impl CType {
    /// `sizeof` on the host platform.
    pub const fn size(self) -> usize {
        match self {
            Self::Int => std::mem::size_of::<c_int>(),
            Self::Long => std::mem::size_of::<c_long>(),
            Self::Double => std::mem::size_of::<c_double>(),
            Self::Char => std::mem::size_of::<c_char>(),
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Char => "char",
        };
        f.write_str(name)
    }
}

/// `sizeof(ty)` as a JNI `jint`.
pub const fn sizeof_scalar(ty: CType) -> i32 {
    ty.size() as i32
}

/// The platform `EOF` value.
pub const fn eof_sentinel() -> i32 {
    EOF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_is_four_bytes() {
        assert_eq!(sizeof_scalar(CType::Int), 4);
    }

    #[test]
    fn char_is_one_byte() {
        assert_eq!(sizeof_scalar(CType::Char), 1);
    }

    #[test]
    fn double_is_eight_bytes() {
        assert_eq!(sizeof_scalar(CType::Double), 8);
    }

    #[cfg(all(unix, target_pointer_width = "64"))]
    #[test]
    fn long_is_pointer_sized_on_lp64() {
        assert_eq!(sizeof_scalar(CType::Long), 8);
    }

    #[cfg(windows)]
    #[test]
    fn long_is_four_bytes_on_llp64() {
        assert_eq!(sizeof_scalar(CType::Long), 4);
    }

    #[test]
    fn eof_is_negative_one() {
        assert_eq!(eof_sentinel(), -1);
    }
}
