//! Callback arities supported by the trampoline layer.

use std::fmt;

use crate::error::BridgeError;

/// Number of 64-bit integer arguments a wrapped callback accepts.
///
/// Arity 1 and 2 callbacks return a `long`. Arity 3 callbacks are void on
/// the native side: the managed `apply` is still looked up with a `long`
/// result, but the value is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Arity {
    /// `(long) -> long`
    One = 1,
    /// `(long, long) -> long`
    Two = 2,
    /// `(long, long, long) -> void`
    Three = 3,
}

impl Arity {
    /// All arities, ascending.
    pub const ALL: [Arity; 3] = [Arity::One, Arity::Two, Arity::Three];

    /// Parse an argument count.
    pub const fn from_count(count: u32) -> Option<Self> {
        match count {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    /// Number of arguments.
    pub const fn count(self) -> usize {
        self as usize
    }

    /// Zero-based index, for per-arity tables.
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// Whether the native function pointer returns the managed result.
    pub const fn returns_value(self) -> bool {
        !matches!(self, Self::Three)
    }

    /// JNI descriptor of the managed `apply` method.
    pub const fn jni_signature(self) -> &'static str {
        match self {
            Self::One => "(J)J",
            Self::Two => "(JJ)J",
            Self::Three => "(JJJ)J",
        }
    }
}

impl TryFrom<u32> for Arity {
    type Error = BridgeError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::from_count(count).ok_or(BridgeError::InvalidArity { count })
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}
