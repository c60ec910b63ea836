//! Bridge and JNI failures -> Java exception mapping.

use cbridge_core::BridgeError;
use jni::JNIEnv;
use thiserror::Error;

/// Anything a JVM entry point can fail with recoverably.
#[derive(Debug, Error)]
pub(crate) enum HostError {
    /// The bridge refused the request.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// A JNI call failed. If the JVM raised an exception it is still pending.
    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),
    /// A length argument was negative.
    #[error("negative length {0}")]
    NegativeLength(i32),
}

impl HostError {
    /// Java class thrown for this error when no exception is pending.
    pub(crate) fn exception_class(&self) -> &'static str {
        match self {
            HostError::NegativeLength(_) => "java/lang/IllegalArgumentException",
            HostError::Bridge(_) | HostError::Jni(_) => "java/lang/IllegalStateException",
        }
    }
}

/// Raise `err` in the JVM unless an exception is already pending.
///
/// A pending exception (for example `ArrayIndexOutOfBoundsException` from
/// a region copy) already describes the failure and is left in place.
pub(crate) fn throw(env: &mut JNIEnv, err: HostError) {
    if env.exception_check().unwrap_or(false) {
        log::debug!("{err}; leaving pending Java exception in place");
        return;
    }
    log::warn!("{err}");
    if env.throw_new(err.exception_class(), err.to_string()).is_err() {
        log::error!("failed to throw {} for: {err}", err.exception_class());
    }
}

/// Unwrap `result`, throwing and returning `fallback` on error.
pub(crate) fn or_throw<T>(env: &mut JNIEnv, result: Result<T, HostError>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            throw(env, err);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbridge_core::Arity;

    #[test]
    fn exception_classes() {
        let exhausted = HostError::from(BridgeError::PoolExhausted {
            arity: Arity::Two,
            capacity: 64,
        });
        assert_eq!(exhausted.exception_class(), "java/lang/IllegalStateException");
        assert_eq!(
            HostError::NegativeLength(-1).exception_class(),
            "java/lang/IllegalArgumentException"
        );
    }

    #[test]
    fn bridge_message_is_forwarded() {
        let bridge = BridgeError::PoolExhausted {
            arity: Arity::One,
            capacity: 64,
        };
        let err = HostError::from(bridge.clone());
        assert_eq!(err.to_string(), bridge.to_string());
        assert_eq!(HostError::NegativeLength(-3).to_string(), "negative length -3");
    }
}
