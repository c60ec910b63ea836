//! JVM callables as native function pointers.
//!
//! `addr_funcN` pins the callable with a global reference and binds a
//! trampoline that re-attaches to the JVM and calls its `apply` method
//! with `long` arguments. The attach is a no-op on threads the JVM already
//! knows.

use std::fmt;
use std::sync::Arc;

use cbridge_core::{Address, Arity, BridgeError};
use cbridge_ffi::trampoline::{self, Binding};
use jni::objects::{GlobalRef, JObject, JValue};
use jni::JavaVM;
use jni::JNIEnv;

use crate::error::HostError;

/// Log and abort. A native caller waiting on a callback result cannot be
/// told that the JVM side failed.
fn fatal(msg: fmt::Arguments<'_>) -> ! {
    log::error!("{msg}");
    eprintln!("cbridge: fatal: {msg}");
    std::process::abort()
}

/// Call `callable.apply(args...)` with descriptor `signature` on the
/// current thread.
fn call_apply(vm: &JavaVM, callable: &GlobalRef, signature: &str, args: &[i64]) -> i64 {
    let arity = args.len();
    let mut env = match vm.attach_current_thread() {
        Ok(env) => env,
        Err(e) => fatal(format_args!("cannot attach thread to JVM for arity-{arity} callback: {e}")),
    };
    let jargs: Vec<JValue> = args.iter().map(|&a| JValue::Long(a)).collect();
    let result = env
        .call_method(callable.as_obj(), "apply", signature, &jargs)
        .and_then(|value| value.j());
    match result {
        Ok(value) => value,
        Err(e) => {
            if env.exception_check().unwrap_or(false) {
                let _ = env.exception_describe();
            }
            fatal(format_args!("arity-{arity} callback apply{signature} failed: {e}"))
        }
    }
}

/// Bind `apply` to a trampoline of `arity`.
///
/// `apply` receives the JNI descriptor of the managed `apply` method and
/// the native arguments. Its result is dropped for void arities.
fn bind_apply<F>(arity: Arity, apply: F) -> Result<Binding, BridgeError>
where
    F: Fn(&'static str, &[i64]) -> i64 + Send + Sync + 'static,
{
    let signature = arity.jni_signature();
    trampoline::bind(
        arity,
        Arc::new(move |args: &[i64]| {
            let result = apply(signature, args);
            if arity.returns_value() {
                result
            } else {
                0
            }
        }),
    )
}

/// Bind `func` to a trampoline of `arity` and return its native pointer.
pub(crate) fn bind_callable(
    env: &mut JNIEnv,
    arity: Arity,
    func: &JObject,
) -> Result<Address, HostError> {
    if func.is_null() {
        return Err(BridgeError::NullCallback.into());
    }
    let vm = env.get_java_vm()?;
    let callable = env.new_global_ref(func)?;
    let binding = bind_apply(arity, move |signature, args| {
        call_apply(&vm, &callable, signature, args)
    })?;
    Ok(binding.pointer)
}

/// Release the callable bound to the trampoline at `pointer`, whatever its
/// arity. Returns `false` if `pointer` is not a live trampoline.
pub(crate) fn release_pointer(pointer: Address) -> bool {
    Arity::ALL
        .iter()
        .any(|&arity| trampoline::release_pointer(arity, pointer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<(&'static str, Vec<i64>)>>>;

    /// Bind a fake `apply` that records each call and returns `result`.
    fn bind_recording(arity: Arity, result: i64) -> (Binding, Calls) {
        let calls: Calls = Arc::default();
        let log = Arc::clone(&calls);
        let binding = bind_apply(arity, move |signature, args| {
            log.lock().unwrap().push((signature, args.to_vec()));
            result
        })
        .unwrap();
        (binding, calls)
    }

    #[test]
    fn arity_one_and_two_return_apply_result() {
        let (one, calls1) = bind_recording(Arity::One, 41);
        let (two, calls2) = bind_recording(Arity::Two, -5);
        assert_eq!(one.as_fn1().unwrap()(7), 41);
        assert_eq!(two.as_fn2().unwrap()(1, 2), -5);
        assert_eq!(*calls1.lock().unwrap(), vec![("(J)J", vec![7])]);
        assert_eq!(*calls2.lock().unwrap(), vec![("(JJ)J", vec![1, 2])]);
        assert!(release_pointer(one.pointer));
        assert!(release_pointer(two.pointer));
    }

    #[test]
    fn arity_three_pointer_is_void_but_calls_long_apply() {
        let (three, calls) = bind_recording(Arity::Three, 99);
        // Only the void-returning view exists for an arity-3 binding.
        assert!(three.as_fn1().is_none());
        assert!(three.as_fn2().is_none());
        let f: extern "C" fn(i64, i64, i64) = three.as_fn3().unwrap();
        f(4, 5, 6);
        assert_eq!(*calls.lock().unwrap(), vec![("(JJJ)J", vec![4, 5, 6])]);
        assert!(release_pointer(three.pointer));
    }

    #[test]
    fn release_pointer_finds_any_arity() {
        let b = trampoline::bind3(|_, _, _| {}).unwrap();
        assert!(release_pointer(b.pointer));
        assert!(!release_pointer(b.pointer));
        assert!(!release_pointer(Address::NULL));
    }
}
