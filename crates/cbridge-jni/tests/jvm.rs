//! Entry points driven through a real `JNIEnv` from an embedded JVM.
//!
//! Run with `--features jvm-tests` on a host with a JDK.

#![cfg(feature = "jvm-tests")]

use std::sync::OnceLock;

use clangnative::{
    Java_ch_epfl_data_cscala_CLangNative_00024_addr_1bytes as addr_bytes,
    Java_ch_epfl_data_cscala_CLangNative_00024_addr_1char as addr_char,
    Java_ch_epfl_data_cscala_CLangNative_00024_addr_1func3 as addr_func3,
    Java_ch_epfl_data_cscala_CLangNative_00024_addr_1long as addr_long,
    Java_ch_epfl_data_cscala_CLangNative_00024_assign_1bytes as assign_bytes,
    Java_ch_epfl_data_cscala_CLangNative_00024_assign_1long as assign_long,
    Java_ch_epfl_data_cscala_CLangNative_00024_deref_1bytes as deref_bytes,
    Java_ch_epfl_data_cscala_CLangNative_00024_deref_1char as deref_char,
    Java_ch_epfl_data_cscala_CLangNative_00024_deref_1long as deref_long,
    Java_ch_epfl_data_cscala_CLangNative_00024_eof as eof,
    Java_ch_epfl_data_cscala_CLangNative_00024_free_1func as free_func,
    Java_ch_epfl_data_cscala_CLangNative_00024_sizeof_1int as sizeof_int,
};
use jni::objects::{JByteArray, JObject};
use jni::sys::{jbyteArray, JNI_FALSE};
use jni::{InitArgsBuilder, JNIEnv, JNIVersion, JavaVM};

fn jvm() -> &'static JavaVM {
    static JVM: OnceLock<JavaVM> = OnceLock::new();
    JVM.get_or_init(|| {
        let args = InitArgsBuilder::new()
            .version(JNIVersion::V8)
            .build()
            .unwrap();
        JavaVM::new(args).unwrap()
    })
}

/// Run `f` with a `JNIEnv` attached to the current thread.
fn with_env(f: impl FnOnce(&mut JNIEnv)) {
    let mut guard = jvm().attach_current_thread().unwrap();
    f(&mut guard);
}

/// An owned env for entry points that take `JNIEnv` by value.
fn owned(env: &JNIEnv) -> JNIEnv<'static> {
    // SAFETY: only used on the attached thread while `env` is alive.
    unsafe { JNIEnv::from_raw(env.get_raw()).unwrap() }
}

fn this() -> JObject<'static> {
    JObject::null()
}

fn to_vec(env: &JNIEnv, raw: jbyteArray) -> Vec<u8> {
    // SAFETY: deref_bytes returned a live local byte array.
    let array = unsafe { JByteArray::from_raw(raw) };
    env.convert_byte_array(&array).unwrap()
}

#[test]
fn boxed_scalars_round_trip() {
    with_env(|env| {
        let l = addr_long(owned(env), this(), 7);
        assert_eq!(deref_long(owned(env), this(), l), 7);
        assign_long(owned(env), this(), l, -9);
        assert_eq!(deref_long(owned(env), this(), l), -9);

        let c = addr_char(owned(env), this(), 0x263A);
        assert_eq!(deref_char(owned(env), this(), c), 0x263A);
        assert!(!env.exception_check().unwrap());
    });
}

#[test]
fn bytes_cross_the_boundary() {
    with_env(|env| {
        let src = env.byte_array_from_slice(b"hello").unwrap();
        let addr = addr_bytes(owned(env), this(), src, 5);
        assert_ne!(addr, 0);
        assert_eq!(to_vec(env, deref_bytes(owned(env), this(), addr, 5)), b"hello");

        let patch = env.byte_array_from_slice(b"J").unwrap();
        assign_bytes(owned(env), this(), addr, patch, 1);
        assert_eq!(to_vec(env, deref_bytes(owned(env), this(), addr, 5)), b"Jello");
    });
}

#[test]
fn negative_length_throws_illegal_argument() {
    with_env(|env| {
        let bytes = env.byte_array_from_slice(b"x").unwrap();
        let cell = addr_long(owned(env), this(), 0);
        assign_bytes(owned(env), this(), cell, bytes, -1);
        assert!(env.exception_check().unwrap());
        let thrown = env.exception_occurred().unwrap();
        env.exception_clear().unwrap();
        assert!(env
            .is_instance_of(&thrown, "java/lang/IllegalArgumentException")
            .unwrap());
    });
}

#[test]
fn null_callable_throws_illegal_state() {
    with_env(|env| {
        assert_eq!(addr_func3(owned(env), this(), JObject::null()), 0);
        assert!(env.exception_check().unwrap());
        let thrown = env.exception_occurred().unwrap();
        env.exception_clear().unwrap();
        assert!(env
            .is_instance_of(&thrown, "java/lang/IllegalStateException")
            .unwrap());
    });
}

#[test]
fn free_func_rejects_unbound_pointer() {
    with_env(|env| {
        assert_eq!(free_func(owned(env), this(), 0), JNI_FALSE);
    });
}

#[test]
fn host_utilities() {
    with_env(|env| {
        assert_eq!(sizeof_int(owned(env), this()), 4);
        assert_eq!(eof(owned(env), this()), -1);
    });
}
