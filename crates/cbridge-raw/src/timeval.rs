//! `struct timeval` subtraction through raw addresses.
//!
//! The embedded language times code with `gettimeofday` and then asks for
//! the difference of two `timeval`s it only holds as addresses.

use cbridge_core::{Address, TimeDelta};

/// Compute `*later - *earlier`, store it at `result` and return it in
/// whole milliseconds.
///
/// Fields of the stored difference are split with truncating division
/// (see [`TimeDelta`]): a negative difference yields a non-positive
/// `tv_sec` and a non-positive `tv_usec`.
///
/// # Safety
///
/// `later` and `earlier` must point at readable `libc::timeval`s and
/// `result` at a writable one. `result` may alias either input.
pub unsafe fn timestamp_diff_ms(result: Address, later: Address, earlier: Address) -> i64 {
    // SAFETY: readability of both inputs is the caller's contract.
    let (t2, t1) = unsafe {
        (
            later.as_ptr::<libc::timeval>().read_unaligned(),
            earlier.as_ptr::<libc::timeval>().read_unaligned(),
        )
    };
    let delta = TimeDelta::between(
        (t2.tv_sec as i64, t2.tv_usec as i64),
        (t1.tv_sec as i64, t1.tv_usec as i64),
    );
    let out = libc::timeval {
        tv_sec: delta.secs as _,
        tv_usec: delta.micros as _,
    };
    // SAFETY: writability of `result` is the caller's contract. Both inputs
    // were copied out above, so aliasing is harmless.
    unsafe { result.as_mut_ptr::<libc::timeval>().write_unaligned(out) };
    delta.as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tv(sec: i64, usec: i64) -> libc::timeval {
        libc::timeval {
            tv_sec: sec as _,
            tv_usec: usec as _,
        }
    }

    fn diff(later: libc::timeval, earlier: libc::timeval) -> (i64, libc::timeval) {
        let mut result = tv(0, 0);
        let ms = unsafe {
            timestamp_diff_ms(
                Address::from_mut_ptr(&mut result),
                Address::from_ptr(&later),
                Address::from_ptr(&earlier),
            )
        };
        (ms, result)
    }

    #[test]
    fn positive_difference_with_borrow() {
        let (ms, r) = diff(tv(11, 200_000), tv(10, 500_000));
        assert_eq!(ms, 700);
        assert_eq!((r.tv_sec as i64, r.tv_usec as i64), (0, 700_000));
    }

    #[test]
    fn negative_difference_keeps_sign_in_both_fields() {
        let (ms, r) = diff(tv(10, 500_000), tv(11, 200_000));
        assert_eq!(ms, -700);
        assert_eq!((r.tv_sec as i64, r.tv_usec as i64), (0, -700_000));
    }

    #[test]
    fn negative_difference_over_a_second() {
        let (ms, r) = diff(tv(5, 0), tv(7, 250_000));
        assert_eq!(ms, -2250);
        assert_eq!((r.tv_sec as i64, r.tv_usec as i64), (-2, -250_000));
    }

    #[test]
    fn whole_seconds() {
        let (ms, r) = diff(tv(100, 0), tv(97, 0));
        assert_eq!(ms, 3000);
        assert_eq!((r.tv_sec as i64, r.tv_usec as i64), (3, 0));
    }

    #[test]
    fn result_may_alias_input() {
        let mut later = tv(2, 0);
        let earlier = tv(1, 999_000);
        let addr = Address::from_mut_ptr(&mut later);
        let ms = unsafe { timestamp_diff_ms(addr, addr, Address::from_ptr(&earlier)) };
        assert_eq!(ms, 1);
        assert_eq!((later.tv_sec as i64, later.tv_usec as i64), (0, 1_000));
    }
}
