//! Managed callbacks as plain native function pointers.
//!
//! Native APIs that take C function pointers cannot carry a closure, so
//! each arity owns a pool of [`POOL_SIZE`] pre-built `extern "C"`
//! trampolines. Trampoline `i` is `entryN::<i>`: its slot index is baked in
//! as a const generic, so when native code calls it, it knows which
//! registry slot to dispatch to without consulting any "current callback"
//! global. Binding a callback claims a free slot and hands out that slot's
//! function pointer; several callbacks of the same arity can be live at
//! once.
//!
//! ```text
//! native caller ──► entry2::<5>(a, b)
//!                     └─► REGISTRY.tables[Two].get_at(5) ──► callback(&[a, b])
//! ```
//!
//! A released slot is reused by the next bind of that arity, so a stale
//! pointer kept by native code calls whatever is bound there now. Calling
//! a pointer whose slot is empty aborts the process.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cbridge_core::{Address, Arity, BridgeError};

use crate::handle::{decode, HandleTable};

/// Trampolines per arity.
pub const POOL_SIZE: usize = 64;

/// A bound callback. Receives exactly `arity.count()` arguments.
pub type Callback = Arc<dyn Fn(&[i64]) -> i64 + Send + Sync>;

/// Native signature of an arity-1 trampoline.
pub type Trampoline1 = extern "C" fn(i64) -> i64;
/// Native signature of an arity-2 trampoline.
pub type Trampoline2 = extern "C" fn(i64, i64) -> i64;
/// Native signature of an arity-3 trampoline (void).
pub type Trampoline3 = extern "C" fn(i64, i64, i64);

extern "C" fn entry1<const SLOT: u32>(a: i64) -> i64 {
    invoke(Arity::One, SLOT, &[a])
}

extern "C" fn entry2<const SLOT: u32>(a: i64, b: i64) -> i64 {
    invoke(Arity::Two, SLOT, &[a, b])
}

extern "C" fn entry3<const SLOT: u32>(a: i64, b: i64, c: i64) {
    invoke(Arity::Three, SLOT, &[a, b, c]);
}

macro_rules! pool {
    ($entry:ident, $ty:ty) => {
        pool!(@slots $entry, $ty;
            0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15
            16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
            32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47
            48 49 50 51 52 53 54 55 56 57 58 59 60 61 62 63)
    };
    (@slots $entry:ident, $ty:ty; $($slot:literal)*) => {
        [$($entry::<$slot> as $ty),*]
    };
}

static POOL1: [Trampoline1; POOL_SIZE] = pool!(entry1, Trampoline1);
static POOL2: [Trampoline2; POOL_SIZE] = pool!(entry2, Trampoline2);
static POOL3: [Trampoline3; POOL_SIZE] = pool!(entry3, Trampoline3);

/// Native function pointer of the trampoline owning `slot`.
fn pointer_of(arity: Arity, slot: u32) -> Address {
    let f = match arity {
        Arity::One => POOL1[slot as usize] as *const (),
        Arity::Two => POOL2[slot as usize] as *const (),
        Arity::Three => POOL3[slot as usize] as *const (),
    };
    Address::from_ptr(f)
}

/// Slot whose trampoline lives at `pointer`.
fn slot_of(arity: Arity, pointer: Address) -> Option<u32> {
    (0..POOL_SIZE as u32).find(|&slot| pointer_of(arity, slot) == pointer)
}

/// Opaque, copyable name of one binding.
///
/// Raw layout: bits 56..64 = arity, bits 0..56 = slot+generation handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackToken {
    arity: Arity,
    handle: u64,
}

impl CallbackToken {
    const ARITY_SHIFT: u32 = 56;
    const HANDLE_MASK: u64 = (1 << Self::ARITY_SHIFT) - 1;

    /// Encode for the C boundary.
    pub fn to_raw(self) -> u64 {
        ((self.arity.count() as u64) << Self::ARITY_SHIFT) | self.handle
    }

    /// Decode a raw token. `None` if the arity bits are not 1, 2 or 3.
    pub fn from_raw(raw: u64) -> Option<Self> {
        let arity = Arity::from_count((raw >> Self::ARITY_SHIFT) as u32)?;
        Some(Self {
            arity,
            handle: raw & Self::HANDLE_MASK,
        })
    }

    /// Arity of the bound callback.
    pub fn arity(self) -> Arity {
        self.arity
    }

    /// Trampoline slot.
    pub fn slot(self) -> u32 {
        decode(self.handle).0
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.to_raw())
    }
}

/// A live binding: who to release, and what to hand to native code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Token for [`release`].
    pub token: CallbackToken,
    /// Native function pointer of the trampoline.
    pub pointer: Address,
}

impl Binding {
    /// The pointer as a callable arity-1 function, if this is an arity-1 binding.
    pub fn as_fn1(&self) -> Option<Trampoline1> {
        if self.token.arity != Arity::One {
            return None;
        }
        POOL1.get(self.token.slot() as usize).copied()
    }

    /// The pointer as a callable arity-2 function, if this is an arity-2 binding.
    pub fn as_fn2(&self) -> Option<Trampoline2> {
        if self.token.arity != Arity::Two {
            return None;
        }
        POOL2.get(self.token.slot() as usize).copied()
    }

    /// The pointer as a callable arity-3 function, if this is an arity-3 binding.
    pub fn as_fn3(&self) -> Option<Trampoline3> {
        if self.token.arity != Arity::Three {
            return None;
        }
        POOL3.get(self.token.slot() as usize).copied()
    }
}

/// Per-arity tables of bound callbacks.
pub struct Registry {
    tables: [HandleTable<Callback>; 3],
}

impl Registry {
    /// Empty registry with [`POOL_SIZE`] slots per arity.
    pub const fn new() -> Self {
        Self::with_capacity(POOL_SIZE as u32)
    }

    /// Empty registry with fewer slots per arity. `limit` is clamped to
    /// [`POOL_SIZE`] since there are no trampolines beyond it.
    pub const fn with_capacity(limit: u32) -> Self {
        let limit = if limit > POOL_SIZE as u32 {
            POOL_SIZE as u32
        } else {
            limit
        };
        Self {
            tables: [
                HandleTable::bounded(limit),
                HandleTable::bounded(limit),
                HandleTable::bounded(limit),
            ],
        }
    }

    /// Retain `callback` and claim a trampoline for it.
    pub fn bind(&mut self, arity: Arity, callback: Callback) -> Result<Binding, BridgeError> {
        let table = &mut self.tables[arity.index()];
        let Some(handle) = table.insert(callback) else {
            let capacity = table.limit() as usize;
            log::warn!("arity-{arity} trampoline pool exhausted ({capacity} live callbacks)");
            return Err(BridgeError::PoolExhausted { arity, capacity });
        };
        let token = CallbackToken { arity, handle };
        let pointer = pointer_of(arity, token.slot());
        log::debug!("bound arity-{arity} callback {token} at {pointer}");
        Ok(Binding { token, pointer })
    }

    /// Unbind the callback behind `token` and free its trampoline.
    ///
    /// The callback is handed back so the caller can drop it once no lock
    /// is held.
    pub fn release(&mut self, token: CallbackToken) -> Result<Callback, BridgeError> {
        match self.tables[token.arity.index()].remove(token.handle) {
            Some(callback) => {
                log::debug!("released arity-{} callback {token}", token.arity);
                Ok(callback)
            }
            None => Err(BridgeError::StaleToken {
                token: token.to_raw(),
            }),
        }
    }

    /// Release whatever is bound to the trampoline at `pointer`.
    ///
    /// Returns `None` if `pointer` is not a trampoline of this arity or
    /// its slot is empty.
    pub fn release_pointer(&mut self, arity: Arity, pointer: Address) -> Option<Callback> {
        let table = &mut self.tables[arity.index()];
        let handle = slot_of(arity, pointer).and_then(|slot| table.handle_at(slot))?;
        table.remove(handle)
    }

    /// The callback bound to a trampoline slot, if any.
    pub fn lookup(&self, arity: Arity, slot: u32) -> Option<Callback> {
        self.tables[arity.index()].get_at(slot).cloned()
    }

    /// Release every binding of every arity and hand back the callbacks.
    pub fn clear(&mut self) -> Vec<Callback> {
        let released: Vec<Callback> = self.tables.iter_mut().flat_map(|t| t.clear()).collect();
        if !released.is_empty() {
            log::debug!("released {} callbacks", released.len());
        }
        released
    }

    /// Live bindings of one arity.
    pub fn live_count(&self, arity: Arity) -> usize {
        self.tables[arity.index()].len()
    }

    /// Slots per arity.
    pub fn capacity(&self) -> usize {
        self.tables[0].limit() as usize
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: Mutex<Registry> = Mutex::new(Registry::new());

/// The process-wide registry the trampolines dispatch through.
///
/// Registry operations never leave it half-updated, so a poisoned lock is
/// recovered rather than reported.
pub(crate) fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Log and abort. Nothing can be returned to a native caller that expects
/// a result from a callback that does not exist.
fn fatal(msg: fmt::Arguments<'_>) -> ! {
    log::error!("{msg}");
    eprintln!("cbridge: fatal: {msg}");
    std::process::abort()
}

fn invoke(arity: Arity, slot: u32, args: &[i64]) -> i64 {
    // The registry lock is released before the callback runs so that the
    // callback may bind, release or invoke other callbacks.
    let callback = registry().lookup(arity, slot);
    let Some(callback) = callback else {
        fatal(format_args!(
            "arity-{arity} trampoline {slot} called with no bound callback"
        ));
    };
    match panic::catch_unwind(AssertUnwindSafe(|| callback(args))) {
        Ok(result) => result,
        Err(_) => fatal(format_args!(
            "arity-{arity} callback in trampoline {slot} panicked"
        )),
    }
}

/// Bind `callback` in the process-wide registry.
pub fn bind(arity: Arity, callback: Callback) -> Result<Binding, BridgeError> {
    registry().bind(arity, callback)
}

/// Bind a `(long) -> long` callback.
pub fn bind1<F>(f: F) -> Result<Binding, BridgeError>
where
    F: Fn(i64) -> i64 + Send + Sync + 'static,
{
    bind(Arity::One, Arc::new(move |args: &[i64]| f(args[0])))
}

/// Bind a `(long, long) -> long` callback.
pub fn bind2<F>(f: F) -> Result<Binding, BridgeError>
where
    F: Fn(i64, i64) -> i64 + Send + Sync + 'static,
{
    bind(Arity::Two, Arc::new(move |args: &[i64]| f(args[0], args[1])))
}

/// Bind a `(long, long, long) -> void` callback.
pub fn bind3<F>(f: F) -> Result<Binding, BridgeError>
where
    F: Fn(i64, i64, i64) + Send + Sync + 'static,
{
    bind(
        Arity::Three,
        Arc::new(move |args: &[i64]| {
            f(args[0], args[1], args[2]);
            0
        }),
    )
}

// Released callbacks are dropped only after the registry guard is gone:
// a captured value's destructor may call back into the bridge.

/// Release a binding from the process-wide registry.
pub fn release(token: CallbackToken) -> Result<(), BridgeError> {
    let callback = registry().release(token)?;
    drop(callback);
    Ok(())
}

/// Release the binding behind a trampoline pointer.
pub fn release_pointer(arity: Arity, pointer: Address) -> bool {
    let callback = registry().release_pointer(arity, pointer);
    callback.is_some()
}

/// Release every binding. Pointers handed out so far must not be called again.
pub fn clear() -> usize {
    let released = registry().clear();
    released.len()
}

/// Live bindings of one arity in the process-wide registry.
pub fn live_count(arity: Arity) -> usize {
    registry().live_count(arity)
}
