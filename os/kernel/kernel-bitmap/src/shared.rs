//! # Process-wide engine
//!
//! One [`ScanEngine`] that follows the process-wide policy selector, guarded
//! by a single global allocation lock. Every helper here holds the lock for
//! the whole find-and-claim sequence, so callers that go through this module
//! never hand out the same region twice.
//!
//! ```rust
//! use kernel_bitmap::{BitStore, Bitmap, shared};
//!
//! let sectors = Bitmap::new(64).expect("bitmap storage");
//! let first = shared::scan_and_flip(&sectors, 0, 8, false);
//! assert!(first.is_some());
//! ```

use crate::{BitStore, ScanEngine};
use spin::Mutex;

/// Global engine state protected by a spinlock.
static ENGINE: Mutex<ScanEngine> = Mutex::new(ScanEngine::new());

/// Runs `f` with exclusive access to the process-wide engine.
///
/// Do not call back into this module from `f`; the lock is not reentrant.
pub fn with_engine<R>(f: impl FnOnce(&mut ScanEngine) -> R) -> R {
    let mut engine = ENGINE.lock();
    f(&mut engine)
}

/// [`ScanEngine::scan`] on the process-wide engine.
///
/// # Panics
/// Panics if `start > bits.bit_cnt()`.
#[track_caller]
pub fn scan<B: BitStore + ?Sized>(bits: &B, start: usize, cnt: usize, value: bool) -> Option<usize> {
    with_engine(|engine| engine.scan(bits, start, cnt, value))
}

/// [`ScanEngine::scan_and_flip`] on the process-wide engine, with the lock
/// held across both steps.
///
/// # Panics
/// Panics if `start > bits.bit_cnt()`.
#[track_caller]
pub fn scan_and_flip<B: BitStore + ?Sized>(
    bits: &B,
    start: usize,
    cnt: usize,
    value: bool,
) -> Option<usize> {
    with_engine(|engine| engine.scan_and_flip(bits, start, cnt, value))
}

/// Forgets the process-wide cursor and bootstrap counters.
pub fn reset_state() {
    with_engine(ScanEngine::reset);
}
