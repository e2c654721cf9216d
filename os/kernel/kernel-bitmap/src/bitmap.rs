//! # Heap-owned bitmap

use crate::BitmapError;
use crate::store::{BitStore, word_count};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::AtomicUsize;

/// A bitmap that owns its packed words on the heap.
///
/// The capacity is fixed at construction. Dropping the bitmap releases the
/// storage.
pub struct Bitmap {
    bit_cnt: usize,
    words: Box<[AtomicUsize]>,
}

impl Bitmap {
    /// Creates a bitmap of `bit_cnt` bits, all cleared.
    ///
    /// # Errors
    /// Returns [`BitmapError::OutOfMemory`] if the word storage cannot be
    /// allocated.
    pub fn new(bit_cnt: usize) -> Result<Self, BitmapError> {
        let words = word_count(bit_cnt);
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(words)
            .map_err(|_| BitmapError::OutOfMemory { bit_cnt })?;
        storage.extend((0..words).map(|_| AtomicUsize::new(0)));

        Ok(Self {
            bit_cnt,
            words: storage.into_boxed_slice(),
        })
    }
}

impl BitStore for Bitmap {
    #[inline]
    fn bit_cnt(&self) -> usize {
        self.bit_cnt
    }

    #[inline]
    fn words(&self) -> &[AtomicUsize] {
        &self.words
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("bit_cnt", &self.bit_cnt)
            .field("set", &self.count(0, self.bit_cnt, true))
            .finish()
    }
}
