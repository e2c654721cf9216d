//! # Bitmaps placed in caller-supplied memory
//!
//! A [`BitmapView`] carves its header and packed words out of a byte buffer
//! the caller owns, e.g. a reserved region at the start of the resource it
//! tracks. The view only borrows the buffer; dropping it releases nothing.
//!
//! Buffer layout:
//!
//! ```text
//! +--------------------+----------------------------------+
//! | bit_cnt (usize)    | words[word_count(bit_cnt)]       |
//! +--------------------+----------------------------------+
//! ^ buf                ^ buf + HEADER_SIZE
//! ```

use crate::store::{BitStore, byte_count, last_word_mask, word_count};
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Bytes taken by the header in front of the packed words.
pub const HEADER_SIZE: usize = size_of::<usize>();

/// Minimum buffer size for an in-buffer bitmap of `bit_cnt` bits.
#[inline]
#[must_use]
pub const fn buf_size(bit_cnt: usize) -> usize {
    HEADER_SIZE + byte_count(bit_cnt)
}

/// A bitmap that lives in borrowed storage.
pub struct BitmapView<'a> {
    bit_cnt: usize,
    words: &'a [AtomicUsize],
}

impl<'a> BitmapView<'a> {
    /// Places a cleared bitmap of `bit_cnt` bits at the start of `buf`.
    ///
    /// # Panics
    /// Panics if `buf` is shorter than [`buf_size(bit_cnt)`](buf_size) or not
    /// aligned to `usize`.
    #[must_use]
    #[track_caller]
    pub fn in_buffer(bit_cnt: usize, buf: &'a mut [u8]) -> Self {
        let slots = carve(buf, bit_cnt);
        slots[0].store(bit_cnt, Ordering::Release);
        let view = Self {
            bit_cnt,
            words: &slots[1..],
        };
        view.set_all(false);
        view
    }

    /// Re-attaches to a buffer previously initialized by
    /// [`in_buffer`](Self::in_buffer), keeping its contents.
    ///
    /// Bits past `bit_cnt` in the last word are cleared.
    ///
    /// # Panics
    /// Panics if `buf` is misaligned or too short for the bit count recorded
    /// in its header.
    #[must_use]
    #[track_caller]
    pub fn from_buffer(buf: &'a mut [u8]) -> Self {
        assert!(
            buf.len() >= HEADER_SIZE,
            "bitmap buffer of {} bytes has no room for a header",
            buf.len()
        );
        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&buf[..HEADER_SIZE]);
        let bit_cnt = usize::from_ne_bytes(header);

        let slots = carve(buf, bit_cnt);
        let words = &slots[1..];
        if let Some(last) = words.last() {
            last.fetch_and(last_word_mask(bit_cnt), Ordering::AcqRel);
        }
        Self { bit_cnt, words }
    }
}

/// Reinterprets the front of `buf` as a header word followed by the words for
/// `bit_cnt` bits.
#[track_caller]
fn carve(buf: &mut [u8], bit_cnt: usize) -> &[AtomicUsize] {
    let needed = buf_size(bit_cnt);
    assert!(
        buf.len() >= needed,
        "bitmap buffer of {} bytes is smaller than the {needed} bytes needed for {bit_cnt} bits",
        buf.len()
    );
    assert!(
        buf.as_ptr().cast::<usize>().is_aligned(),
        "bitmap buffer must be aligned to {} bytes",
        align_of::<usize>()
    );

    // SAFETY: the buffer is aligned for and long enough to hold
    // `1 + word_count(bit_cnt)` words. `AtomicUsize` has the size, alignment
    // and bit validity of `usize`, and any byte pattern is a valid `usize`.
    // The exclusive borrow of `buf` is held for the lifetime of the result.
    unsafe {
        core::slice::from_raw_parts(
            buf.as_mut_ptr().cast::<AtomicUsize>(),
            1 + word_count(bit_cnt),
        )
    }
}

impl BitStore for BitmapView<'_> {
    #[inline]
    fn bit_cnt(&self) -> usize {
        self.bit_cnt
    }

    #[inline]
    fn words(&self) -> &[AtomicUsize] {
        self.words
    }
}

impl fmt::Debug for BitmapView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapView")
            .field("bit_cnt", &self.bit_cnt)
            .field("set", &self.count(0, self.bit_cnt, true))
            .finish()
    }
}
