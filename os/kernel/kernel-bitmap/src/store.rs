//! # Packed bit storage and range operations

use core::sync::atomic::{AtomicUsize, Ordering};

/// Number of logical bits held by one storage word.
pub const WORD_BITS: usize = usize::BITS as usize;

/// Size of one storage word in bytes.
pub const WORD_BYTES: usize = size_of::<usize>();

/// Index of the word holding `bit_idx`.
#[inline]
pub(crate) const fn word_index(bit_idx: usize) -> usize {
    bit_idx / WORD_BITS
}

/// Word with only the bit for `bit_idx` set.
#[inline]
pub(crate) const fn bit_mask(bit_idx: usize) -> usize {
    1 << (bit_idx % WORD_BITS)
}

/// Number of words required for `bit_cnt` bits.
#[inline]
#[must_use]
pub const fn word_count(bit_cnt: usize) -> usize {
    bit_cnt.div_ceil(WORD_BITS)
}

/// Number of bytes required for `bit_cnt` bits.
#[inline]
#[must_use]
pub const fn byte_count(bit_cnt: usize) -> usize {
    word_count(bit_cnt) * WORD_BYTES
}

/// Mask of the bits actually in use in the last word of a `bit_cnt`-bit store.
#[inline]
pub(crate) const fn last_word_mask(bit_cnt: usize) -> usize {
    let last_bits = bit_cnt % WORD_BITS;
    if last_bits == 0 {
        !0
    } else {
        (1 << last_bits) - 1
    }
}

#[inline]
#[track_caller]
fn check_index(bit_cnt: usize, idx: usize) {
    assert!(
        idx < bit_cnt,
        "bit index {idx} out of range for bitmap of {bit_cnt} bits"
    );
}

#[inline]
#[track_caller]
fn check_range(bit_cnt: usize, start: usize, cnt: usize) {
    let end = start.checked_add(cnt);
    assert!(
        end.is_some_and(|end| end <= bit_cnt),
        "bit range {start}+{cnt} out of range for bitmap of {bit_cnt} bits"
    );
}

/// A fixed-capacity packed bit vector.
///
/// Implementors only expose their word slice and logical size; every bit and
/// range operation is provided on top of that.
///
/// # Invariants
/// - `words().len() == word_count(bit_cnt())`.
/// - Bits at logical index `>= bit_cnt()` inside the last word are zero.
///
/// # Atomicity
/// [`mark`](Self::mark), [`reset`](Self::reset), [`flip`](Self::flip) and
/// [`set`](Self::set) are single atomic read-modify-write operations on the
/// owning word. Everything that touches more than one bit is a sequence of
/// those and may be observed partially applied.
pub trait BitStore {
    /// Number of logical bits.
    fn bit_cnt(&self) -> usize;

    /// The packed words backing the bits.
    fn words(&self) -> &[AtomicUsize];

    /// Number of logical bits; same as [`bit_cnt`](Self::bit_cnt).
    fn size(&self) -> usize {
        self.bit_cnt()
    }

    /// Atomically sets bit `idx` to `value`.
    ///
    /// # Panics
    /// Panics if `idx >= bit_cnt()`.
    #[track_caller]
    fn set(&self, idx: usize, value: bool) {
        if value {
            self.mark(idx);
        } else {
            self.reset(idx);
        }
    }

    /// Atomically sets bit `idx` to `true`.
    ///
    /// # Panics
    /// Panics if `idx >= bit_cnt()`.
    #[track_caller]
    fn mark(&self, idx: usize) {
        check_index(self.bit_cnt(), idx);
        self.words()[word_index(idx)].fetch_or(bit_mask(idx), Ordering::AcqRel);
    }

    /// Atomically sets bit `idx` to `false`.
    ///
    /// # Panics
    /// Panics if `idx >= bit_cnt()`.
    #[track_caller]
    fn reset(&self, idx: usize) {
        check_index(self.bit_cnt(), idx);
        self.words()[word_index(idx)].fetch_and(!bit_mask(idx), Ordering::AcqRel);
    }

    /// Atomically toggles bit `idx`.
    ///
    /// # Panics
    /// Panics if `idx >= bit_cnt()`.
    #[track_caller]
    fn flip(&self, idx: usize) {
        check_index(self.bit_cnt(), idx);
        self.words()[word_index(idx)].fetch_xor(bit_mask(idx), Ordering::AcqRel);
    }

    /// Returns the value of bit `idx`.
    ///
    /// # Panics
    /// Panics if `idx >= bit_cnt()`.
    #[track_caller]
    fn test(&self, idx: usize) -> bool {
        check_index(self.bit_cnt(), idx);
        self.words()[word_index(idx)].load(Ordering::Acquire) & bit_mask(idx) != 0
    }

    /// Sets every bit to `value`.
    fn set_all(&self, value: bool) {
        self.set_multiple(0, self.bit_cnt(), value);
    }

    /// Sets the `cnt` bits starting at `start` to `value`, one bit at a time.
    ///
    /// # Panics
    /// Panics if `start + cnt > bit_cnt()`.
    #[track_caller]
    fn set_multiple(&self, start: usize, cnt: usize, value: bool) {
        check_range(self.bit_cnt(), start, cnt);
        for idx in start..start + cnt {
            self.set(idx, value);
        }
    }

    /// Number of bits in `[start, start + cnt)` equal to `value`.
    ///
    /// # Panics
    /// Panics if `start + cnt > bit_cnt()`.
    #[track_caller]
    fn count(&self, start: usize, cnt: usize, value: bool) -> usize {
        check_range(self.bit_cnt(), start, cnt);
        (start..start + cnt)
            .filter(|&idx| self.test(idx) == value)
            .count()
    }

    /// Whether any bit in `[start, start + cnt)` equals `value`.
    ///
    /// # Panics
    /// Panics if `start + cnt > bit_cnt()`.
    #[track_caller]
    fn contains(&self, start: usize, cnt: usize, value: bool) -> bool {
        check_range(self.bit_cnt(), start, cnt);
        (start..start + cnt).any(|idx| self.test(idx) == value)
    }

    /// Whether any bit in `[start, start + cnt)` is set.
    #[track_caller]
    fn any(&self, start: usize, cnt: usize) -> bool {
        self.contains(start, cnt, true)
    }

    /// Whether no bit in `[start, start + cnt)` is set.
    #[track_caller]
    fn none(&self, start: usize, cnt: usize) -> bool {
        !self.contains(start, cnt, true)
    }

    /// Whether every bit in `[start, start + cnt)` is set.
    #[track_caller]
    fn all(&self, start: usize, cnt: usize) -> bool {
        !self.contains(start, cnt, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_math() {
        assert_eq!(word_count(0), 0);
        assert_eq!(word_count(1), 1);
        assert_eq!(word_count(WORD_BITS), 1);
        assert_eq!(word_count(WORD_BITS + 1), 2);
        assert_eq!(byte_count(WORD_BITS + 1), 2 * WORD_BYTES);
        assert_eq!(word_index(WORD_BITS + 3), 1);
        assert_eq!(bit_mask(WORD_BITS + 3), 0b1000);
    }

    #[test]
    fn last_mask_covers_used_bits_only() {
        assert_eq!(last_word_mask(3), 0b111);
        assert_eq!(last_word_mask(WORD_BITS), !0);
        assert_eq!(last_word_mask(2 * WORD_BITS + 1), 1);
    }
}
