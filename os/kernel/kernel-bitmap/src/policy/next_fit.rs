//! Next-Fit: First-Fit resuming at the previous success.

use super::region_matches;
use crate::{BitStore, PolicyState};

/// Scans `[cursor, bit_cnt - cnt]`, then wraps to `[start, cursor]`.
///
/// The cursor is shared by every bitmap scanned through the same engine, so
/// it may point past the end of a smaller bitmap; the wrap pass is clamped to
/// the last valid offset.
///
/// The caller guarantees `0 < cnt <= bit_cnt`.
pub(crate) fn scan<B: BitStore + ?Sized>(
    bits: &B,
    state: &mut PolicyState,
    start: usize,
    cnt: usize,
    value: bool,
) -> Option<usize> {
    let last = bits.bit_cnt() - cnt;
    let cursor = state.cursor;

    let found = (cursor..=last)
        .find(|&idx| region_matches(bits, idx, cnt, value))
        .or_else(|| {
            (start..=cursor.min(last)).find(|&idx| region_matches(bits, idx, cnt, value))
        })?;

    state.cursor = found;
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bitmap;

    #[test]
    fn resumes_from_cursor() {
        let b = Bitmap::new(10).unwrap();
        b.set_multiple(2, 3, true);
        let mut state = PolicyState::new();

        assert_eq!(scan(&b, &mut state, 0, 3, false), Some(5));
        assert_eq!(state.cursor(), 5);

        // [0, 2) is free but lies behind the cursor.
        assert_eq!(scan(&b, &mut state, 0, 2, false), Some(5));
    }

    #[test]
    fn wraps_when_tail_is_exhausted() {
        let b = Bitmap::new(10).unwrap();
        b.set_multiple(2, 3, true);
        let mut state = PolicyState::new();

        assert_eq!(scan(&b, &mut state, 0, 3, false), Some(5));
        b.set_multiple(5, 3, true);
        assert_eq!(scan(&b, &mut state, 0, 2, false), Some(8));
        b.set_multiple(8, 2, true);
        assert_eq!(scan(&b, &mut state, 0, 2, false), Some(0));
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn wrap_starts_at_start_not_zero() {
        // Free: [1, 3), [6, 8); cursor ends up at 12 with the tail exhausted.
        let b = Bitmap::new(20).unwrap();
        b.set_all(true);
        b.set_multiple(12, 2, false);
        let mut state = PolicyState::new();
        assert_eq!(scan(&b, &mut state, 0, 2, false), Some(12));
        b.set_multiple(12, 2, true);
        b.set_multiple(1, 2, false);
        b.set_multiple(6, 2, false);

        assert_eq!(scan(&b, &mut state, 4, 2, false), Some(6));
        assert_eq!(state.cursor(), 6);
    }

    #[test]
    fn failure_leaves_cursor() {
        let b = Bitmap::new(10).unwrap();
        let mut state = PolicyState::new();
        assert_eq!(scan(&b, &mut state, 0, 4, false), Some(0));
        b.set_multiple(0, 4, true);
        assert_eq!(scan(&b, &mut state, 0, 4, false), Some(4));
        b.set_multiple(4, 4, true);
        assert_eq!(scan(&b, &mut state, 0, 4, false), None);
        assert_eq!(state.cursor(), 4);
    }

    #[test]
    fn cursor_beyond_smaller_bitmap() {
        let big = Bitmap::new(64).unwrap();
        big.set_multiple(0, 40, true);
        let mut state = PolicyState::new();
        assert_eq!(scan(&big, &mut state, 0, 4, false), Some(40));

        let small = Bitmap::new(16).unwrap();
        small.set_multiple(0, 3, true);
        assert_eq!(scan(&small, &mut state, 0, 4, false), Some(3));
        assert_eq!(state.cursor(), 3);
    }
}
