//! First-Fit: the lowest matching offset at or after `start`.

use super::region_matches;
use crate::BitStore;

/// Returns the first `i` in `start..=bit_cnt - cnt` where `[i, i + cnt)` is
/// entirely `value`.
///
/// The caller guarantees `0 < cnt <= bit_cnt`.
pub(crate) fn scan<B: BitStore + ?Sized>(
    bits: &B,
    start: usize,
    cnt: usize,
    value: bool,
) -> Option<usize> {
    let last = bits.bit_cnt() - cnt;
    (start..=last).find(|&idx| region_matches(bits, idx, cnt, value))
}
