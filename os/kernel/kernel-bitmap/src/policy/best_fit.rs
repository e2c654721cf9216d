//! Best-Fit: the fitting run that leaves the least slack.

use super::run_length;
use crate::BitStore;
use log::trace;

/// Walks every maximal run of `value` in `[start, bit_cnt)` and returns the
/// start of the run with the smallest `len - cnt` among runs with
/// `len >= cnt`. Earlier runs win ties.
///
/// The caller guarantees `0 < cnt <= bit_cnt`.
pub(crate) fn scan<B: BitStore + ?Sized>(
    bits: &B,
    start: usize,
    cnt: usize,
    value: bool,
) -> Option<usize> {
    let end = bits.bit_cnt();
    // (offset, slack)
    let mut best: Option<(usize, usize)> = None;

    let mut idx = start;
    while idx < end {
        if bits.test(idx) != value {
            idx += 1;
            continue;
        }

        let run = run_length(bits, idx, end, value);
        let run_start = idx;
        idx += run;

        let Some(slack) = run.checked_sub(cnt) else {
            continue;
        };
        if best.is_none_or(|(_, best_slack)| slack < best_slack) {
            trace!("best-fit candidate at {run_start}: run {run}, slack {slack}");
            best = Some((run_start, slack));
            if slack == 0 {
                break;
            }
        }
    }

    best.map(|(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bitmap;

    #[test]
    fn prefers_exact_fit() {
        // free [0, 4), used [4, 10), free [10, 12)
        let b = Bitmap::new(12).unwrap();
        b.set_multiple(4, 6, true);
        assert_eq!(scan(&b, 0, 2, false), Some(10));
    }

    #[test]
    fn earliest_wins_ties() {
        // free runs of 3 at 0 and 3 at 5
        let b = Bitmap::new(8).unwrap();
        b.set_multiple(3, 2, true);
        assert_eq!(scan(&b, 0, 2, false), Some(0));
    }

    #[test]
    fn picks_smallest_slack_not_first() {
        // free runs: 6 at 0, 4 at 7, 3 at 12 (to the end)
        let b = Bitmap::new(15).unwrap();
        b.mark(6);
        b.mark(11);
        assert_eq!(scan(&b, 0, 3, false), Some(12));
        assert_eq!(scan(&b, 0, 4, false), Some(7));
        assert_eq!(scan(&b, 0, 5, false), Some(0));
        assert_eq!(scan(&b, 0, 7, false), None);
    }

    #[test]
    fn run_touching_the_end_counts() {
        let b = Bitmap::new(10).unwrap();
        b.set_multiple(0, 8, true);
        assert_eq!(scan(&b, 0, 2, false), Some(8));
    }

    #[test]
    fn starts_inside_a_run() {
        let b = Bitmap::new(10).unwrap();
        assert_eq!(scan(&b, 6, 4, false), Some(6));
        assert_eq!(scan(&b, 7, 4, false), None);
    }
}
