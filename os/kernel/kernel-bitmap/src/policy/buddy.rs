//! Buddy-System approximation.
//!
//! A scan-based stand-in for a buddy allocator: requests are rounded up to a
//! power-of-two block, and a probe walks a fixed span in block-sized steps,
//! jumping over occupied runs by their size rounded up to a power of two.
//! There are no per-order free lists and no split/merge; see
//! [`BuddyTree`](crate::buddy_tree::BuddyTree) for that.
//!
//! ## Bootstrap
//!
//! The first [`BUDDY_BOOTSTRAP_CALLS`] scans through an engine start probing
//! at offset 0 and add their request size to a running total. From then on
//! every scan starts probing at that total, and the probed span always ends
//! at [`BUDDY_SPAN`] plus the total.
//!
//! ```text
//!  0                base = Σ bootstrap sizes           base + 512
//!  ├─ bootstrap ────┼──────────── probed span ─────────────┤
//! ```

use super::{region_matches, run_length};
use crate::{BitStore, PolicyState};
use log::{debug, trace, warn};

/// Units addressable by one buddy span.
pub const BUDDY_SPAN: usize = 512;

/// Longest occupied run the probe can skip over.
pub const BUDDY_MAX_RUN: usize = BUDDY_SPAN / 2;

/// Number of scans that accumulate the search base.
pub const BUDDY_BOOTSTRAP_CALLS: usize = 3;

/// Block size for a request of `cnt` units.
///
/// Equivalent to halving a bound from [`BUDDY_SPAN`] until `cnt` exceeds it
/// and taking twice the bound; a single unit probes single bits.
#[inline]
#[must_use]
pub const fn block_size(cnt: usize) -> usize {
    cnt.next_power_of_two()
}

/// The caller guarantees `0 < cnt <= bit_cnt`. `start` does not apply.
pub(crate) fn scan<B: BitStore + ?Sized>(
    bits: &B,
    state: &mut PolicyState,
    cnt: usize,
    value: bool,
) -> Option<usize> {
    let mut probe = if state.call_count < BUDDY_BOOTSTRAP_CALLS {
        state.call_count += 1;
        state.cumulative_request_size += cnt;
        debug!(
            "buddy bootstrap {}/{BUDDY_BOOTSTRAP_CALLS}: base now {}",
            state.call_count, state.cumulative_request_size
        );
        0
    } else {
        state.cumulative_request_size
    };

    if cnt > BUDDY_SPAN {
        warn!("buddy request of {cnt} units exceeds the {BUDDY_SPAN}-unit span");
        return None;
    }

    let block = block_size(cnt);
    let bit_cnt = bits.bit_cnt();
    let span_end = BUDDY_SPAN + state.cumulative_request_size;
    let limit = span_end.min(bit_cnt);

    while probe < limit {
        if bits.test(probe) == value {
            if probe + block > bit_cnt {
                trace!("buddy block of {block} at {probe} runs past the bitmap");
                return None;
            }
            if region_matches(bits, probe, block, value) {
                return Some(probe);
            }
            probe += block;
            continue;
        }

        let run = run_length(bits, probe, limit, !value);
        if probe + run >= limit {
            trace!("buddy probe at {probe}: occupied through the end of the span");
            return None;
        }
        if run > BUDDY_MAX_RUN {
            trace!("buddy probe at {probe}: occupied run of {run} is too long");
            return None;
        }

        let skip = run.next_power_of_two().max(block);
        trace!("buddy probe at {probe}: occupied run of {run}, skipping {skip}");
        probe += skip;
    }

    trace!("buddy probe passed the span end at {limit}");
    None
}
