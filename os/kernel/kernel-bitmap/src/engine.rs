//! # Scan engine
//!
//! [`ScanEngine`] runs the placement policies and carries the state they
//! keep between calls. The state belongs to the engine, not to any bitmap:
//! scanning several bitmaps through one engine makes them share a Next-Fit
//! cursor and a Buddy-System base.

use crate::policy::{self, Policy, active_policy};
use crate::BitStore;
use log::debug;

/// State carried from one scan to the next.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PolicyState {
    /// Offset of the last Next-Fit success.
    pub(crate) cursor: usize,
    /// Buddy-System scans seen during the bootstrap phase.
    pub(crate) call_count: usize,
    /// Sum of the Buddy-System bootstrap request sizes.
    pub(crate) cumulative_request_size: usize,
}

impl PolicyState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cursor: 0,
            call_count: 0,
            cumulative_request_size: 0,
        }
    }

    /// Where the next Next-Fit scan starts.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of Buddy-System scans counted so far (saturates at the
    /// bootstrap length).
    #[must_use]
    pub const fn call_count(&self) -> usize {
        self.call_count
    }

    /// The Buddy-System search base once bootstrapping is over.
    #[must_use]
    pub const fn cumulative_request_size(&self) -> usize {
        self.cumulative_request_size
    }
}

/// Search-and-claim engine.
///
/// An engine either follows the process-wide selector
/// ([`set_active_policy`](crate::set_active_policy)) or is pinned to one
/// policy. Scans need `&mut self`; callers sharing an engine must serialize
/// access to it, not just to the bitmaps.
#[derive(Debug, Default, Clone)]
pub struct ScanEngine {
    pinned: Option<Policy>,
    state: PolicyState,
}

impl ScanEngine {
    /// An engine that reads the process-wide policy on every scan.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pinned: None,
            state: PolicyState::new(),
        }
    }

    /// An engine that always uses `policy`.
    #[must_use]
    pub const fn with_policy(policy: Policy) -> Self {
        Self {
            pinned: Some(policy),
            state: PolicyState::new(),
        }
    }

    /// The policy the next scan will use.
    #[must_use]
    pub fn policy(&self) -> Policy {
        self.pinned.unwrap_or_else(active_policy)
    }

    #[must_use]
    pub const fn state(&self) -> &PolicyState {
        &self.state
    }

    /// Forgets the cursor and the bootstrap counters.
    pub const fn reset(&mut self) {
        self.state = PolicyState::new();
    }

    /// Finds `cnt` consecutive bits equal to `value`, searching no earlier
    /// than `start` (the Buddy-System policy picks its own start).
    ///
    /// Returns the offset of the region, `Some(0)` for `cnt == 0`, and `None`
    /// when the policy finds no fit or `cnt > bit_cnt`. Neither degenerate
    /// case touches the policy state.
    ///
    /// # Panics
    /// Panics if `start > bits.bit_cnt()`.
    #[track_caller]
    pub fn scan<B: BitStore + ?Sized>(
        &mut self,
        bits: &B,
        start: usize,
        cnt: usize,
        value: bool,
    ) -> Option<usize> {
        let bit_cnt = bits.bit_cnt();
        assert!(
            start <= bit_cnt,
            "scan start {start} out of range for bitmap of {bit_cnt} bits"
        );

        if cnt == 0 {
            return Some(0);
        }
        if cnt > bit_cnt {
            return None;
        }

        match self.policy() {
            Policy::FirstFit => policy::first_fit::scan(bits, start, cnt, value),
            Policy::NextFit => policy::next_fit::scan(bits, &mut self.state, start, cnt, value),
            Policy::BestFit => policy::best_fit::scan(bits, start, cnt, value),
            Policy::Buddy => policy::buddy::scan(bits, &mut self.state, cnt, value),
        }
    }

    /// Like [`scan`](Self::scan), then flips the found region to `!value`.
    ///
    /// Each bit is flipped atomically but the scan and the flip are not one
    /// atomic step: a concurrent caller can find the same region in between.
    ///
    /// # Panics
    /// Panics if `start > bits.bit_cnt()`.
    #[track_caller]
    pub fn scan_and_flip<B: BitStore + ?Sized>(
        &mut self,
        bits: &B,
        start: usize,
        cnt: usize,
        value: bool,
    ) -> Option<usize> {
        let idx = self.scan(bits, start, cnt, value)?;
        bits.set_multiple(idx, cnt, !value);
        debug!("{}: claimed {cnt} bits at {idx}", self.policy());
        Some(idx)
    }
}
