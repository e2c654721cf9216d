//! # Placement policies
//!
//! The four search strategies a [`ScanEngine`](crate::ScanEngine) can run,
//! and the process-wide selector that engines without a pinned policy read on
//! every scan.
//!
//! | Policy | Search start | State |
//! |--------|--------------|-------|
//! | [`Policy::FirstFit`] | `start` | none |
//! | [`Policy::NextFit`] | cursor, wrapping to `start` | cursor |
//! | [`Policy::BestFit`] | `start`, full pass | none |
//! | [`Policy::Buddy`] | 0 while bootstrapping, then a fixed base | bootstrap counters |

use crate::BitStore;
use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU8, Ordering};

pub mod best_fit;
pub mod buddy;
pub mod first_fit;
pub mod next_fit;

/// A placement policy.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Policy {
    /// Lowest offset at or after `start`.
    #[default]
    FirstFit = 0,
    /// First fit resuming from the previous success, wrapping around.
    NextFit = 1,
    /// The fitting run with the least slack; earliest wins ties.
    BestFit = 2,
    /// Power-of-two block probing over a fixed span.
    Buddy = 3,
}

impl Policy {
    pub const ALL: [Self; 4] = [Self::FirstFit, Self::NextFit, Self::BestFit, Self::Buddy];

    /// Maps a numeric selector value back to a policy.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::FirstFit),
            1 => Some(Self::NextFit),
            2 => Some(Self::BestFit),
            3 => Some(Self::Buddy),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstFit => "first-fit",
            Self::NextFit => "next-fit",
            Self::BestFit => "best-fit",
            Self::Buddy => "buddy",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Policy`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown placement policy (expected first-fit, next-fit, best-fit, buddy or 0-3)")]
pub struct ParsePolicyError;

impl FromStr for Policy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(policy) = Self::ALL.into_iter().find(|p| p.as_str() == s) {
            return Ok(policy);
        }
        s.parse::<u8>()
            .ok()
            .and_then(Self::from_u8)
            .ok_or(ParsePolicyError)
    }
}

/// Process-wide policy selector.
static ACTIVE_POLICY: AtomicU8 = AtomicU8::new(Policy::FirstFit as u8);

/// Selects the policy used by every engine that follows the global selector.
pub fn set_active_policy(policy: Policy) {
    ACTIVE_POLICY.store(policy as u8, Ordering::Release);
}

/// The currently selected process-wide policy.
#[must_use]
pub fn active_policy() -> Policy {
    // Only valid discriminants are ever stored.
    Policy::from_u8(ACTIVE_POLICY.load(Ordering::Acquire)).unwrap_or_default()
}

/// Whether `[idx, idx + cnt)` holds no bit other than `value`.
#[inline]
pub(crate) fn region_matches<B: BitStore + ?Sized>(
    bits: &B,
    idx: usize,
    cnt: usize,
    value: bool,
) -> bool {
    !bits.contains(idx, cnt, !value)
}

/// Length of the run of bits equal to `value` starting at `idx`, not looking
/// at or past `end`.
#[inline]
pub(crate) fn run_length<B: BitStore + ?Sized>(
    bits: &B,
    idx: usize,
    end: usize,
    value: bool,
) -> usize {
    (idx..end).take_while(|&i| bits.test(i) == value).count()
}
