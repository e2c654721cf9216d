//! # Textbook buddy allocator over a bitmap
//!
//! [`BuddyTree`] manages a power-of-two span of a bitmap with one free list
//! per order. Allocations take the smallest free block that fits, splitting
//! larger blocks on the way down; frees merge a block with its buddy for as
//! long as the buddy is free at the same order.
//!
//! ```text
//! order 3: [0 ───────────────────────── 8)
//! order 2: [0 ─────────── 4)[4 ───────── 8)
//! order 1: [0 ──── 2)[2 ── 4)
//! order 0: [0)[1)
//! ```
//!
//! Claimed blocks are marked `true` in the bitmap (the whole block, not just
//! the requested count), so the bitmap stays an exact picture of the tree.
//! Unlike the [`Buddy`](crate::Policy::Buddy) scan policy, the tree has no
//! cross-call bootstrap state and it does coalesce.

use crate::BitStore;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use log::{debug, trace};

/// Order of the smallest block that holds `cnt` units.
#[inline]
const fn order_for(cnt: usize) -> u32 {
    cnt.next_power_of_two().trailing_zeros()
}

/// Buddy allocator for `[base, base + 2^max_order)` of a bitmap.
#[derive(Debug, Clone)]
pub struct BuddyTree {
    base: usize,
    max_order: u32,
    /// `free[o]` holds the span-relative offsets of free blocks of `2^o` units.
    free: Vec<BTreeSet<usize>>,
}

impl BuddyTree {
    /// A tree whose whole span starts out free.
    ///
    /// The bits of the span are not touched; callers hand over a region that
    /// is clear in the bitmap.
    ///
    /// # Panics
    /// Panics if `2^max_order` does not fit in `usize`.
    #[must_use]
    pub fn new(base: usize, max_order: u32) -> Self {
        assert!(
            max_order < usize::BITS,
            "buddy order {max_order} does not fit in usize"
        );
        let mut free: Vec<BTreeSet<usize>> = (0..=max_order).map(|_| BTreeSet::new()).collect();
        free[max_order as usize].insert(0);
        Self {
            base,
            max_order,
            free,
        }
    }

    /// First unit of the managed span.
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Number of units in the managed span.
    #[must_use]
    pub const fn span(&self) -> usize {
        1 << self.max_order
    }

    /// Total units currently free.
    #[must_use]
    pub fn free_units(&self) -> usize {
        self.free
            .iter()
            .enumerate()
            .map(|(order, blocks)| blocks.len() << order)
            .sum()
    }

    /// Allocates a block of at least `cnt` units and marks it in `bits`.
    ///
    /// Returns the absolute offset of the block, or `None` if `cnt` is zero,
    /// larger than the span, or no block is free.
    ///
    /// # Panics
    /// Panics if the managed span does not lie within `bits`.
    #[track_caller]
    pub fn alloc<B: BitStore + ?Sized>(&mut self, bits: &B, cnt: usize) -> Option<usize> {
        self.check_span(bits);
        if cnt == 0 || cnt > self.span() {
            return None;
        }

        let order = order_for(cnt);
        let from = (order..=self.max_order).find(|&o| !self.free[o as usize].is_empty())?;
        let block = self.free[from as usize].pop_first()?;

        for split in (order..from).rev() {
            let upper = block + (1 << split);
            trace!("buddy split: order {} -> free {upper} at order {split}", split + 1);
            self.free[split as usize].insert(upper);
        }

        let offset = self.base + block;
        bits.set_multiple(offset, 1 << order, true);
        debug!("buddy tree: {cnt} units -> order {order} block at {offset}");
        Some(offset)
    }

    /// Returns the block at `offset` that was allocated for `cnt` units,
    /// clears it in `bits`, and merges it with free buddies.
    ///
    /// # Panics
    /// Panics if the block lies outside the span, is misaligned for its
    /// order, or is not fully allocated in `bits`.
    #[track_caller]
    pub fn free<B: BitStore + ?Sized>(&mut self, bits: &B, offset: usize, cnt: usize) {
        self.check_span(bits);
        let mut order = order_for(cnt);
        let size = 1usize << order;
        assert!(
            cnt > 0 && offset >= self.base && offset - self.base + size <= self.span(),
            "block {offset}+{cnt} lies outside the buddy span {}+{}",
            self.base,
            self.span()
        );
        let mut block = offset - self.base;
        assert!(
            block.is_multiple_of(size),
            "block at {offset} is not aligned to its order {order}"
        );
        assert!(
            bits.all(offset, size),
            "block {offset}+{size} is not fully allocated"
        );

        bits.set_multiple(offset, size, false);

        while order < self.max_order {
            let buddy = block ^ (1 << order);
            if !self.free[order as usize].remove(&buddy) {
                break;
            }
            trace!("buddy merge: {block} + {buddy} at order {order}");
            block = block.min(buddy);
            order += 1;
        }
        self.free[order as usize].insert(block);
    }

    #[track_caller]
    fn check_span<B: BitStore + ?Sized>(&self, bits: &B) {
        assert!(
            self.base
                .checked_add(self.span())
                .is_some_and(|end| end <= bits.bit_cnt()),
            "buddy span {}+{} exceeds bitmap of {} bits",
            self.base,
            self.span(),
            bits.bit_cnt()
        );
    }
}
