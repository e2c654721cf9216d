//! # Occupancy Bitmaps and Placement Policies
//!
//! This crate tracks occupancy of a linear resource space (physical frames,
//! disk sectors, ...) with a fixed-capacity packed bit vector, and layers a
//! search-and-claim engine on top of it that implements the classic placement
//! policies.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Scan-and-Claim                      │
//! │    • ScanEngine::scan_and_flip                      │
//! │    • shared::scan_and_flip (global lock)            │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │              Policy Engine                          │
//! │    • First-Fit / Next-Fit / Best-Fit / Buddy        │
//! │    • Explicit cursor and bootstrap state            │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │           Bit Store & Range Operations              │
//! │    • Atomic single-bit mark/reset/flip              │
//! │    • count / contains / any / none / all            │
//! │    • Owned (Bitmap) or in-buffer (BitmapView)       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Components
//!
//! ### Bit Store ([`BitStore`], [`Bitmap`], [`BitmapView`])
//!
//! Bits are packed into `usize` words. Bit `k` of word `w` represents logical
//! bit `w * usize::BITS + k`. Every single-bit mutation is a hardware
//! read-modify-write on the owning word, so it can never be observed half
//! applied. Range mutations are sequences of single-bit mutations and are
//! **not** atomic as a unit.
//!
//! ### Policy Engine ([`ScanEngine`])
//!
//! The engine owns the state that some policies carry from call to call: the
//! Next-Fit cursor and the Buddy-System bootstrap counters. That state is
//! shared by every bitmap scanned through the same engine, so the order of
//! calls matters.
//!
//! ### Textbook Buddy ([`buddy_tree::BuddyTree`])
//!
//! A conventional buddy allocator with per-order free lists and split/merge,
//! kept separate from the scan-based Buddy-System approximation.
//!
//! ## Usage Patterns
//!
//! ```rust
//! use kernel_bitmap::{BitStore, Bitmap, Policy, ScanEngine};
//!
//! let frames = Bitmap::new(10).expect("bitmap storage");
//! frames.set_multiple(2, 3, true);
//!
//! let mut engine = ScanEngine::with_policy(Policy::FirstFit);
//! assert_eq!(engine.scan_and_flip(&frames, 0, 3, false), Some(5));
//! assert!(frames.all(5, 3));
//! ```
//!
//! ## Concurrency
//!
//! A find-and-claim sequence is two steps: scan, then flip. Two callers racing
//! on the same bitmap can both find the same region. Either serialize callers
//! around a [`ScanEngine`] yourself, or use the process-wide engine in
//! [`shared`], which holds one global lock for the whole sequence.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod bitmap;
pub mod buddy_tree;
pub mod dump;
mod engine;
mod error;
pub mod persist;
pub mod policy;
pub mod shared;
mod store;
mod view;

pub use bitmap::Bitmap;
pub use dump::BitmapDump;
pub use engine::{PolicyState, ScanEngine};
pub use error::BitmapError;
pub use persist::{BitmapFile, BitmapPersist, PersistError};
pub use policy::{Policy, active_policy, set_active_policy};
pub use store::{BitStore, WORD_BITS, WORD_BYTES, byte_count, word_count};
pub use view::{BitmapView, HEADER_SIZE, buf_size};

/// Raw failure sentinel for callers that need a plain offset.
///
/// Scans report failure as `None`; `scan(..).unwrap_or(NOT_FOUND)` converts
/// to this form. No bitmap can hold `usize::MAX` bits plus a region, so the
/// value never collides with a valid offset.
pub const NOT_FOUND: usize = usize::MAX;
