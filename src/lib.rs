//! # rangealloc - A Range-Based Block Allocator over a Simulated Memory Region
//!
//! This crate simulates a fixed-capacity, byte-addressable memory region and
//! hands out logical blocks of any requested size from it. A block may be
//! backed by several non-contiguous physical ranges; its handle makes them
//! look like one contiguous buffer.
//!
//! ## Overview
//!
//! ```text
//!   Address Space Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                        BACKING STORAGE                               │
//!   │                                                                      │
//!   │   ┌─────┬─────┬─────┬─────┬─────┬─────────────────────────────────┐  │
//!   │   │ h1  │free │ h3  │free │ h5  │          free (residual)        │  │
//!   │   └─────┴─────┴─────┴─────┴─────┴─────────────────────────────────┘  │
//!   │            ▲           ▲                                             │
//!   │            └─────┬─────┘                                             │
//!   │                  │                                                   │
//!   │          allocate(2) may take both single-unit holes                 │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rangealloc
//!   ├── align      - align_to! macro and OS page size
//!   ├── error      - Error enum and Result alias
//!   ├── handle     - MemoryHandle: logical view over physical ranges
//!   ├── pool       - FreeRangePool: first-fit free-range queue
//!   ├── range      - RangeBlock: one contiguous [start, start + size) run
//!   ├── space      - AddressSpace: the region, its pool and live handles
//!   └── storage    - Storage: mmap-backed byte buffer (internal)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rangealloc::AddressSpace;
//!
//! fn main() -> rangealloc::Result<()> {
//!     let space = AddressSpace::new(5)?;
//!
//!     let mut block = space.allocate(3)?;
//!     block.write_slice(0, b"abc")?;
//!     assert_eq!(block.read(1)?, b'b');
//!
//!     space.release(&mut block)?;
//!     assert_eq!(space.available(), 5);
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! The pool is a queue of free ranges. A request walks it from the front,
//! taking whole ranges while they fit and splitting the last one:
//!
//! ```text
//!   Allocate 4 from a fragmented pool:
//!
//!   pool before   [6, +2)  [1, +1)  [3, +3)
//!                 ───┬───  ───┬───  ───┬───
//!                    │        │        ├── [3, +1) taken
//!                    │        │        └── [4, +2) appended to the back
//!                    │        └── taken whole
//!                    └── taken whole
//!
//!   handle        logical 0..2 → [6, +2), 2 → [1, +1), 3 → [3, +1)
//!   pool after    [4, +2)
//! ```
//!
//! Released ranges are appended to the back too, so the oldest free range is
//! always reused first.
//!
//! ## Invariants
//!
//! - `available() + sum(live handle sizes) == capacity()` at every
//!   observation point, see [`AddressSpace::stats`].
//! - Live handles never share a physical unit with each other or the pool.
//! - A handle returns its ranges exactly once: on the first explicit
//!   release, or on drop.
//!
//! ## Limitations
//!
//! - **No coalescing**: neighbouring free ranges are never merged, so a
//!   request may be served from many small pieces.
//! - **Unix-only**: the backing storage is an anonymous `mmap(2)` mapping.

pub mod align;
mod error;
mod handle;
mod pool;
mod range;
mod space;
mod storage;

pub use error::{Error, Result};
pub use handle::{HandleId, MemoryHandle};
pub use pool::FreeRangePool;
pub use range::RangeBlock;
pub use space::{AddressSpace, Config, DEFAULT_MAX_CAPACITY, Stats};
