//! Arena - bump allocator for skip-list node memory
//!
//! Memory is handed out from 4 KiB blocks by bumping a cursor. Nothing is
//! freed individually; every block lives until the arena is dropped. A
//! logically deleted node therefore keeps its bytes, which is the price paid
//! for allocation being a pointer bump.
//!
//! Allocation rules:
//!
//! 1. If the request fits in the active block, bump the cursor.
//! 2. If it does not fit and is larger than a quarter block, give it a
//!    dedicated block of its own. The active block is kept, so its tail is
//!    not wasted.
//! 3. Otherwise start a fresh standard block, make it active, and serve the
//!    request from its start. The old block's tail is abandoned.
//!
//! Allocations are addressed through [`ArenaSlice`] handles instead of raw
//! pointers.

use skiplite_core::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Size of a standard block in bytes
pub const BLOCK_SIZE: usize = 4096;

/// Bookkeeping charged per block (one pointer)
pub const BLOCK_OVERHEAD: usize = std::mem::size_of::<usize>();

/// Alignment applied by [`Arena::allocate_aligned`]
pub const ALIGN: usize = if std::mem::size_of::<usize>() > 8 {
    std::mem::size_of::<usize>()
} else {
    8
};

const _: () = assert!(ALIGN.is_power_of_two(), "pointer size should be a power of 2");

/// Handle to a region of arena memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaSlice {
    block: usize,
    offset: usize,
    len: usize,
}

impl ArenaSlice {
    /// Length of the region in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for a zero-length region
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Shared byte counter that can be read without borrowing its owner.
///
/// Clones observe the same value, so a reader on another thread can watch
/// memory grow while the owner keeps allocating.
#[derive(Debug, Clone, Default)]
pub struct MemoryGauge(Arc<AtomicUsize>);

impl MemoryGauge {
    /// Current value in bytes
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn add(&self, bytes: usize) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn sub(&self, bytes: usize) {
        self.0.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// Bump allocator over a list of owned blocks
#[derive(Debug, Default)]
pub struct Arena {
    blocks: Vec<Box<[u8]>>,
    /// Block currently served by the bump cursor
    active: Option<usize>,
    cursor: usize,
    remaining: usize,
    usage: MemoryGauge,
}

impl Arena {
    /// Creates an empty arena. No memory is reserved until the first allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `bytes` with no alignment guarantee
    pub fn allocate(&mut self, bytes: usize) -> Result<ArenaSlice> {
        if let Some(block) = self.active {
            if bytes <= self.remaining {
                let slice = ArenaSlice {
                    block,
                    offset: self.cursor,
                    len: bytes,
                };
                self.cursor += bytes;
                self.remaining -= bytes;
                return Ok(slice);
            }
        }
        self.allocate_fallback(bytes, 1)
    }

    /// Allocates `bytes` starting at an address aligned to [`ALIGN`].
    ///
    /// The gap skipped to reach alignment is lost.
    pub fn allocate_aligned(&mut self, bytes: usize) -> Result<ArenaSlice> {
        if let Some(block) = self.active {
            let slop = padding(self.blocks[block].as_ptr() as usize + self.cursor, ALIGN);
            let needed = bytes.saturating_add(slop);
            if needed <= self.remaining {
                let slice = ArenaSlice {
                    block,
                    offset: self.cursor + slop,
                    len: bytes,
                };
                self.cursor += needed;
                self.remaining -= needed;
                return Ok(slice);
            }
        }
        self.allocate_fallback(bytes, ALIGN)
    }

    fn allocate_fallback(&mut self, bytes: usize, align: usize) -> Result<ArenaSlice> {
        if bytes > BLOCK_SIZE / 4 {
            // Dedicated block; reserve worst-case padding when alignment is asked for
            let size = bytes
                .checked_add(align - 1)
                .ok_or(Error::AllocationFailure { requested: bytes })?;
            let block = self.allocate_new_block(size)?;
            let offset = padding(self.blocks[block].as_ptr() as usize, align);
            return Ok(ArenaSlice {
                block,
                offset,
                len: bytes,
            });
        }

        let block = self.allocate_new_block(BLOCK_SIZE)?;
        let offset = padding(self.blocks[block].as_ptr() as usize, align);
        self.active = Some(block);
        self.cursor = offset + bytes;
        self.remaining = BLOCK_SIZE - offset - bytes;
        Ok(ArenaSlice {
            block,
            offset,
            len: bytes,
        })
    }

    fn allocate_new_block(&mut self, size: usize) -> Result<usize> {
        let mut block = Vec::new();
        block
            .try_reserve_exact(size)
            .map_err(|_| Error::AllocationFailure { requested: size })?;
        block.resize(size, 0u8);
        self.blocks.push(block.into_boxed_slice());
        self.usage.add(size + BLOCK_OVERHEAD);
        tracing::trace!(size, blocks = self.blocks.len(), "arena block allocated");
        Ok(self.blocks.len() - 1)
    }

    /// Read access to an allocation
    pub fn bytes(&self, slice: ArenaSlice) -> &[u8] {
        &self.blocks[slice.block][slice.offset..slice.offset + slice.len]
    }

    /// Write access to an allocation
    pub fn bytes_mut(&mut self, slice: ArenaSlice) -> &mut [u8] {
        &mut self.blocks[slice.block][slice.offset..slice.offset + slice.len]
    }

    /// Total of all block sizes plus one pointer of bookkeeping per block
    pub fn memory_usage(&self) -> usize {
        self.usage.get()
    }

    /// A handle that reports [`Arena::memory_usage`] from anywhere
    pub fn gauge(&self) -> MemoryGauge {
        self.usage.clone()
    }

    /// Bytes left in the active block
    pub fn remaining_bytes(&self) -> usize {
        self.remaining
    }

    /// Number of blocks allocated so far
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

fn padding(addr: usize, align: usize) -> usize {
    let rem = addr & (align - 1);
    if rem == 0 {
        0
    } else {
        align - rem
    }
}
