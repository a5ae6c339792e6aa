//! Frame-lifetime allocation.
//!
//! Operations synthesized during traversal (property clips, saves,
//! restores, shadows) are bump-allocated and borrowed for the duration of
//! one frame. Nothing allocated here outlives the borrow of the allocator.

use bumpalo::Bump;

/// Bump arena for synthetic operations.
///
/// Values allocated here never run `Drop`, so only plain data (matrices,
/// rects, borrowed outlines) should be placed in it.
#[derive(Debug, Default)]
pub struct FrameAllocator {
    bump: Bump,
}

impl FrameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self { bump: Bump::with_capacity(bytes) }
    }

    #[inline]
    pub fn alloc<T>(&self, value: T) -> &T {
        self.bump.alloc(value)
    }

    /// Bytes handed out since the last reset.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Recycles the arena for the next frame.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}
