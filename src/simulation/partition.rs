//! Contiguous block decomposition of the particle index space.
//!
//! Worker `r` of `P` owns `[r*B, min(N, r*B + B))` with `B = ceil(N/P)`.
//! Trailing workers may own nothing when `N` is not a multiple of `P` or
//! when `P > N`; they still take part in every collective step.

use std::ops::Range;

/// Half-open index range owned by one worker, plus the block capacity `B`
/// every worker sizes its local buffers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub rank: usize,
    pub start: usize,
    pub end: usize,
    pub capacity: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Offset of this block inside a buffer of `P * B` slots.
    pub fn slot(&self) -> Range<usize> {
        let base = self.rank * self.capacity;
        base..base + self.capacity
    }
}

/// `ceil(n / workers)`; `workers` must be at least 1.
pub fn block_size(n: usize, workers: usize) -> usize {
    debug_assert!(workers > 0, "worker count must be at least 1");
    n.div_ceil(workers)
}

/// Partition owned by `rank` when `n` particles are split over `workers`.
pub fn plan(n: usize, workers: usize, rank: usize) -> Partition {
    let capacity = block_size(n, workers);
    let start = (rank * capacity).min(n);
    let end = (start + capacity).min(n);
    Partition { rank, start, end, capacity }
}

/// Partitions for every rank, in rank order.
pub fn plan_all(n: usize, workers: usize) -> Vec<Partition> {
    (0..workers).map(|rank| plan(n, workers, rank)).collect()
}
