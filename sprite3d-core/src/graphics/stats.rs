use std::sync::atomic::{AtomicU64, Ordering};

static TOTAL_DRAW_CALLS: AtomicU64 = AtomicU64::new(0);

/// Draw calls issued by every renderer in this process.
pub fn total_draw_calls() -> u64 {
    TOTAL_DRAW_CALLS.load(Ordering::Relaxed)
}

pub(crate) fn count_draw_call() {
    TOTAL_DRAW_CALLS.fetch_add(1, Ordering::Relaxed);
}


/// Counters for one frame, reset by `start()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    /// Quads packed into the vertex buffer.
    pub quads: u32,
    /// Flushes that had something to draw.
    pub flushes: u32,
    /// Submissions dropped because their texture was not ready.
    pub skipped: u32,
}
