/// Monotonic progress of one split, reported between external calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitProgress {
    /// Page `page` of `page_count` is being measured (size-bounded strategy only).
    Measuring { page: u32, page_count: u32 },
    /// Fragment `ordinal` (1-based) of `total` is being assembled.
    Building { ordinal: usize, total: usize },
}

/// Observer that ignores every event.
pub fn ignore_progress(_: SplitProgress) {}
