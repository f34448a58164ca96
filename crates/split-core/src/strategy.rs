//! Partition strategies: map a document's page count (and, per strategy, the selection or
//! measured page sizes) to an ordered list of page groups.

use crate::error::{Result, SplitError};
use crate::progress::SplitProgress;
use crate::selection::PageSelection;
use pdf_engine::{DocumentHandle, DocumentMetadata, PdfWriter};

/// Non-empty run of 1-based page numbers destined for one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGroup {
    pages: Vec<u32>,
}

impl PageGroup {
    pub(crate) fn new(pages: Vec<u32>) -> Self {
        debug_assert!(!pages.is_empty(), "page groups are never empty");
        Self { pages }
    }

    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Lowest page in the group.
    pub fn range_start(&self) -> u32 {
        self.pages.iter().copied().min().unwrap_or_default()
    }

    /// Highest page in the group.
    pub fn range_end(&self) -> u32 {
        self.pages.iter().copied().max().unwrap_or_default()
    }
}

/// Ordered page groups produced by one strategy invocation.
pub type Partition = Vec<PageGroup>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Consecutive groups of `pages_per_group` pages; the last one holds the remainder.
    Range { pages_per_group: u32 },
    /// One group holding the current selection in ascending order.
    SpecificPages,
    /// Greedy groups whose measured sizes add up to at most `max_bytes` (soft limit).
    SizeBounded { max_bytes: u64 },
}

impl SplitStrategy {
    pub fn range(pages_per_group: u32) -> Result<Self> {
        let strategy = Self::Range { pages_per_group };
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn size_bounded(max_bytes: u64) -> Result<Self> {
        let strategy = Self::SizeBounded { max_bytes };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Size ceiling given in megabytes (1 MB = 1024 * 1024 bytes).
    pub fn size_bounded_mb(megabytes: f64) -> Result<Self> {
        if !megabytes.is_finite() || megabytes <= 0.0 {
            return Err(SplitError::InvalidParameters(format!(
                "maximum size must be a positive number of megabytes, got {megabytes}"
            )));
        }
        Self::size_bounded((megabytes * 1024.0 * 1024.0).round() as u64)
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Range { pages_per_group: 0 } => Err(SplitError::InvalidParameters(
                "pages per group must be at least 1".to_owned(),
            )),
            Self::SizeBounded { max_bytes: 0 } => Err(SplitError::InvalidParameters(
                "maximum size must be greater than zero bytes".to_owned(),
            )),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Range { .. } => "range",
            Self::SpecificPages => "specific-pages",
            Self::SizeBounded { .. } => "size-bounded",
        }
    }
}

/// Measurement oracle for the size-bounded strategy.
pub trait PageSizeProbe {
    /// Exact serialized size of a document holding only `page`.
    fn measure_page(&mut self, page: u32) -> Result<u64>;
}

impl<F> PageSizeProbe for F
where
    F: FnMut(u32) -> Result<u64>,
{
    fn measure_page(&mut self, page: u32) -> Result<u64> {
        self(page)
    }
}

/// Probe that asks a [`PdfWriter`] to measure single-page documents.
pub struct WriterProbe<'a, W: ?Sized> {
    writer: &'a W,
    handle: DocumentHandle,
}

impl<'a, W: PdfWriter + ?Sized> WriterProbe<'a, W> {
    pub fn new(writer: &'a W, handle: DocumentHandle) -> Self {
        Self { writer, handle }
    }
}

impl<W: PdfWriter + ?Sized> PageSizeProbe for WriterProbe<'_, W> {
    fn measure_page(&mut self, page: u32) -> Result<u64> {
        Ok(self.writer.measure(self.handle, &[page])?)
    }
}

/// Runs `strategy` against a document.
///
/// `probe` is consulted only by [`SplitStrategy::SizeBounded`], once per page.
pub fn partition(
    strategy: &SplitStrategy,
    metadata: &DocumentMetadata,
    selection: &PageSelection,
    probe: &mut dyn PageSizeProbe,
    progress: &mut dyn FnMut(SplitProgress),
) -> Result<Partition> {
    strategy.validate()?;

    let groups = match *strategy {
        SplitStrategy::Range { pages_per_group } => range_partition(metadata, pages_per_group)?,
        SplitStrategy::SpecificPages => specific_pages_partition(metadata, selection)?,
        SplitStrategy::SizeBounded { max_bytes } => {
            size_bounded_partition(metadata, max_bytes, probe, progress)?
        }
    };

    tracing::info!(strategy = strategy.name(), groups = groups.len(), "computed partition");
    Ok(groups)
}

/// Group `k` covers pages `k * n + 1 ..= min((k + 1) * n, page_count)`.
pub fn range_partition(metadata: &DocumentMetadata, pages_per_group: u32) -> Result<Partition> {
    SplitStrategy::Range { pages_per_group }.validate()?;

    let page_count = metadata.page_count;
    let mut groups = Vec::with_capacity(page_count.div_ceil(pages_per_group) as usize);
    let mut start = 1u32;

    while start <= page_count {
        let end = start.saturating_add(pages_per_group - 1).min(page_count);
        groups.push(PageGroup::new((start..=end).collect()));
        start = match end.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(groups)
}

/// A single group equal to the sorted selection, or nothing when the selection is empty.
///
/// The group may have gaps; it is not a cover of the document.
pub fn specific_pages_partition(
    metadata: &DocumentMetadata,
    selection: &PageSelection,
) -> Result<Partition> {
    let pages = selection.sorted_selection();
    if pages.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(&page) = pages.iter().find(|&&page| page == 0 || page > metadata.page_count) {
        return Err(SplitError::InvalidParameters(format!(
            "selected page {page} is outside the document ({} pages)",
            metadata.page_count
        )));
    }

    Ok(vec![PageGroup::new(pages)])
}

/// Greedy single pass over pages `1..=page_count`.
///
/// A page joins the current group while the running total stays within `max_bytes`.
/// A page that alone exceeds `max_bytes` still forms its own group. Costs one
/// `probe` call per page.
pub fn size_bounded_partition(
    metadata: &DocumentMetadata,
    max_bytes: u64,
    probe: &mut dyn PageSizeProbe,
    progress: &mut dyn FnMut(SplitProgress),
) -> Result<Partition> {
    SplitStrategy::SizeBounded { max_bytes }.validate()?;

    let page_count = metadata.page_count;
    let mut groups = Vec::new();
    let mut current: Vec<u32> = Vec::new();
    let mut current_size = 0u64;

    for page in 1..=page_count {
        progress(SplitProgress::Measuring { page, page_count });
        let size = probe.measure_page(page)?;
        tracing::debug!(page, size, "measured page");

        if !current.is_empty() && current_size.saturating_add(size) > max_bytes {
            groups.push(PageGroup::new(std::mem::take(&mut current)));
            current_size = 0;
        }

        current.push(page);
        current_size = current_size.saturating_add(size);
    }

    if !current.is_empty() {
        groups.push(PageGroup::new(current));
    }

    Ok(groups)
}
