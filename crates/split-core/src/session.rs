//! One user's split workflow: the loaded document, the selection and the last fragment set.

use crate::archive;
use crate::error::{Result, SplitError};
use crate::fragment::{build_all, ExportedFile, FragmentSet};
use crate::progress::{ignore_progress, SplitProgress};
use crate::selection::PageSelection;
use crate::strategy::{partition, Partition, SplitStrategy, WriterProbe};
use pdf_engine::{
    DocumentHandle, DocumentMetadata, OpenSource, PdfEngine, PdfWriter, RgbaImage, ThumbnailSize,
};

#[derive(Debug, Clone, Copy)]
struct LoadedDocument {
    handle: DocumentHandle,
    metadata: DocumentMetadata,
}

/// Explicit context for splitting one document at a time.
///
/// Independent sessions share nothing, so several can run side by side (e.g. in tests).
#[derive(Debug)]
pub struct SplitSession<E> {
    engine: E,
    document: Option<LoadedDocument>,
    selection: PageSelection,
    fragments: FragmentSet,
}

impl<E: PdfEngine + PdfWriter> SplitSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            document: None,
            selection: PageSelection::new(),
            fragments: FragmentSet::default(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Opens a new source document, replacing the current one wholesale.
    ///
    /// If opening fails the previous document, selection and fragments are kept. Failing to
    /// close the previous handle is logged and does not undo the load.
    pub fn load(&mut self, source: impl Into<OpenSource>) -> Result<DocumentMetadata> {
        let handle = self.engine.open(source.into())?;
        let metadata = match self.engine.metadata(handle) {
            Ok(metadata) => metadata,
            Err(err) => {
                let _ = self.engine.close(handle);
                return Err(err.into());
            }
        };

        let previous = self.document.replace(LoadedDocument { handle, metadata });
        self.selection.clear();
        self.fragments = FragmentSet::default();

        if let Some(previous) = previous {
            if let Err(err) = self.engine.close(previous.handle) {
                tracing::warn!(
                    handle = previous.handle.raw(),
                    error = %err,
                    "failed to close previous document"
                );
            }
        }

        tracing::info!(pages = metadata.page_count, bytes = metadata.byte_len, "loaded document");
        Ok(metadata)
    }

    pub fn metadata(&self) -> Option<DocumentMetadata> {
        self.document.map(|document| document.metadata)
    }

    pub fn document_handle(&self) -> Option<DocumentHandle> {
        self.document.map(|document| document.handle)
    }

    pub fn selection(&self) -> &PageSelection {
        &self.selection
    }

    /// Toggles a 1-based page. Returns whether it is now selected.
    pub fn toggle_page(&mut self, page: u32) -> Result<bool> {
        let metadata = self.require_document()?.metadata;
        check_page(page, metadata.page_count)?;
        Ok(self.selection.toggle(page))
    }

    /// Adds every page of `pages`, or none of them if any is out of range.
    pub fn select_pages(&mut self, pages: impl IntoIterator<Item = u32>) -> Result<()> {
        let page_count = self.require_document()?.metadata.page_count;
        let pages: Vec<u32> = pages.into_iter().collect();
        for &page in &pages {
            check_page(page, page_count)?;
        }
        for page in pages {
            self.selection.add(page);
        }
        Ok(())
    }

    pub fn select_all(&mut self) -> Result<()> {
        let page_count = self.require_document()?.metadata.page_count;
        self.selection.select_all(page_count);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Computes the partition for `strategy` without building anything.
    pub fn plan(&self, strategy: &SplitStrategy) -> Result<Partition> {
        self.plan_with_progress(strategy, &mut ignore_progress)
    }

    pub fn plan_with_progress(
        &self,
        strategy: &SplitStrategy,
        progress: &mut dyn FnMut(SplitProgress),
    ) -> Result<Partition> {
        let document = self.require_document()?;
        let mut probe = WriterProbe::new(&self.engine, document.handle);
        partition(strategy, &document.metadata, &self.selection, &mut probe, progress)
    }

    pub fn split(&mut self, strategy: &SplitStrategy) -> Result<&FragmentSet> {
        self.split_with_progress(strategy, &mut ignore_progress)
    }

    /// Partitions the document and builds every group, replacing the previous fragments.
    ///
    /// Invalid parameters and an empty partition leave the previous fragments in place.
    /// Once building starts they are gone, and a failed build leaves the set empty.
    pub fn split_with_progress(
        &mut self,
        strategy: &SplitStrategy,
        progress: &mut dyn FnMut(SplitProgress),
    ) -> Result<&FragmentSet> {
        let document = self.require_document()?;
        let groups = self.plan_with_progress(strategy, progress)?;
        if groups.is_empty() {
            return Err(SplitError::EmptySelection);
        }

        self.fragments = FragmentSet::default();
        self.fragments = build_all(&self.engine, document.handle, &groups, progress)?;

        tracing::info!(
            strategy = strategy.name(),
            fragments = self.fragments.len(),
            bytes = self.fragments.total_bytes(),
            "split complete"
        );
        Ok(&self.fragments)
    }

    pub fn fragments(&self) -> &FragmentSet {
        &self.fragments
    }

    pub fn export_single(&self, index: usize) -> Result<ExportedFile<'_>> {
        self.fragments.export_single(index)
    }

    pub fn export_all(&self) -> Vec<ExportedFile<'_>> {
        self.fragments.export_all()
    }

    /// ZIP archive of the current fragments.
    pub fn bundle(&self) -> Result<Vec<u8>> {
        archive::bundle(&self.fragments)
    }

    /// Preview raster of a 1-based page fitted into `target`.
    pub fn render_preview(&self, page: u32, target: ThumbnailSize) -> Result<RgbaImage> {
        let document = self.require_document()?;
        check_page(page, document.metadata.page_count)?;
        Ok(self.engine.render_thumbnail(document.handle, page - 1, target)?)
    }

    /// Closes the document and forgets the selection and fragments.
    pub fn reset(&mut self) -> Result<()> {
        self.selection.clear();
        self.fragments = FragmentSet::default();
        if let Some(document) = self.document.take() {
            self.engine.close(document.handle)?;
        }
        Ok(())
    }

    fn require_document(&self) -> Result<LoadedDocument> {
        self.document.ok_or(SplitError::NoDocumentLoaded)
    }
}

fn check_page(page: u32, page_count: u32) -> Result<()> {
    if page == 0 || page > page_count {
        return Err(SplitError::PageOutOfRange { page, page_count });
    }
    Ok(())
}
