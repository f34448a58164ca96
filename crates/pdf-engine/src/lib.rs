use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

mod assemble;
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// US Letter, used when a page carries no readable `MediaBox`.
const FALLBACK_PAGE_SIZE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Rebuilds a handle from [`DocumentHandle::raw`], e.g. for engines wrapping this one.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// What the reader learns about a source document when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub page_count: u32,
    pub byte_len: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// Scale that fits the page inside a `max_width` x `max_height` box.
    pub fn fit_scale(&self, max_width: f32, max_height: f32) -> f32 {
        if self.width_pt <= 0.0 || self.height_pt <= 0.0 {
            return 1.0;
        }
        (max_width / self.width_pt).min(max_height / self.height_pt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub scale: f32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, scale: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self { width_px: 150, height_px: 200 }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Sources larger than this are refused before parsing.
    pub max_source_bytes: Option<u64>,
    /// Compress content streams of assembled documents.
    pub compress_streams: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { max_source_bytes: Some(512 * 1024 * 1024), compress_streams: false }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("no pages requested")]
    EmptyPageList,
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("document too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
    #[error("could not allocate {requested} bytes for the output document")]
    OutputAllocation { requested: u64 },
}

/// Reader side: opening documents and previewing their pages.
pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn metadata(&self, handle: DocumentHandle) -> Result<DocumentMetadata, PdfEngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn render_thumbnail(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        target: ThumbnailSize,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

/// Writer side: producing new documents from pages of an open one.
///
/// Page numbers are 1-based. Order is preserved and duplicates are honored.
pub trait PdfWriter {
    /// Serialized size of the document `assemble` would produce for `page_numbers`.
    fn measure(
        &self,
        handle: DocumentHandle,
        page_numbers: &[u32],
    ) -> Result<u64, PdfEngineError>;

    fn assemble(
        &self,
        handle: DocumentHandle,
        page_numbers: &[u32],
    ) -> Result<Vec<u8>, PdfEngineError>;
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    document: Document,
    byte_len: u64,
    page_sizes: Vec<PageSize>,
}

#[derive(Debug, Default)]
pub struct LopdfEngine {
    options: EngineOptions,
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self { options, ..Self::default() }
    }

    fn parse(&self, bytes: &[u8]) -> Result<(Document, Vec<PageSize>), PdfEngineError> {
        if let Some(limit) = self.options.max_source_bytes {
            let size = bytes.len() as u64;
            if size > limit {
                return Err(PdfEngineError::TooLarge { size, limit });
            }
        }

        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let media_box = match doc.get_dictionary(object_id)?.get(b"MediaBox") {
                Ok(obj) => Some(obj.clone()),
                Err(_) => assemble::inherited_attribute(&doc, object_id, b"MediaBox"),
            };
            let size = media_box
                .as_ref()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
                })
                .unwrap_or(FALLBACK_PAGE_SIZE);

            sizes.push(size);
        }

        Ok((doc, sizes))
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        self.docs.get(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let (document, page_sizes) = self.parse(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        tracing::debug!(handle = handle.raw(), pages = page_sizes.len(), "opened document");
        self.docs
            .insert(handle, DocumentRecord { document, byte_len: bytes.len() as u64, page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn metadata(&self, handle: DocumentHandle) -> Result<DocumentMetadata, PdfEngineError> {
        let record = self.record(handle)?;
        Ok(DocumentMetadata {
            page_count: record.page_sizes.len() as u32,
            byte_len: record.byte_len,
        })
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let page_size = self.page_size(handle, request.page_index)?;
        let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };

        let width = (page_size.width_pt * scale).round().max(1.0) as u32;
        let height = (page_size.height_pt * scale).round().max(1.0) as u32;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn render_thumbnail(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        target: ThumbnailSize,
    ) -> Result<RgbaImage, PdfEngineError> {
        let page_size = self.page_size(handle, page_index)?;
        let scale = page_size.fit_scale(target.width_px as f32, target.height_px as f32);
        let page = self.render_page(handle, RenderRequest { page_index, scale })?;

        Ok(image::imageops::thumbnail(&page, target.width_px.max(1), target.height_px.max(1)))
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

impl PdfWriter for LopdfEngine {
    fn measure(
        &self,
        handle: DocumentHandle,
        page_numbers: &[u32],
    ) -> Result<u64, PdfEngineError> {
        Ok(self.assemble(handle, page_numbers)?.len() as u64)
    }

    fn assemble(
        &self,
        handle: DocumentHandle,
        page_numbers: &[u32],
    ) -> Result<Vec<u8>, PdfEngineError> {
        let record = self.record(handle)?;
        assemble::assemble_pages(&record.document, page_numbers, &self.options)
    }
}
