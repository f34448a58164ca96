//! Error taxonomy for planning and building splits.

use pdf_engine::PdfEngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    /// Strategy parameters failed validation. Nothing was attempted.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The partition came out empty, e.g. no pages were selected.
    #[error("no pages selected for splitting")]
    EmptySelection,

    #[error("no document loaded")]
    NoDocumentLoaded,

    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("source document is invalid: {0}")]
    SourceDocumentInvalid(String),

    #[error("source document is password protected")]
    SourceDocumentEncrypted,

    #[error("source document too large: {0}")]
    SourceDocumentTooLarge(String),

    /// A fragment failed to build; every fragment of the run was discarded.
    #[error("fragment {ordinal} of {total} failed to build")]
    BuildAborted {
        ordinal: usize,
        total: usize,
        #[source]
        source: Box<SplitError>,
    },

    #[error("fragment index {index} out of range ({len} fragments)")]
    FragmentIndexOutOfRange { index: usize, len: usize },

    #[error("failed to bundle fragments: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SplitError>;

impl SplitError {
    /// True for outcomes that mean "nothing to do" rather than a failure.
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::EmptySelection)
    }

    /// Sentence suitable for showing to the person who asked for the split.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidParameters(detail) => {
                format!("Please enter valid split parameters ({detail}).")
            }
            Self::EmptySelection => "No pages selected for splitting.".to_owned(),
            Self::NoDocumentLoaded => "No PDF loaded.".to_owned(),
            Self::PageOutOfRange { page, page_count } => {
                format!("Page {page} does not exist; the document has {page_count} pages.")
            }
            Self::SourceDocumentInvalid(_) => {
                "The selected file is not a valid PDF or appears to be corrupted.".to_owned()
            }
            Self::SourceDocumentEncrypted => {
                "This PDF is password protected. Please use an unprotected PDF.".to_owned()
            }
            Self::SourceDocumentTooLarge(_) => {
                "File too large to process. Try a smaller PDF.".to_owned()
            }
            Self::BuildAborted { source, .. } => source.user_message(),
            Self::FragmentIndexOutOfRange { .. } => "That fragment does not exist.".to_owned(),
            Self::Archive(_) => "Failed to create the ZIP archive.".to_owned(),
            Self::Io(_) => "Unexpected error while processing the PDF.".to_owned(),
        }
    }
}

impl From<PdfEngineError> for SplitError {
    fn from(err: PdfEngineError) -> Self {
        match err {
            PdfEngineError::Io(io) => Self::Io(io),
            PdfEngineError::Parse(parse) => Self::SourceDocumentInvalid(parse.to_string()),
            PdfEngineError::InvalidHandle(_) => Self::NoDocumentLoaded,
            PdfEngineError::PageOutOfRange { page, page_count } => {
                Self::PageOutOfRange { page, page_count }
            }
            PdfEngineError::EmptyPageList => {
                Self::InvalidParameters("no pages requested".to_owned())
            }
            PdfEngineError::EncryptedUnsupported => Self::SourceDocumentEncrypted,
            err @ (PdfEngineError::TooLarge { .. } | PdfEngineError::OutputAllocation { .. }) => {
                Self::SourceDocumentTooLarge(err.to_string())
            }
        }
    }
}
