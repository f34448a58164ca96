//! PDF split core
//!
//! Page partitioning, fragment building and export for splitting one PDF into several.

pub mod archive;
pub mod error;
pub mod format;
pub mod fragment;
pub mod progress;
pub mod selection;
pub mod session;
pub mod strategy;

pub use archive::{bundle, DEFAULT_BUNDLE_NAME};
pub use error::{Result, SplitError};
pub use format::{display_size, format_file_size};
pub use fragment::{build_all, build_fragment, fragment_name, ExportedFile, Fragment, FragmentSet};
pub use progress::{ignore_progress, SplitProgress};
pub use selection::{parse_page_list, PageSelection};
pub use session::SplitSession;
pub use strategy::{
    partition, range_partition, size_bounded_partition, specific_pages_partition, PageGroup,
    PageSizeProbe, Partition, SplitStrategy, WriterProbe,
};
