//! Materializing page groups into named output documents.

use crate::error::{Result, SplitError};
use crate::progress::SplitProgress;
use crate::strategy::PageGroup;
use pdf_engine::{DocumentHandle, PdfWriter};

/// One produced output document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    name: String,
    pages: Vec<u32>,
    bytes: Vec<u8>,
    byte_size: u64,
}

impl Fragment {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

/// `fragmento_{ordinal}_paginas_{p1}-{p2}-...-{pn}.pdf`, pages in stored order.
pub fn fragment_name(ordinal: usize, pages: &[u32]) -> String {
    let joined = pages.iter().map(u32::to_string).collect::<Vec<_>>().join("-");
    format!("fragmento_{ordinal}_paginas_{joined}.pdf")
}

/// Builds one fragment holding exactly `group.pages()`, in that order.
///
/// `ordinal` is the 1-based creation order.
pub fn build_fragment<W: PdfWriter + ?Sized>(
    writer: &W,
    handle: DocumentHandle,
    group: &PageGroup,
    ordinal: usize,
) -> Result<Fragment> {
    let bytes = writer.assemble(handle, group.pages())?;
    let byte_size = bytes.len() as u64;
    let name = fragment_name(ordinal, group.pages());

    tracing::debug!(%name, byte_size, "built fragment");
    Ok(Fragment { name, pages: group.pages().to_vec(), bytes, byte_size })
}

/// Builds every group in partition order, one at a time.
///
/// The first failure aborts the run and nothing built so far is returned.
pub fn build_all<W: PdfWriter + ?Sized>(
    writer: &W,
    handle: DocumentHandle,
    partition: &[PageGroup],
    progress: &mut dyn FnMut(SplitProgress),
) -> Result<FragmentSet> {
    let total = partition.len();
    let mut fragments = Vec::with_capacity(total);

    for (index, group) in partition.iter().enumerate() {
        let ordinal = index + 1;
        progress(SplitProgress::Building { ordinal, total });

        match build_fragment(writer, handle, group, ordinal) {
            Ok(fragment) => fragments.push(fragment),
            Err(source) => {
                tracing::warn!(ordinal, total, error = %source, "fragment build failed; aborting");
                return Err(SplitError::BuildAborted { ordinal, total, source: Box::new(source) });
            }
        }
    }

    Ok(FragmentSet { fragments })
}

/// A file ready to hand to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportedFile<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

/// Fragments of the latest successful split, addressed by 0-based creation index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentSet {
    fragments: Vec<Fragment>,
}

impl FragmentSet {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Fragment> {
        self.fragments.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.fragments.iter()
    }

    pub fn total_bytes(&self) -> u64 {
        self.fragments.iter().map(Fragment::byte_size).sum()
    }

    pub fn export_single(&self, index: usize) -> Result<ExportedFile<'_>> {
        self.fragments
            .get(index)
            .map(|fragment| ExportedFile { name: fragment.name(), bytes: fragment.bytes() })
            .ok_or(SplitError::FragmentIndexOutOfRange { index, len: self.fragments.len() })
    }

    /// Every fragment as `(name, payload)`, in creation order.
    pub fn export_all(&self) -> Vec<ExportedFile<'_>> {
        self.fragments
            .iter()
            .map(|fragment| ExportedFile { name: fragment.name(), bytes: fragment.bytes() })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FragmentSet {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}
