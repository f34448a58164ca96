//! Bundling every fragment into one downloadable ZIP archive.

use crate::error::Result;
use crate::fragment::FragmentSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_BUNDLE_NAME: &str = "fragmentos_pdf.zip";

/// Flat archive with one deflated entry per fragment, named after it, in creation order.
pub fn bundle(fragments: &FragmentSet) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in fragments.export_all() {
        writer.start_file(file.name, options)?;
        writer.write_all(file.bytes)?;
    }

    let bytes = writer.finish()?.into_inner();
    tracing::info!(entries = fragments.len(), bytes = bytes.len(), "bundled fragments");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::build_all;
    use crate::progress::ignore_progress;
    use crate::strategy::range_partition;
    use pdf_engine::fixtures::sample_pdf;
    use pdf_engine::{LopdfEngine, OpenSource, PdfEngine};
    use std::io::Read;
    use zip::ZipArchive;

    fn five_page_fragments() -> FragmentSet {
        let mut engine = LopdfEngine::new();
        let handle = engine.open(OpenSource::Bytes(sample_pdf(5))).expect("open");
        let metadata = engine.metadata(handle).expect("metadata");
        let partition = range_partition(&metadata, 2).expect("valid");

        build_all(&engine, handle, &partition, &mut ignore_progress).expect("build")
    }

    #[test]
    fn archive_holds_every_fragment_flat_and_in_order() {
        let fragments = five_page_fragments();
        let bytes = bundle(&fragments).expect("bundle");

        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
        assert_eq!(archive.len(), 3);

        for (index, fragment) in fragments.iter().enumerate() {
            let mut entry = archive.by_index(index).expect("entry");
            assert_eq!(entry.name(), fragment.name());
            assert!(!entry.name().contains('/'));

            let mut payload = Vec::new();
            entry.read_to_end(&mut payload).expect("read entry");
            assert_eq!(payload, fragment.bytes());
        }
    }

    #[test]
    fn empty_set_gives_empty_archive() {
        let bytes = bundle(&FragmentSet::default()).expect("bundle");
        let archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");

        assert_eq!(archive.len(), 0);
    }
}
