//! In-process sample documents for tests.
//!
//! Every page shows the text `Page N` so assembled output can be checked page by page.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

/// A document of `page_count` US Letter pages with the shared `Resources` and `MediaBox`
/// stored on the page tree root.
pub fn sample_pdf(page_count: u32) -> Vec<u8> {
    sample_pdf_with_padding(&vec![0; page_count as usize])
}

/// Like [`sample_pdf`], with `padding[i]` extra bytes of content on page `i + 1`.
///
/// Lets tests control how large each page serializes.
pub fn sample_pdf_with_padding(padding: &[usize]) -> Vec<u8> {
    let mut doc = build_document(padding);
    save(&mut doc)
}

/// A parseable document that carries an `/Encrypt` trailer entry.
pub fn encrypted_marker_pdf() -> Vec<u8> {
    let mut doc = build_document(&[0]);
    doc.trailer.set("Encrypt", Object::Null);
    save(&mut doc)
}

fn build_document(padding: &[usize]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::with_capacity(padding.len());
    for (index, extra) in padding.iter().enumerate() {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
            Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    format!("Page {}", index + 1).into_bytes(),
                    StringFormat::Literal,
                )],
            ),
        ];
        if *extra > 0 {
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(vec![b'x'; *extra], StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let encoded = Content { operations }.encode().unwrap_or_default();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect())),
            ("Count", Object::Integer(page_ids.len() as i64)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Err(err) = doc.save_to(&mut buffer) {
        panic!("sample document should serialize: {err}");
    }
    buffer
}
