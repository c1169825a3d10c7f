//! In-memory PDF builders for tests.

use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream, dictionary};

/// Build a PDF with one page per entry, each page showing its text in Helvetica.
///
/// An empty slice yields a valid document with zero pages.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    save(build_document(pages, 0))
}

/// Like [`pdf_with_pages`], followed by `unreadable` pages without a media box.
///
/// The text extractor cannot lay those pages out, so any attempt to decode
/// one of them fails.
pub fn pdf_with_unreadable_tail(pages: &[&str], unreadable: usize) -> Vec<u8> {
    save(build_document(pages, unreadable))
}

/// Build a password-protected PDF (RC4, 128-bit key).
///
/// With an empty `user_password` any reader can open it; otherwise the
/// document cannot be read without the password.
pub fn encrypted_pdf_with_pages(pages: &[&str], user_password: &str) -> Vec<u8> {
    let mut doc = build_document(pages, 0);
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::string_literal(b"jaarverslag-test-id".to_vec()),
            Object::string_literal(b"jaarverslag-test-id".to_vec()),
        ]),
    );

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password,
        key_length: 128,
        permissions: Permissions::PRINTABLE | Permissions::COPYABLE,
    })
    .expect("build encryption state");
    doc.encrypt(&state).expect("encrypt test PDF");

    save(doc)
}

fn build_document(pages: &[&str], unreadable: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len() + unreadable);
    for text in pages {
        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escape_pdf_string(text));
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    // Neither these pages nor the page tree root carry a MediaBox.
    for _ in 0..unreadable {
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test PDF");
    buf
}

fn escape_pdf_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}
