//! Incremental update: appended body, per-object xref subsections, /Prev
//! chaining.

use repdf::objects::{Name, Object};
use repdf::{Document, IndirectObject};
use std::io::Cursor;
use tempfile::TempDir;

/// Build a PDF with `count` empty page-ish objects and a classic xref.
/// Returns the bytes and the offset of the xref section.
fn pdf_with_objects(count: u32) -> (Vec<u8>, u64) {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::new();
    for id in 1..=count {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{id} 0 obj\n<</Index {id}>>\nendobj\n").as_bytes());
    }

    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", count + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!("trailer\n<</Size {}/Root 1 0 R>>\nstartxref\n{xref}\n%%EOF\n", count + 1)
            .as_bytes(),
    );
    (pdf, xref as u64)
}

#[test]
fn test_incremental_update_appends_new_object() {
    let (original, xref_offset) = pdf_with_objects(10);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("updated.pdf");

    let mut doc = Document::from_reader(Cursor::new(original.clone())).unwrap();
    assert_eq!(doc.objects().len(), 10);
    assert_eq!(doc.xref_offset(), Some(xref_offset));

    let mut annot = IndirectObject::new(11, 0);
    annot.set("Type", Name::new("Annot"));
    doc.add_object(annot);

    doc.save_incremental(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(&original), "original bytes must be kept");
    assert_eq!(bytes[original.len()], b'\r');

    let appended = String::from_utf8_lossy(&bytes[original.len()..]).into_owned();
    assert!(appended.starts_with("\r11 0 obj\n"));
    assert!(appended.contains("xref\n11 1\n"));
    assert!(appended.contains(&format!("/Prev {xref_offset}")));
    assert!(appended.contains("/Size 12"));
    assert!(appended.ends_with("%%EOF"));

    let reparsed = Document::open(&path).unwrap();
    assert_eq!(reparsed.objects().len(), 11);
    assert_eq!(reparsed.get_object(11, 0).unwrap().type_name(), Some("Annot"));
    assert_eq!(
        reparsed.trailer().get("Prev").and_then(Object::as_integer),
        Some(xref_offset as i64)
    );
    assert_eq!(
        reparsed.trailer().get("Size").and_then(Object::as_integer),
        Some(12)
    );
}

#[test]
fn test_update_offsets_point_into_the_appended_tail() {
    let (original, _) = pdf_with_objects(3);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("updated.pdf");

    let mut doc = Document::from_reader(Cursor::new(original)).unwrap();
    doc.add_object(IndirectObject::new(4, 0));
    doc.save_incremental(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let header = b"4 0 obj";
    let actual = bytes.windows(header.len()).position(|w| w == header).unwrap();

    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains(&format!("4 1\n{actual:010} 00000 n\r\n")));
}

#[test]
fn test_update_without_new_objects_leaves_trailer_alone() {
    let (original, _) = pdf_with_objects(2);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("updated.pdf");

    let mut doc = Document::from_reader(Cursor::new(original.clone())).unwrap();
    doc.save_incremental(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), original.len() + 1);
    assert_eq!(bytes.last(), Some(&b'\r'));
    assert!(!doc.trailer().has_key("Prev"));
}

#[test]
fn test_mutated_object_is_included_after_mark_updated() {
    let (original, _) = pdf_with_objects(2);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("updated.pdf");

    let mut doc = Document::from_reader(Cursor::new(original)).unwrap();
    let object = doc.get_object_mut(2, 0).unwrap();
    object.set("Rotated", 90i64);
    object.mark_updated();
    doc.save_incremental(&path).unwrap();

    let reparsed = Document::open(&path).unwrap();
    // The later body wins on reparse: same identity, updated dictionary
    let objects: Vec<_> = reparsed
        .objects()
        .iter()
        .filter(|o| o.matches(2, 0))
        .collect();
    assert_eq!(objects.len(), 2);
    assert!(objects[1].has_key("Rotated"));
}

#[test]
fn test_two_chained_updates() {
    let (original, first_xref) = pdf_with_objects(2);
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.pdf");

    let mut doc = Document::from_reader(Cursor::new(original)).unwrap();
    doc.add_object(IndirectObject::new(3, 0));
    doc.save_incremental(&first).unwrap();

    let first_bytes = std::fs::read(&first).unwrap();
    let second = dir.path().join("second.pdf");

    let mut doc = Document::open(&first).unwrap();
    let second_xref = doc.xref_offset().unwrap();
    assert_ne!(second_xref, first_xref, "update must append a fresh xref");
    doc.add_object(IndirectObject::new(4, 0));
    doc.save_incremental(&second).unwrap();

    let bytes = std::fs::read(&second).unwrap();
    assert!(bytes.starts_with(&first_bytes));

    let reparsed = Document::open(&second).unwrap();
    assert_eq!(
        reparsed.trailer().get("Prev").and_then(Object::as_integer),
        Some(second_xref as i64)
    );
    assert!(reparsed.get_object(3, 0).is_some());
    assert!(reparsed.get_object(4, 0).is_some());
}
