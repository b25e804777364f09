//! Parse → write → reparse round trips over in-memory and on-disk PDFs.

use repdf::objects::Object;
use repdf::{Document, PdfError};
use std::io::Cursor;
use tempfile::TempDir;

/// A three-object PDF (catalog, pages, one empty page) with a classic xref
/// table whose offsets are computed, not guessed.
fn minimal_pdf() -> Vec<u8> {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    let o1 = pdf.len();
    pdf.extend_from_slice(b"1 0 obj\n<</Type/Catalog/Pages 2 0 R>>\nendobj\n");
    let o2 = pdf.len();
    pdf.extend_from_slice(b"2 0 obj\n<</Type/Pages/Kids[3 0 R]/Count 1>>\nendobj\n");
    let o3 = pdf.len();
    pdf.extend_from_slice(b"3 0 obj\n<</Type/Page/Parent 2 0 R>>\nendobj\n");
    let xref = pdf.len();
    pdf.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
    pdf.extend_from_slice(
        format!("{o1:010} 00000 n \n{o2:010} 00000 n \n{o3:010} 00000 n \n").as_bytes(),
    );
    pdf.extend_from_slice(b"trailer\n<</Size 4/Root 1 0 R>>\nstartxref\n");
    pdf.extend_from_slice(format!("{xref}\n%%EOF\n").as_bytes());
    pdf
}

fn parse(bytes: Vec<u8>) -> Document<Cursor<Vec<u8>>> {
    Document::from_reader(Cursor::new(bytes)).expect("parse failed")
}

#[test]
fn test_minimal_pdf_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.pdf");

    let mut doc = parse(minimal_pdf());
    assert_eq!(doc.objects().len(), 3);
    assert_eq!(doc.version().to_string(), "1.4");

    doc.save(&path).unwrap();

    let mut reparsed = Document::open(&path).unwrap();
    assert_eq!(reparsed.objects().len(), 3);
    assert_eq!(
        reparsed.trailer().get("Size").and_then(Object::as_integer),
        Some(4)
    );

    for object in doc.objects() {
        let other = reparsed
            .get_object(object.object_id(), object.generation())
            .expect("object lost in round trip");
        assert_eq!(object.dictionary(), other.dictionary());
    }

    // A second round trip is byte-stable apart from nothing at all
    let second = dir.path().join("out2.pdf");
    reparsed.save(&second).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_rewritten_xref_offsets_point_at_objects() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.pdf");

    let mut doc = parse(minimal_pdf());
    doc.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let reparsed = Document::open(&path).unwrap();

    for entry in reparsed.xref_table() {
        if !entry.used {
            continue;
        }
        let header = format!("{} {} obj", entry.object_id, entry.generation);
        let actual = bytes
            .windows(header.len())
            .position(|w| w == header.as_bytes())
            .expect("object header not found") as u64;
        assert_eq!(entry.offset, actual, "xref offset for {header}");
        assert!(entry.linked);
    }
}

#[test]
fn test_stream_with_wrong_length_is_recovered() {
    let payload: Vec<u8> = (0..137u32).map(|i| (i % 251) as u8 | 1).collect();
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.5\n");
    pdf.extend_from_slice(b"4 0 obj\n<</Length 100>>\nstream\n");
    pdf.extend_from_slice(&payload);
    pdf.extend_from_slice(b"\nendstream\nendobj\n");
    pdf.extend_from_slice(b"startxref\n0\n%%EOF\n");

    let mut doc = parse(pdf);
    let object = doc.get_object(4, 0).unwrap();
    assert_eq!(object.get("Length").and_then(Object::as_integer), Some(137));

    let stream = object.data()[0].as_stream().unwrap();
    assert_eq!(stream.len(), 137);

    // Round trip: the corrected length and the exact payload survive
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.pdf");
    doc.save(&path).unwrap();

    let reparsed = Document::open(&path).unwrap();
    let object = reparsed.get_object(4, 0).unwrap();
    assert_eq!(object.get("Length").and_then(Object::as_integer), Some(137));

    let rendered = String::from_utf8_lossy(&std::fs::read(&path).unwrap()).into_owned();
    assert!(rendered.contains("/Length 137"));
}

#[test]
fn test_startxref_without_xref_section() {
    let pdf = b"%PDF-1.3\n1 0 obj\n<<>>\nendobj\nstartxref\n0\n%%EOF\n".to_vec();
    let doc = parse(pdf);

    assert_eq!(doc.xref_offset(), Some(0));
    assert!(doc.trailer().dictionary().is_empty());
    assert!(doc.xref_table().is_empty());
}

#[test]
fn test_junk_second_line_is_tolerated_once() {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    pdf.extend_from_slice(b"\xef\xbb\xbf binary marker gone wrong\n");
    pdf.extend_from_slice(b"1 0 obj\n<</Type/Catalog>>\nendobj\n");
    pdf.extend_from_slice(b"startxref\n0\n%%EOF\n");

    let doc = parse(pdf);
    assert_eq!(doc.objects().len(), 1);
}

#[test]
fn test_junk_line_later_fails() {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    pdf.extend_from_slice(b"1 0 obj\n<</Type/Catalog>>\nendobj\n");
    pdf.extend_from_slice(b"\xef\xbb\xbf broken line\n");
    pdf.extend_from_slice(b"startxref\n0\n%%EOF\n");

    let result = Document::from_reader(Cursor::new(pdf));
    assert!(matches!(result, Err(PdfError::InvalidLine { .. })));
}

#[test]
fn test_reference_number_disambiguation_in_object_body() {
    let pdf = b"%PDF-1.4\n7 0 obj\n[ 12 0 R 12 0 ]\nendobj\nstartxref\n0\n%%EOF\n".to_vec();
    let doc = parse(pdf);

    let object = doc.get_object(7, 0).unwrap();
    let array = object.data()[0].as_array().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(
        array.get(0).unwrap().as_reference().map(|r| (r.number(), r.generation())),
        Some((12, 0))
    );
    assert_eq!(array.get(1).unwrap().as_integer(), Some(12));
    assert_eq!(array.get(2).unwrap().as_integer(), Some(0));
}

#[test]
fn test_indirect_placeholder_object() {
    let pdf = b"%PDF-1.4\n9 0 obj\n 1234\nendobj\nstartxref\n0\n%%EOF\n".to_vec();
    let mut doc = parse(pdf);

    let object = doc.get_object(9, 0).unwrap();
    assert!(object.is_indirect());
    assert_eq!(object.indirect_offset(), 1234);

    // Rendered as a bare integer block
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.pdf");
    doc.save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("9 0 obj\n   1234\nendobj\n"));
}

#[test]
fn test_set_stream_data_keeps_length_consistent() {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n5 0 obj\n<</Length 3>>\nstream\nabc\nendstream\nendobj\n");
    pdf.extend_from_slice(b"startxref\n0\n%%EOF\n");

    let mut doc = parse(pdf);
    let object = doc.get_object_mut(5, 0).unwrap();
    assert!(object.set_stream_data(&b"longer payload"[..]));
    object.mark_updated();
    assert_eq!(
        object.get("Length").and_then(Object::as_integer),
        Some(14)
    );

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.pdf");
    doc.save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("stream\nlonger payload\nendstream\n"));
    assert!(text.contains("/Length 14"));
}

#[test]
fn test_crlf_line_endings_parse() {
    let pdf = b"%PDF-1.4\r\n1 0 obj\r\n<</Type/Catalog>>\r\nendobj\r\nstartxref\r\n0\r\n%%EOF\r\n"
        .to_vec();
    let doc = parse(pdf);
    assert_eq!(doc.objects().len(), 1);
    assert_eq!(doc.get_object(1, 0).unwrap().type_name(), Some("Catalog"));
}

#[test]
fn test_invalid_header_is_rejected() {
    let result = Document::from_reader(Cursor::new(b"%PFD-1.4\n".to_vec()));
    assert!(matches!(result, Err(PdfError::InvalidHeader)));
}
