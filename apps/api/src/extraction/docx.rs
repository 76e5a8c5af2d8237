use std::io::{Cursor, Read};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts the text of every non-empty paragraph, joined by newlines.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::ExtractionFailed(format!("not a Word document: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::ExtractionFailed(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::ExtractionFailed(e.to_string()))?;

    paragraphs_from_xml(&xml)
        .map(|paragraphs| paragraphs.join("\n"))
        .map_err(|e| ExtractionError::ExtractionFailed(format!("malformed document XML: {e}")))
}

/// Paragraphs in opening order. A paragraph nested inside another (text box
/// content) gets its own line; the enclosing paragraph keeps its own runs.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut slots: Vec<String> = Vec::new();
    // Slot indexes of the paragraphs currently open, innermost last.
    let mut open: Vec<usize> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.push(slots.len());
                    slots.push(String::new());
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.pop();
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(&slot) = open.last() {
                    match e.name().as_ref() {
                        b"w:tab" => slots[slot].push('\t'),
                        b"w:br" | b"w:cr" => slots[slot].push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(e) if in_text => {
                if let Some(&slot) = open.last() {
                    slots[slot].push_str(&e.xml_content()?);
                }
            }
            Event::GeneralRef(e) if in_text => {
                if let Some(&slot) = open.last() {
                    if let Some(ch) = e.resolve_char_ref()? {
                        slots[slot].push(ch);
                    } else if let Some(resolved) = resolve_predefined_entity(&e.decode()?) {
                        slots[slot].push_str(resolved);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    slots.retain(|p| !p.is_empty());
    Ok(slots)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    /// Builds a minimal .docx archive with one `w:p` per paragraph.
    pub(crate) fn make_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        make_docx_from_body(&body)
    }

    pub(crate) fn make_docx_from_body(body: &str) -> Vec<u8> {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_joined_with_newlines() {
        let docx = make_docx(&["Jane Doe", "Skills: Python, Go"]);
        assert_eq!(extract_docx_text(&docx).unwrap(), "Jane Doe\nSkills: Python, Go");
    }

    #[test]
    fn test_empty_paragraphs_skipped() {
        let docx = make_docx_from_body(
            "<w:p><w:r><w:t>First</w:t></w:r></w:p><w:p/><w:p><w:r><w:t></w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx_text(&docx).unwrap(), "First\nSecond");
    }

    #[test]
    fn test_runs_within_paragraph_are_concatenated() {
        let docx = make_docx_from_body(
            "<w:p><w:r><w:t>Jane</w:t></w:r><w:r><w:t xml:space=\"preserve\"> Doe</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx_text(&docx).unwrap(), "Jane Doe");
    }

    #[test]
    fn test_tabs_and_entities() {
        let docx = make_docx_from_body(
            "<w:p><w:r><w:t>R&amp;D</w:t><w:tab/><w:t>2020</w:t></w:r></w:p>",
        );
        assert_eq!(extract_docx_text(&docx).unwrap(), "R&D\t2020");
    }

    #[test]
    fn test_text_box_keeps_enclosing_paragraph() {
        let docx = make_docx_from_body(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r>\
             <w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Boxed</w:t></w:r></w:p></w:txbxContent></w:pict></w:r>\
             <w:r><w:t xml:space=\"preserve\"> Senior Engineer</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Skills: Rust</w:t></w:r></w:p>",
        );
        assert_eq!(
            extract_docx_text(&docx).unwrap(),
            "Jane Doe Senior Engineer\nBoxed\nSkills: Rust"
        );
    }

    #[test]
    fn test_non_zip_input_fails() {
        let err = extract_docx_text(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(_)));
    }

    #[test]
    fn test_zip_without_document_part_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_docx_text(&bytes).unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(msg) if msg.contains(DOCUMENT_PART)));
    }
}
