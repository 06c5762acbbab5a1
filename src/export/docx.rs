//! Minimal WordprocessingML (.docx) writer.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::ExportError;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Write `text` as a .docx file with one paragraph per line.
pub fn export_docx(text: &str, path: &Path) -> Result<PathBuf, ExportError> {
    let document_xml = build_document_xml(text)?;

    let file = File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(RELS_XML.as_bytes())?;
    zip.start_file("word/document.xml", options)?;
    zip.write_all(&document_xml)?;
    zip.finish()?;

    log::info!("Exported {} line(s) to {:?}", text.lines().count(), path);
    Ok(path.to_path_buf())
}

/// Build `word/document.xml`.
fn build_document_xml(text: &str) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", WORD_NS)]),
    ))?;
    write_start(&mut writer, "w:body")?;

    for line in text.lines() {
        write_paragraph(&mut writer, line)?;
    }

    write_end(&mut writer, "w:body")?;
    write_end(&mut writer, "w:document")?;
    Ok(writer.into_inner())
}

/// Write `<w:p><w:r><w:t>line</w:t></w:r></w:p>`. Empty lines become empty paragraphs.
fn write_paragraph<W: Write>(writer: &mut Writer<W>, line: &str) -> Result<(), ExportError> {
    write_start(writer, "w:p")?;
    if !line.is_empty() {
        write_start(writer, "w:r")?;
        writer.write_event(Event::Start(
            BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(line)))?;
        write_end(writer, "w:t")?;
        write_end(writer, "w:r")?;
    }
    write_end(writer, "w:p")
}

fn write_start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn write_end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ExportError> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_entry(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        contents
    }

    #[test]
    fn test_one_paragraph_per_line() {
        let xml = String::from_utf8(build_document_xml("first\n\nthird").unwrap()).unwrap();
        assert_eq!(xml.matches("<w:p>").count(), 3);
        assert!(xml.contains(r#"<w:t xml:space="preserve">first</w:t>"#));
        assert!(xml.contains("<w:p></w:p>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = String::from_utf8(build_document_xml("a < b & c").unwrap()).unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_export_writes_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");

        let written = export_docx("Hello\nWorld", &path).unwrap();
        assert_eq!(written, path);

        let content_types = read_entry(&path, "[Content_Types].xml");
        assert!(content_types.contains("/word/document.xml"));
        let rels = read_entry(&path, "_rels/.rels");
        assert!(rels.contains("word/document.xml"));
        let document = read_entry(&path, "word/document.xml");
        assert!(document.contains("Hello"));
        assert!(document.contains("World"));
    }

    /// A sink that rejects every write.
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_an_error() {
        let mut writer = Writer::new(FullDisk);
        assert!(write_paragraph(&mut writer, "text").is_err());
        assert!(write_end(&mut writer, "w:body").is_err());
    }

    #[test]
    fn test_empty_text_has_empty_body() {
        let xml = String::from_utf8(build_document_xml("").unwrap()).unwrap();
        assert!(xml.contains("<w:body></w:body>"));
    }
}
