//! Plain text to paginated A4 PDF.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use super::ExportError;

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

const A4_WIDTH_PT: f32 = 210.0 * PT_PER_MM;
const A4_HEIGHT_PT: f32 = 297.0 * PT_PER_MM;

const MARGIN_PT: f32 = 15.0 * PT_PER_MM;
/// Width available to a line of text.
const MEASURE_PT: f32 = 180.0 * PT_PER_MM;

const FONT_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = FONT_SIZE * 1.2;

/// Write `text` to an A4 PDF in 12pt Helvetica, wrapping and paginating.
pub fn export_pdf(text: &str, path: &Path) -> Result<PathBuf, ExportError> {
    let lines = wrap_text(text, MEASURE_PT);
    let pages = paginate(&lines, lines_per_page());

    let mut doc = build_document(&pages)?;
    doc.compress();
    doc.save(path)?;

    log::info!(
        "Exported {} line(s) on {} page(s) to {:?}",
        lines.len(),
        pages.len(),
        path
    );
    Ok(path.to_path_buf())
}

fn lines_per_page() -> usize {
    (((A4_HEIGHT_PT - 2.0 * MARGIN_PT) / LINE_HEIGHT).floor() as usize).max(1)
}

/// Approximate advance width of `c` in Helvetica, in thousandths of an em.
fn glyph_width(c: char) -> u16 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' => 222,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'f' | 't' | 'I' | '/' | '[' | ']' | '(' | ')' => 278,
        'r' | '-' | '"' => 333,
        'm' | 'M' | 'W' | '%' => 833,
        'w' => 722,
        'A'..='Z' => 667,
        '0'..='9' => 556,
        _ => 556,
    }
}

fn text_width(s: &str) -> f32 {
    s.chars().map(|c| glyph_width(c) as f32).sum::<f32>() * FONT_SIZE / 1000.0
}

/// Break `text` into lines no wider than `max_width` points.
///
/// Input line breaks are kept, words are wrapped greedily, and a word wider
/// than the measure is split across lines.
pub(crate) fn wrap_text(text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // Hard-break words that do not fit on a line of their own
            for c in word.chars() {
                current.push(c);
                if text_width(&current) > max_width {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }

    lines
}

/// Split lines into pages. Always yields at least one (possibly empty) page.
pub(crate) fn paginate(lines: &[String], per_page: usize) -> Vec<&[String]> {
    if lines.is_empty() {
        return vec![lines];
    }
    lines.chunks(per_page.max(1)).collect()
}

/// Encode as WinAnsi bytes; characters the font cannot show become `?`.
fn encode_line(line: &str) -> Vec<u8> {
    line.chars().map(win_ansi_byte).collect()
}

/// WinAnsiEncoding agrees with Latin-1 except in 0x80..=0x9F, where it
/// places typographic glyphs instead of the C1 controls.
fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{20AC}' => 0x80, // euro sign
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85, // ellipsis
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91, // curly quotes
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95, // bullet
        '\u{2013}' => 0x96, // en dash
        '\u{2014}' => 0x97, // em dash
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        '\u{0000}'..='\u{007F}' | '\u{00A0}'..='\u{00FF}' => c as u8,
        _ => b'?',
    }
}

fn page_content(lines: &[String]) -> Content {
    let top = A4_HEIGHT_PT - MARGIN_PT - FONT_SIZE;
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Real(FONT_SIZE)]),
        Operation::new("TL", vec![Object::Real(LINE_HEIGHT)]),
        Operation::new("Td", vec![Object::Real(MARGIN_PT), Object::Real(top)]),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_line(line))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

fn build_document(pages: &[&[String]]) -> Result<Document, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in pages {
        let content = page_content(lines);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id: ObjectId = doc.add_object(dictionary! {
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
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(A4_WIDTH_PT),
                Object::Real(A4_HEIGHT_PT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_lines_are_kept() {
        let lines = wrap_text("one\n\ntwo", MEASURE_PT);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_long_line_wraps_on_words() {
        let text = "word ".repeat(200);
        let lines = wrap_text(&text, MEASURE_PT);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width(l) <= MEASURE_PT));
        assert!(lines.iter().all(|l| !l.starts_with(' ') && !l.ends_with(' ')));
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.len(), 200);
    }

    #[test]
    fn test_oversized_word_is_split() {
        let word = "x".repeat(400);
        let lines = wrap_text(&word, MEASURE_PT);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        assert!(lines.iter().all(|l| text_width(l) <= MEASURE_PT));
    }

    #[test]
    fn test_paginate() {
        let lines: Vec<String> = (0..120).map(|i| i.to_string()).collect();
        let pages = paginate(&lines, 50);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].len(), 20);
        assert_eq!(paginate(&[], 50).len(), 1);
    }

    #[test]
    fn test_page_geometry() {
        // A4 with 15mm margins and 14.4pt leading fits 52 lines
        assert_eq!(lines_per_page(), 52);
        assert!((A4_WIDTH_PT - 595.28).abs() < 0.01);
    }

    #[test]
    fn test_encode_line() {
        assert_eq!(encode_line("café"), b"caf\xe9".to_vec());
        assert_eq!(encode_line("日本"), b"??".to_vec());
    }

    #[test]
    fn test_encode_typographic_punctuation() {
        assert_eq!(
            encode_line("\u{201C}Hi\u{201D} \u{2013} it\u{2019}s \u{20AC}5\u{2026}"),
            b"\x93Hi\x94 \x96 it\x92s \x805\x85".to_vec()
        );
        assert_eq!(encode_line("\u{2014}\u{2022}\u{2122}"), b"\x97\x95\x99".to_vec());
        // C1 controls have no glyph at those codes
        assert_eq!(encode_line("\u{0085}\u{0093}"), b"??".to_vec());
    }

    #[test]
    fn test_export_pdf_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.pdf");
        let text = (0..120).map(|i| format!("Line {i}")).collect::<Vec<_>>().join("\n");

        assert_eq!(export_pdf(&text, &path).unwrap(), path);

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_export_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        export_pdf("", &path).unwrap();
        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
