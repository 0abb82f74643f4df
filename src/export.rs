//! PDF export of an answer, grade report, or study plan.
//!
//! Produces a plain US Letter document: a bold title followed by the body,
//! one line per row at a fixed line height, continued on new pages as
//! needed. Layout is computed by [`layout`] and written with `lopdf`.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;
const MARGIN_X: i64 = 50;
const BOTTOM_MARGIN: i64 = 50;
const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 11;
const LINE_HEIGHT: i64 = 16;
/// Roughly the width of the text column in 11pt Helvetica.
const WRAP_CHARS: usize = 90;

/// A line of text at a fixed baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedLine {
    pub y: i64,
    pub text: String,
    pub title: bool,
}

/// Assign every line of `title` and `body` to a page and baseline.
pub fn layout(title: &str, body: &str) -> Vec<Vec<PlacedLine>> {
    let mut pages = vec![Vec::new()];
    let mut y = PAGE_HEIGHT - 60;

    if let Some(page) = pages.last_mut() {
        page.push(PlacedLine {
            y,
            text: sanitize(title),
            title: true,
        });
    }
    y -= 30;

    for line in body.lines().flat_map(wrap) {
        if y < BOTTOM_MARGIN {
            pages.push(Vec::new());
            y = PAGE_HEIGHT - BOTTOM_MARGIN;
        }
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine {
                y,
                text: line,
                title: false,
            });
        }
        y -= LINE_HEIGHT;
    }

    pages
}

/// Render `title` and `body` as PDF bytes.
pub fn render_pdf(title: &str, body: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in layout(title, body) {
        let mut operations = Vec::with_capacity(page.len() * 4);
        for line in page {
            let (font, size) = if line.title {
                ("F2", TITLE_SIZE)
            } else {
                ("F1", BODY_SIZE)
            };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
            operations.push(Operation::new("Td", vec![MARGIN_X.into(), line.y.into()]));
            let latin1: Vec<u8> = line.text.chars().map(|c| c as u8).collect();
            operations.push(Operation::new("Tj", vec![Object::string_literal(latin1)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Break a long line at word boundaries.
fn wrap(line: &str) -> Vec<String> {
    let line = sanitize(line);
    if line.chars().count() <= WRAP_CHARS {
        return vec![line];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split(' ') {
        let needed = current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > WRAP_CHARS && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        while current.chars().count() > WRAP_CHARS {
            let head: String = current.chars().take(WRAP_CHARS).collect();
            let tail: String = current.chars().skip(WRAP_CHARS).collect();
            out.push(head);
            current = tail;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// The standard fonts only cover Latin-1; anything else prints as `?`.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            '\u{2022}' => '*',
            c if (' '..='~').contains(&c) || ('\u{a0}'..='\u{ff}').contains(&c) => c,
            _ => '?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_first_line_positions() {
        let pages = layout("Grade Report", "Total: 253/300");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0][0].y, 732);
        assert!(pages[0][0].title);
        assert_eq!(pages[0][1].y, 702);
        assert_eq!(pages[0][1].text, "Total: 253/300");
    }

    #[test]
    fn test_long_body_paginates() {
        let body = (1..=100)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let pages = layout("Study Plan", &body);
        // 41 body lines fit under the title, 44 on each later page.
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 1 + 41);
        assert_eq!(pages[1].len(), 44);
        assert_eq!(pages[1][0].y, PAGE_HEIGHT - BOTTOM_MARGIN);
        assert!(pages.iter().flatten().all(|l| l.y >= BOTTOM_MARGIN));
    }

    #[test]
    fn test_wrap_long_lines() {
        let long = "word ".repeat(50);
        let lines = wrap(long.trim());
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= WRAP_CHARS));
        assert_eq!(lines.join(" "), long.trim());
    }

    #[test]
    fn test_sanitize_replaces_unsupported() {
        assert_eq!(sanitize("a\tb • ಕ"), "a b * ?");
    }

    #[test]
    fn test_render_pdf_page_count() {
        let body = vec!["x"; 100].join("\n");
        let bytes = render_pdf("Answer", &body).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_render_empty_body() {
        let bytes = render_pdf("Answer", "").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
