//! Minimal PDF 1.4 serializer for a laid-out document.
//!
//! Uses the standard Helvetica / Helvetica-Bold fonts with WinAnsiEncoding, so
//! nothing is embedded. Content streams are left uncompressed. The output is a
//! pure function of its input.
//!
//! Object layout:
//! ```text
//! 1            Catalog
//! 2            Pages
//! 3, 4         Fonts (F1 regular, F2 bold)
//! 5 + 2i       Page i
//! 6 + 2i       Content stream of page i
//! ```

use crate::export::font_metrics::{FontStyle, PageConfig, MM_PER_PT};
use crate::export::layout::{LaidOutDocument, LaidOutPage};

const FIRST_PAGE_OBJECT: usize = 5;

fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

/// Accumulates objects and remembers their byte offsets for the xref table.
struct PdfWriter {
    buf: String,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        Self {
            buf: String::from("%PDF-1.4\n"),
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &str) {
        debug_assert_eq!(id, self.offsets.len() + 1, "objects must be written in order");
        self.offsets.push(self.buf.len());
        self.buf.push_str(&format!("{id} 0 obj\n{body}\nendobj\n"));
    }

    fn stream(&mut self, id: usize, content: &str) {
        let body = format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        );
        self.object(id, &body);
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;
        self.buf.push_str(&format!("xref\n0 {size}\n0000000000 65535 f \n"));
        for offset in &self.offsets {
            self.buf.push_str(&format!("{offset:010} 00000 n \n"));
        }
        self.buf.push_str(&format!(
            "trailer\n<< /Size {size} /Root {root} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        ));
        self.buf.into_bytes()
    }
}

/// Serializes the document. Every page shares the config's page size.
pub fn render_pdf(document: &LaidOutDocument, config: &PageConfig) -> Vec<u8> {
    let mut writer = PdfWriter::new();
    let page_count = document.pages.len();

    writer.object(1, "<< /Type /Catalog /Pages 2 0 R >>");

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
        .collect();
    writer.object(
        2,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
            kids.join(" ")
        ),
    );

    for (id, style) in [(3, FontStyle::Regular), (4, FontStyle::Bold)] {
        writer.object(
            id,
            &format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                style.base_font()
            ),
        );
    }

    let media_box = format!(
        "[0 0 {:.2} {:.2}]",
        mm_to_pt(config.page_width_mm),
        mm_to_pt(config.page_height_mm)
    );
    let resources = format!(
        "<< /Font << /{} 3 0 R /{} 4 0 R >> >>",
        FontStyle::Regular.resource_name(),
        FontStyle::Bold.resource_name()
    );

    for (i, page) in document.pages.iter().enumerate() {
        let page_id = FIRST_PAGE_OBJECT + 2 * i;
        let content_id = page_id + 1;
        writer.object(
            page_id,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox {media_box} /Resources {resources} /Contents {content_id} 0 R >>"
            ),
        );
        writer.stream(content_id, &page_content(page, config));
    }

    writer.finish(1)
}

fn page_content(page: &LaidOutPage, config: &PageConfig) -> String {
    page.lines
        .iter()
        .map(|line| {
            format!(
                "BT /{} {:.2} Tf {:.2} {:.2} Td ({}) Tj ET",
                line.style.resource_name(),
                line.size_pt,
                mm_to_pt(line.x_mm),
                mm_to_pt(config.page_height_mm - line.baseline_mm),
                encode_text(&line.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Encodes text as the body of a PDF literal string in WinAnsiEncoding.
///
/// Characters without a WinAnsi code point become `?`.
pub fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\t' => out.push(' '),
            _ => match win_ansi_code(c) {
                Some(code) => out.push_str(&format!("\\{code:03o}")),
                None => out.push('?'),
            },
        }
    }
    out
}

/// WinAnsi byte for a non-ASCII character, if the encoding has one.
fn win_ansi_code(c: char) -> Option<u8> {
    let code = match c {
        '\u{20AC}' => 0x80, // €
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85, // …
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95, // •
        '\u{2013}' => 0x96, // –
        '\u{2014}' => 0x97, // em dash
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        '\u{00A0}'..='\u{00FF}' => c as u32,
        _ => return None,
    };
    u8::try_from(code).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::font_metrics::default_page_config;
    use crate::export::layout::TextLine;

    fn document(pages: usize) -> LaidOutDocument {
        LaidOutDocument {
            pages: (0..pages)
                .map(|i| LaidOutPage {
                    lines: vec![TextLine {
                        style: FontStyle::Regular,
                        size_pt: 11.0,
                        x_mm: 15.0,
                        baseline_mm: 20.0,
                        text: format!("page {i}"),
                    }],
                })
                .collect(),
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_pdf_envelope() {
        let pdf = as_text(&render_pdf(&document(1), &default_page_config()));
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("/BaseFont /Helvetica "));
        assert!(pdf.contains("/BaseFont /Helvetica-Bold "));
        assert!(pdf.contains("(page 0) Tj"));
    }

    #[test]
    fn test_page_count_matches_document() {
        let pdf = as_text(&render_pdf(&document(3), &default_page_config()));
        assert!(pdf.contains("/Count 3"));
        assert_eq!(pdf.matches("/Type /Page ").count(), 3);
        assert!(pdf.contains("/Kids [5 0 R 7 0 R 9 0 R]"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = as_text(&render_pdf(&document(2), &default_page_config()));

        let startxref = pdf.rfind("startxref\n").unwrap();
        let xref_offset: usize = pdf[startxref + "startxref\n".len()..]
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(pdf[xref_offset..].starts_with("xref\n"));

        let entries: Vec<&str> = pdf[xref_offset..].lines().skip(3).take(8).collect();
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(
                pdf[offset..].starts_with(&format!("{} 0 obj", i + 1)),
                "xref entry {} is wrong",
                i + 1
            );
        }
    }

    #[test]
    fn test_stream_length_is_exact() {
        let pdf = as_text(&render_pdf(&document(1), &default_page_config()));
        let start = pdf.find("/Length ").unwrap() + "/Length ".len();
        let declared: usize = pdf[start..].split_whitespace().next().unwrap().parse().unwrap();
        let body_start = pdf.find("stream\n").unwrap() + "stream\n".len();
        let body_end = pdf.find("\nendstream").unwrap();
        assert_eq!(body_end - body_start, declared);
    }

    #[test]
    fn test_encode_text_escapes_delimiters() {
        assert_eq!(encode_text(r"f(x) = a\b"), r"f\(x\) = a\\b");
    }

    #[test]
    fn test_encode_text_maps_win_ansi_characters() {
        assert_eq!(encode_text("café"), "caf\\351");
        assert_eq!(encode_text("a – b"), "a \\226 b");
        assert_eq!(encode_text("\u{2019}"), "\\222");
    }

    #[test]
    fn test_encode_text_replaces_unsupported_characters() {
        assert_eq!(encode_text("ok 🤖"), "ok ?");
        assert_eq!(encode_text("日本"), "??");
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = default_page_config();
        assert_eq!(
            render_pdf(&document(2), &config),
            render_pdf(&document(2), &config)
        );
    }
}
