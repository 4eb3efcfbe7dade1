//! Page layout for the transcript export.
//!
//! Positions every line of the document before any PDF bytes are written:
//! title, then per turn a bold header and the body reflowed to the text width.
//! Lines are placed top-down; a line that would cross the bottom margin starts a
//! new page. Coordinates are millimetres from the page's top-left corner.

use crate::chat::models::TIMESTAMP_FORMAT;
use crate::chat::{Transcript, Turn};
use crate::export::font_metrics::{get_metrics, FontMetricTable, FontStyle, PageConfig, MM_PER_PT};

pub const DOCUMENT_TITLE: &str = "Chat History";
const TAB: &str = "    ";

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub style: FontStyle,
    pub size_pt: f32,
    pub x_mm: f32,
    /// Baseline position measured from the top edge.
    pub baseline_mm: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub pages: Vec<LaidOutPage>,
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Top-down placement with automatic page breaks.
struct PageCursor<'a> {
    config: &'a PageConfig,
    pages: Vec<LaidOutPage>,
    y_mm: f32,
}

impl<'a> PageCursor<'a> {
    fn new(config: &'a PageConfig) -> Self {
        Self {
            config,
            pages: vec![LaidOutPage::default()],
            y_mm: config.margin_mm,
        }
    }

    /// Places one line occupying a `line_mm` tall cell.
    fn place(&mut self, style: FontStyle, size_pt: f32, line_mm: f32, align: Align, text: String) {
        if self.y_mm + line_mm > self.config.bottom_limit_mm() && self.y_mm > self.config.margin_mm
        {
            self.pages.push(LaidOutPage::default());
            self.y_mm = self.config.margin_mm;
        }

        let x_mm = match align {
            Align::Left => self.config.margin_mm,
            Align::Center => {
                let width = get_metrics(style).measure_str(&text, size_pt);
                self.config.margin_mm + ((self.config.text_width_mm() - width) / 2.0).max(0.0)
            }
        };
        // Vertically centred in the cell, as a text cell would be.
        let baseline_mm = self.y_mm + 0.5 * line_mm + 0.3 * size_pt * MM_PER_PT;

        if !text.is_empty() {
            if let Some(page) = self.pages.last_mut() {
                page.lines.push(TextLine {
                    style,
                    size_pt,
                    x_mm,
                    baseline_mm,
                    text,
                });
            }
        }
        self.y_mm += line_mm;
    }

    /// Vertical space. Never breaks a page by itself.
    fn gap(&mut self, mm: f32) {
        self.y_mm += mm;
    }

    fn finish(self) -> LaidOutDocument {
        LaidOutDocument { pages: self.pages }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out the whole transcript. An empty transcript yields one page holding
/// only the title.
pub fn layout_transcript(transcript: &Transcript, config: &PageConfig) -> LaidOutDocument {
    let mut cursor = PageCursor::new(config);

    cursor.place(
        FontStyle::Regular,
        config.title_size_pt,
        config.title_line_mm,
        Align::Center,
        DOCUMENT_TITLE.to_string(),
    );
    cursor.gap(config.title_gap_mm);

    for turn in transcript.all() {
        layout_turn(&mut cursor, turn, config);
    }

    cursor.finish()
}

/// `[YYYY-MM-DD HH:MM:SS] User:` style header line.
fn turn_header(turn: &Turn) -> String {
    format!(
        "[{}] {}:",
        turn.timestamp().format(TIMESTAMP_FORMAT),
        turn.role().label()
    )
}

fn layout_turn(cursor: &mut PageCursor<'_>, turn: &Turn, config: &PageConfig) {
    let width = config.text_width_mm();

    let header_metrics = get_metrics(FontStyle::Bold);
    for line in wrap_text(&turn_header(turn), header_metrics, config.header_size_pt, width) {
        cursor.place(
            FontStyle::Bold,
            config.header_size_pt,
            config.header_line_mm,
            Align::Left,
            line,
        );
    }

    let body_metrics = get_metrics(FontStyle::Regular);
    for line in wrap_text(turn.text(), body_metrics, config.body_size_pt, width) {
        cursor.place(
            FontStyle::Regular,
            config.body_size_pt,
            config.body_line_mm,
            Align::Left,
            line,
        );
    }

    cursor.gap(config.turn_gap_mm);
}

// ────────────────────────────────────────────────────────────────────────────
// Word wrap
// ────────────────────────────────────────────────────────────────────────────

/// Greedy word wrap at `max_width_mm`.
///
/// Explicit newlines start a new line (a blank source line stays blank). Leading
/// indentation and runs of spaces between words are kept; only the whitespace at
/// a wrap point is consumed. Tabs expand to four spaces. A word wider than the
/// line is split across as many lines as it needs; no characters are dropped.
pub fn wrap_text(
    text: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width_mm: f32,
) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.lines() {
        let paragraph = raw.replace('\t', TAB);
        let mut current = String::new();
        let mut current_w = 0.0_f32;
        let mut produced = false;

        for (i, (gap, word)) in segments(paragraph.trim_end()).into_iter().enumerate() {
            // Indentation belongs to the first word; later gaps only separate.
            let (gap, word) = if i == 0 {
                ("", &paragraph[..gap.len() + word.len()])
            } else {
                (gap, word)
            };
            let word_w = metrics.measure_str(word, size_pt);

            if word_w > max_width_mm {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    produced = true;
                }
                let mut pieces = split_long_word(word, metrics, size_pt, max_width_mm);
                // The tail stays open so following words can share its line.
                let tail = pieces.pop().unwrap_or_default();
                produced |= !pieces.is_empty();
                lines.extend(pieces);
                current_w = metrics.measure_str(&tail, size_pt);
                current = tail;
                continue;
            }

            let gap_w = metrics.measure_str(gap, size_pt);
            if !current.is_empty() && current_w + gap_w + word_w > max_width_mm {
                lines.push(std::mem::take(&mut current));
                produced = true;
            }

            if current.is_empty() {
                current_w = word_w;
            } else {
                current.push_str(gap);
                current_w += gap_w + word_w;
            }
            current.push_str(word);
        }

        if !current.is_empty() || !produced {
            lines.push(current);
        }
    }

    lines
}

/// Splits a line into `(whitespace before, word)` pairs. The first pair carries
/// the line's indentation.
fn segments(line: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = line;
    while !rest.is_empty() {
        let word_start = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        let after = &rest[word_start..];
        let word_len = after.find(char::is_whitespace).unwrap_or(after.len());
        out.push((&rest[..word_start], &after[..word_len]));
        rest = &after[word_len..];
    }
    out
}

/// Splits a single word into pieces that each fit `max_width_mm`
/// (at least one character per piece).
fn split_long_word(
    word: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width_mm: f32,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_w = 0.0_f32;

    for c in word.chars() {
        let c_w = metrics.char_width_mm(c, size_pt);
        if !piece.is_empty() && piece_w + c_w > max_width_mm {
            pieces.push(std::mem::take(&mut piece));
            piece_w = 0.0;
        }
        piece.push(c);
        piece_w += c_w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
