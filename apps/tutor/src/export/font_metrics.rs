//! Static font-metric tables for the two PDF base-14 fonts used by the exporter.
//!
//! Widths are the Adobe AFM advance widths in 1/1000 em for ASCII 0x20..=0x7E
//! (95 printable characters, index = `(char as usize) - 32`). Anything outside
//! that range is measured with the font's fallback width; the only such glyphs
//! the exporter emits are Latin-1 / WinAnsi punctuation and `?`, all close to it.

use serde::{Deserialize, Serialize};

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Font style
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontStyle {
    /// Helvetica: title and turn bodies.
    Regular,
    /// Helvetica-Bold: turn headers.
    Bold,
}

impl FontStyle {
    /// PostScript name of the base-14 font.
    pub fn base_font(self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
        }
    }

    /// Name of the font in each page's resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Layout parameters for the exported transcript. All lengths in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// Applied on all four sides; the bottom margin doubles as the page-break trigger.
    pub margin_mm: f32,
    pub title_size_pt: f32,
    pub title_line_mm: f32,
    pub title_gap_mm: f32,
    pub header_size_pt: f32,
    pub header_line_mm: f32,
    pub body_size_pt: f32,
    pub body_line_mm: f32,
    /// Vertical space after each turn's body.
    pub turn_gap_mm: f32,
}

impl PageConfig {
    /// Usable line width between the left and right margins.
    pub fn text_width_mm(&self) -> f32 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    /// Lowest y (from the top edge) a line may reach before a page break.
    pub fn bottom_limit_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm
    }
}

/// A4 portrait, 15 mm margins, Helvetica 12/12/11.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width_mm: 210.0,
        page_height_mm: 297.0,
        margin_mm: 15.0,
        title_size_pt: 12.0,
        title_line_mm: 10.0,
        title_gap_mm: 5.0,
        header_size_pt: 12.0,
        header_line_mm: 8.0,
        body_size_pt: 11.0,
        body_line_mm: 7.0,
        turn_gap_mm: 3.0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub style: FontStyle,
    widths: [u16; 95],
    /// Width used for characters outside printable ASCII.
    pub fallback_width: u16,
}

impl FontMetricTable {
    /// Advance width of one character in millimetres at `size_pt`.
    pub fn char_width_mm(&self, c: char, size_pt: f32) -> f32 {
        let code = c as usize;
        let units = if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.fallback_width
        };
        f32::from(units) / 1000.0 * size_pt * MM_PER_PT
    }

    /// Rendered width of a string in millimetres at `size_pt`.
    pub fn measure_str(&self, s: &str, size_pt: f32) -> f32 {
        s.chars().map(|c| self.char_width_mm(c, size_pt)).sum()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    style: FontStyle::Regular,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    fallback_width: 556,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    style: FontStyle::Bold,
    #[rustfmt::skip]
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0    1    2    3    4    5    6    7    8    9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A    B    C    D    E    F    G    H    I    J    K    L    M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N    O    P    Q    R    S    T    U    V    W    X    Y    Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a    b    c    d    e    f    g    h    i    j    k    l    m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n    o    p    q    r    s    t    u    v    w    x    y    z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    fallback_width: 611,
};

/// Returns the static metric table for a font style.
pub fn get_metrics(style: FontStyle) -> &'static FontMetricTable {
    match style {
        FontStyle::Regular => &HELVETICA_TABLE,
        FontStyle::Bold => &HELVETICA_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        assert_eq!(get_metrics(FontStyle::Regular).measure_str("", 11.0), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        // "Rust" = R(722) + u(556) + s(500) + t(278) = 2056 units
        let width = get_metrics(FontStyle::Regular).measure_str("Rust", 12.0);
        let expected = 2.056 * 12.0 * MM_PER_PT;
        assert!(
            (width - expected).abs() < 1e-3,
            "Rust width should be ~{expected}mm, got {width}"
        );
    }

    #[test]
    fn test_non_ascii_uses_fallback_width() {
        let metrics = get_metrics(FontStyle::Regular);
        let width = metrics.char_width_mm('é', 10.0);
        let expected = 0.556 * 10.0 * MM_PER_PT;
        assert!((width - expected).abs() < 1e-4);
    }

    #[test]
    fn test_width_scales_with_font_size() {
        let metrics = get_metrics(FontStyle::Regular);
        let small = metrics.measure_str("Chat History", 6.0);
        let large = metrics.measure_str("Chat History", 12.0);
        assert!((large - 2.0 * small).abs() < 1e-3);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "[2024-01-01 10:00:00] User:";
        let regular = get_metrics(FontStyle::Regular).measure_str(text, 12.0);
        let bold = get_metrics(FontStyle::Bold).measure_str(text, 12.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_default_page_config_sanity() {
        let config = default_page_config();
        assert!(config.margin_mm >= 15.0);
        assert!((config.text_width_mm() - 180.0).abs() < 1e-4);
        assert!((config.bottom_limit_mm() - 282.0).abs() < 1e-4);
    }

    #[test]
    fn test_font_names() {
        assert_eq!(FontStyle::Regular.base_font(), "Helvetica");
        assert_eq!(FontStyle::Bold.base_font(), "Helvetica-Bold");
        assert_ne!(
            FontStyle::Regular.resource_name(),
            FontStyle::Bold.resource_name()
        );
    }
}
