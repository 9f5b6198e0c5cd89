//! Page plan: positioned drawing operations in millimetres.
//!
//! Coordinates are top-down (`y` grows toward the bottom of the page) and a
//! text `y` is its baseline. The printpdf backend flips them when drawing.

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 20.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Line spacing factor used for multi-line text blocks.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const WHITE: Self = Self(255, 255, 255);

    pub const fn grey(level: u8) -> Self {
        Self(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: RgbColor,
    /// Line width in millimetres.
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        color: RgbColor,
    },
    /// `y` is the top edge.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<RgbColor>,
        stroke: Option<Stroke>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Stroke,
    },
    /// Report image `index`, top-left corner at (`x`, `y`).
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text of every text operation on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Horizontal anchoring of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Cursor over a growing list of pages.
#[derive(Debug)]
pub struct Canvas {
    pages: Vec<Page>,
    /// Current vertical position on the last page.
    pub y: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
    }

    /// Start a new page when the cursor is past `limit`.
    pub fn break_if_below(&mut self, limit: f32) {
        if self.y > limit {
            self.new_page();
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        color: RgbColor,
        align: Align,
    ) {
        let x = match align {
            Align::Left => x,
            Align::Center => x - text_width(text, size, style) / 2.0,
        };
        self.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            size,
            style,
            color,
        });
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}

/// Vertical distance between lines of `size`-point text.
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_HEIGHT_FACTOR
}

// ═══════════════════════════════════════════════════════════════════════
// Text metrics (standard Helvetica AFM widths, 1/1000 em)
// ═══════════════════════════════════════════════════════════════════════

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015,                                             // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // 'N'..'Z'
    278, 278, 278, 469, 556, 333,                                                   // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // 'n'..'z'
    334, 260, 334, 584,                                                             // '{'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Fallback width for glyphs outside the table.
const DEFAULT_GLYPH_WIDTH: u16 = 556;

/// Accented Latin letters share the advance width of their base letter.
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        '\u{a0}' => ' ',
        other => other,
    }
}

fn glyph_width(c: char, style: FontStyle) -> u16 {
    let table = match style {
        FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
        FontStyle::Regular | FontStyle::Oblique => &HELVETICA_WIDTHS,
    };
    match fold_accent(c) {
        c @ ' '..='~' => table[c as usize - 32],
        '•' => 350,
        'º' | 'ª' => 370,
        '–' => 556,
        '—' => 1000,
        '°' => 400,
        _ => DEFAULT_GLYPH_WIDTH,
    }
}

/// Rendered width of `text` in millimetres.
pub fn text_width(text: &str, size: f32, style: FontStyle) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, style) as u32).sum();
    units as f32 / 1000.0 * size * PT_TO_MM
}

/// Greedy word wrap to `max_width` millimetres.
///
/// Explicit line breaks are kept, blank lines included. A word wider than
/// the line is split between characters.
pub fn wrap_text(text: &str, max_width: f32, size: f32, style: FontStyle) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, size, style) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            // The word alone may still be too wide.
            for c in word.chars() {
                current.push(c);
                if text_width(&current, size, style) > max_width && current.chars().count() > 1 {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_tables_cover_printable_ascii() {
        assert_eq!(glyph_width(' ', FontStyle::Regular), 278);
        assert_eq!(glyph_width('~', FontStyle::Regular), 584);
        assert_eq!(glyph_width('W', FontStyle::Bold), 944);
        assert_eq!(glyph_width('i', FontStyle::Bold), 278);
        assert_eq!(glyph_width('i', FontStyle::Oblique), 222);
    }

    #[test]
    fn accented_letters_use_base_width() {
        assert_eq!(glyph_width('ã', FontStyle::Regular), glyph_width('a', FontStyle::Regular));
        assert_eq!(glyph_width('Ç', FontStyle::Bold), glyph_width('C', FontStyle::Bold));
        assert_eq!(glyph_width('•', FontStyle::Regular), 350);
        assert_eq!(glyph_width('漢', FontStyle::Regular), DEFAULT_GLYPH_WIDTH);
    }

    #[test]
    fn text_width_scales_with_size() {
        // Ten digits at 10pt: 5560 units -> 5.56 em-tenths -> 19.6 mm
        let w = text_width("0123456789", 10.0, FontStyle::Regular);
        assert!((w - 5.56 * 10.0 * PT_TO_MM).abs() < 1e-3);
        assert!((text_width("0123456789", 20.0, FontStyle::Regular) - 2.0 * w).abs() < 1e-3);
    }

    #[test]
    fn wrap_respects_width() {
        let text = "Concretagem da laje do terceiro pavimento com bomba lança";
        let lines = wrap_text(text, 40.0, 10.0, FontStyle::Regular);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0, FontStyle::Regular) <= 40.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_keeps_explicit_breaks() {
        let lines = wrap_text("linha um\n\nlinha três", 170.0, 10.0, FontStyle::Regular);
        assert_eq!(lines, vec!["linha um", "", "linha três"]);
    }

    #[test]
    fn wrap_splits_overlong_word() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 30.0, 10.0, FontStyle::Regular);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn canvas_breaks_below_limit() {
        let mut canvas = Canvas::new();
        canvas.y = 250.0;
        canvas.break_if_below(250.0);
        assert_eq!(canvas.page_count(), 1);
        canvas.y = 250.1;
        canvas.break_if_below(250.0);
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.y, MARGIN);
    }

    #[test]
    fn centred_text_is_offset_by_half_width() {
        let mut canvas = Canvas::new();
        canvas.text("ABC", 105.0, 20.0, 10.0, FontStyle::Bold, RgbColor::BLACK, Align::Center);
        let pages = canvas.into_pages();
        match &pages[0].ops[0] {
            DrawOp::Text { x, .. } => {
                let w = text_width("ABC", 10.0, FontStyle::Bold);
                assert!((x - (105.0 - w / 2.0)).abs() < 1e-4);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }
}
