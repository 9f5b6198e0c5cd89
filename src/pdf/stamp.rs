//! Responsible-engineer watermark stamp and page footers, drawn on every
//! page once the content layout is final.

use serde::{Deserialize, Serialize};

use super::layout::{
    text_width, DrawOp, FontStyle, Page, RgbColor, Stroke, PAGE_HEIGHT, PAGE_WIDTH,
};

pub const STAMP_WIDTH: f32 = 140.0;
pub const STAMP_HEIGHT: f32 = 65.0;
pub const STAMP_X: f32 = PAGE_WIDTH - STAMP_WIDTH - 30.0;
pub const STAMP_Y: f32 = PAGE_HEIGHT - STAMP_HEIGHT - 15.0;

const OUTER_BORDER: Stroke = Stroke {
    color: RgbColor::grey(120),
    width: 1.2,
};
const INNER_BORDER: Stroke = Stroke {
    color: RgbColor::grey(140),
    width: 0.4,
};
const DIVIDER: Stroke = Stroke {
    color: RgbColor::grey(150),
    width: 0.3,
};
const INNER_INSET: f32 = 2.0;
const DIVIDER_INSET: f32 = 18.0;
const TEXT_COLOR: RgbColor = RgbColor::grey(100);
/// Baseline of the first stamp line, below the stamp's top edge.
const TEXT_TOP: f32 = 10.0;

pub const FOOTER_Y: f32 = PAGE_HEIGHT - 10.0;
const FOOTER_SIZE: f32 = 8.0;

/// One centred line of stamp text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampLine {
    pub text: String,
    pub size: f32,
    #[serde(default)]
    pub bold: bool,
    /// Distance below the first baseline, in millimetres.
    pub offset: f32,
}

impl StampLine {
    fn new(text: &str, size: f32, bold: bool, offset: f32) -> Self {
        Self {
            text: text.to_string(),
            size,
            bold,
            offset,
        }
    }
}

/// Stamp content. The box and rules are fixed; the text lines are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub lines: Vec<StampLine>,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lines: vec![
                StampLine::new("Paulo Sérgio A. Fonseca", 10.0, true, 0.0),
                StampLine::new("Eng: Civil / Eng: Segurança", 7.5, false, 8.0),
                StampLine::new("do Trabalho", 7.5, false, 12.0),
                StampLine::new("CREA NACIONAL", 7.5, false, 20.0),
                StampLine::new("110134303 - 6", 7.5, false, 24.0),
                StampLine::new("Registro: MA / PA / TO", 6.5, false, 32.0),
                StampLine::new("(99) 98111 1920 - TIM", 6.5, false, 38.0),
            ],
        }
    }
}

impl StampConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            lines: Vec::new(),
        }
    }
}

fn centred_text(text: &str, center_x: f32, y: f32, size: f32, style: FontStyle, color: RgbColor) -> DrawOp {
    DrawOp::Text {
        text: text.to_string(),
        x: center_x - text_width(text, size, style) / 2.0,
        y,
        size,
        style,
        color,
    }
}

fn stamp_ops(stamp: &StampConfig) -> Vec<DrawOp> {
    let (x, y, w, h) = (STAMP_X, STAMP_Y, STAMP_WIDTH, STAMP_HEIGHT);
    let mut ops = vec![
        DrawOp::Rect {
            x,
            y,
            width: w,
            height: h,
            fill: None,
            stroke: Some(OUTER_BORDER),
        },
        DrawOp::Rect {
            x: x + INNER_INSET,
            y: y + INNER_INSET,
            width: w - 2.0 * INNER_INSET,
            height: h - 2.0 * INNER_INSET,
            fill: None,
            stroke: Some(INNER_BORDER),
        },
    ];
    for rule_y in [y + DIVIDER_INSET, y + h - DIVIDER_INSET] {
        ops.push(DrawOp::Line {
            x1: x + 4.0,
            y1: rule_y,
            x2: x + w - 4.0,
            y2: rule_y,
            stroke: DIVIDER,
        });
    }

    let center = x + w / 2.0;
    let top = y + TEXT_TOP;
    for line in &stamp.lines {
        let style = if line.bold {
            FontStyle::Bold
        } else {
            FontStyle::Regular
        };
        ops.push(centred_text(
            &line.text,
            center,
            top + line.offset,
            line.size,
            style,
            TEXT_COLOR,
        ));
    }
    ops
}

/// Overlay the stamp on every page.
pub fn apply_stamp(pages: &mut [Page], stamp: &StampConfig) {
    if !stamp.enabled {
        return;
    }
    let ops = stamp_ops(stamp);
    for page in pages {
        page.ops.extend(ops.iter().cloned());
    }
}

/// `Página i de N` centred at the bottom of every page.
pub fn apply_footers(pages: &mut [Page]) {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        let label = format!("Página {} de {}", i + 1, total);
        page.ops.push(centred_text(
            &label,
            PAGE_WIDTH / 2.0,
            FOOTER_Y,
            FOOTER_SIZE,
            FontStyle::Oblique,
            RgbColor::BLACK,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_box_geometry() {
        assert_eq!(STAMP_X, 40.0);
        assert_eq!(STAMP_Y, 217.0);
        let ops = stamp_ops(&StampConfig::default());
        assert!(matches!(
            ops[0],
            DrawOp::Rect { x, y, width, height, fill: None, stroke: Some(s) }
                if x == 40.0 && y == 217.0 && width == 140.0 && height == 65.0 && s.width == 1.2
        ));
        assert!(matches!(
            ops[1],
            DrawOp::Rect { x, y, width, height, .. }
                if x == 42.0 && y == 219.0 && width == 136.0 && height == 61.0
        ));
        assert!(matches!(ops[2], DrawOp::Line { y1, x1, x2, .. } if y1 == 235.0 && x1 == 44.0 && x2 == 176.0));
        assert!(matches!(ops[3], DrawOp::Line { y1, .. } if y1 == 264.0));
    }

    #[test]
    fn stamp_text_is_centred_in_box() {
        let ops = stamp_ops(&StampConfig::default());
        let (name_x, name_y, style) = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, x, y, style, .. } if text == "Paulo Sérgio A. Fonseca" => {
                    Some((*x, *y, *style))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(style, FontStyle::Bold);
        assert_eq!(name_y, 227.0);
        let w = text_width("Paulo Sérgio A. Fonseca", 10.0, FontStyle::Bold);
        assert!((name_x + w / 2.0 - 110.0).abs() < 1e-3);

        let phone_y = ops.iter().find_map(|op| match op {
            DrawOp::Text { text, y, size, .. } if text.contains("TIM") => Some((*y, *size)),
            _ => None,
        });
        assert_eq!(phone_y, Some((265.0, 6.5)));
    }

    #[test]
    fn stamp_on_every_page() {
        let mut pages = vec![Page::default(), Page::default(), Page::default()];
        apply_stamp(&mut pages, &StampConfig::default());
        for page in &pages {
            assert!(page.texts().any(|t| t == "CREA NACIONAL"));
        }
    }

    #[test]
    fn disabled_stamp_draws_nothing() {
        let mut pages = vec![Page::default()];
        apply_stamp(&mut pages, &StampConfig::disabled());
        assert!(pages[0].ops.is_empty());
    }

    #[test]
    fn footers_number_pages() {
        let mut pages = vec![Page::default(), Page::default()];
        apply_footers(&mut pages);
        assert_eq!(pages[0].texts().collect::<Vec<_>>(), vec!["Página 1 de 2"]);
        assert_eq!(pages[1].texts().collect::<Vec<_>>(), vec!["Página 2 de 2"]);
        assert!(matches!(
            pages[1].ops[0],
            DrawOp::Text { y, size, style: FontStyle::Oblique, .. } if y == 287.0 && size == 8.0
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: StampConfig = serde_json::from_str(
            r#"{"lines":[{"text":"Maria Souza","size":10,"offset":0}]}"#,
        )
        .unwrap();
        assert!(cfg.enabled);
        assert!(!cfg.lines[0].bold);
    }
}
