//! printpdf backend: turns the page plan into PDF bytes.

use std::io::BufWriter;

use ::image::imageops::FilterType;
use ::image::{DynamicImage, GenericImageView, Rgb as PixelRgb, RgbImage};
use printpdf::path::PaintMode;
use printpdf::*;
use tracing::debug;

use super::layout::{DrawOp, FontStyle, Page, RgbColor, Stroke, PAGE_HEIGHT, PAGE_WIDTH, PT_TO_MM};
use super::PdfError;

/// Resolution images are embedded at.
const EMBED_DPI: f32 = 300.0;
/// Photos larger than this (in pixels per millimetre drawn) are downscaled
/// before embedding.
const MAX_PX_PER_MM: f32 = 200.0 / 25.4;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, PdfError> {
        let font = |f: BuiltinFont| {
            doc.add_builtin_font(f)
                .map_err(|e| PdfError::Font(e.to_string()))
        };
        Ok(Self {
            regular: font(BuiltinFont::Helvetica)?,
            bold: font(BuiltinFont::HelveticaBold)?,
            oblique: font(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Oblique => &self.oblique,
        }
    }
}

fn color(c: RgbColor) -> Color {
    Color::Rgb(Rgb::new(
        c.0 as f32 / 255.0,
        c.1 as f32 / 255.0,
        c.2 as f32 / 255.0,
        None,
    ))
}

/// Layout y (top-down) to PDF y (bottom-up).
fn flip(y: f32) -> Mm {
    Mm(PAGE_HEIGHT - y)
}

fn set_stroke(layer: &PdfLayerReference, stroke: Stroke) {
    layer.set_outline_color(color(stroke.color));
    layer.set_outline_thickness(stroke.width / PT_TO_MM);
}

/// Opaque RGB copy of `img`, transparent areas over white.
fn flatten_rgb(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, PixelRgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(out)
}

/// Image prepared for a `width` × `height` mm box.
fn prepare_image(img: &DynamicImage, width: f32, height: f32) -> DynamicImage {
    let max_w = (width * MAX_PX_PER_MM).ceil().max(1.0) as u32;
    let max_h = (height * MAX_PX_PER_MM).ceil().max(1.0) as u32;
    let (w, h) = img.dimensions();
    if w > max_w || h > max_h {
        debug!(from_w = w, from_h = h, max_w, max_h, "Downscaling image for embedding");
        flatten_rgb(&img.resize(max_w, max_h, FilterType::Triangle))
    } else {
        flatten_rgb(img)
    }
}

fn draw_op(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    images: &[Option<DynamicImage>],
    op: &DrawOp,
) -> Result<(), PdfError> {
    match op {
        DrawOp::Text {
            text,
            x,
            y,
            size,
            style,
            color: c,
        } => {
            layer.set_fill_color(color(*c));
            layer.use_text(text.as_str(), *size, Mm(*x), flip(*y), fonts.get(*style));
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let mode = match (fill, stroke) {
                (Some(_), Some(_)) => PaintMode::FillStroke,
                (Some(_), None) => PaintMode::Fill,
                (None, Some(_)) => PaintMode::Stroke,
                (None, None) => return Ok(()),
            };
            if let Some(f) = fill {
                layer.set_fill_color(color(*f));
            }
            if let Some(s) = stroke {
                set_stroke(layer, *s);
            }
            let rect = Rect::new(Mm(*x), flip(y + height), Mm(x + width), flip(*y)).with_mode(mode);
            layer.add_rect(rect);
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        } => {
            set_stroke(layer, *stroke);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), flip(*y1)), false),
                    (Point::new(Mm(*x2), flip(*y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::Image {
            index,
            x,
            y,
            width,
            height,
        } => {
            let source = images
                .get(*index)
                .and_then(Option::as_ref)
                .ok_or_else(|| PdfError::Image(format!("no decoded image at index {index}")))?;
            let prepared = prepare_image(source, *width, *height);
            let (px_w, px_h) = prepared.dimensions();
            let natural_w = px_w as f32 / EMBED_DPI * 25.4;
            let natural_h = px_h as f32 / EMBED_DPI * 25.4;
            Image::from_dynamic_image(&prepared).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(flip(y + height)),
                    scale_x: Some(width / natural_w),
                    scale_y: Some(height / natural_h),
                    dpi: Some(EMBED_DPI),
                    ..Default::default()
                },
            );
        }
    }
    Ok(())
}

/// Write `pages` into a new A4 document.
pub fn render_pages(
    title: &str,
    pages: &[Page],
    images: &[Option<DynamicImage>],
) -> Result<Vec<u8>, PdfError> {
    let (doc, page1, layer1) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts::load(&doc)?;

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        for op in &page.ops {
            draw_op(&layer, &fonts, images, op)?;
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| PdfError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| PdfError::Save(format!("buffer error: {e}")))
}
