//! Report sections laid out top to bottom on the canvas.

use tracing::debug;

use super::layout::{
    line_height, text_width, wrap_text, Align, Canvas, DrawOp, FontStyle, RgbColor,
    CONTENT_WIDTH, MARGIN, PAGE_HEIGHT, PAGE_WIDTH,
};
use super::table::{Column, Header, Table};
use crate::models::DailyReport;

pub const TITLE: &str = "RELATÓRIO DE DIÁRIO DE OBRA";
pub const ACTIVITIES_HEADING: &str = "ATIVIDADES EXERCIDAS DA EMPRESA CONTRATADA";
pub const SERVICES_HEADING: &str = "SERVIÇOS EXECUTADOS";
pub const DESCRIPTION_HEADING: &str = "DESCRIÇÃO";

const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_GAP: f32 = 12.0;

const INFO_FILL: RgbColor = RgbColor(41, 128, 185);
const EQUIPMENT_FILL: RgbColor = RgbColor(52, 152, 219);
const STAFF_FILL: RgbColor = RgbColor(46, 125, 50);
const LABEL_FILL: RgbColor = RgbColor::grey(245);

// List and description page-break thresholds
const LIST_START_LIMIT: f32 = 250.0;
const DESCRIPTION_START_LIMIT: f32 = 240.0;
const LINE_LIMIT: f32 = 270.0;
const LIST_INDENT: f32 = 5.0;
const LIST_ITEM_SPACING: f32 = 8.0;
const LIST_WRAP_SPACING: f32 = 5.0;
const DESCRIPTION_LINE_HEIGHT: f32 = 7.0;

// Image grid
const IMAGES_START_LIMIT: f32 = 200.0;
const IMAGE_GAP: f32 = 8.0;
pub const IMAGE_COLUMN_WIDTH: f32 = (CONTENT_WIDTH - IMAGE_GAP) / 2.0;
pub const IMAGE_MAX_HEIGHT: f32 = 80.0;
const IMAGE_ROW_LIMIT: f32 = PAGE_HEIGHT - 100.0;
const IMAGE_AFTER_ROW_LIMIT: f32 = PAGE_HEIGHT - 50.0;
const CAPTION_LIMIT: f32 = PAGE_HEIGHT - 15.0;
const CAPTION_GAP: f32 = 3.0;
const CAPTION_HEIGHT: f32 = 5.0;
const CAPTION_SIZE: f32 = 7.0;
const FAILED_IMAGE_ROW_HEIGHT: f32 = 20.0;
/// Pixel dimensions are read at screen resolution.
const IMAGE_DPI: f32 = 96.0;

/// What the grid needs to know about one attached image.
#[derive(Debug, Clone)]
pub struct ImageSlot {
    pub name: String,
    /// Pixel size of the decoded image; `None` when it could not be decoded.
    pub pixels: Option<(u32, u32)>,
}

/// Lay out every content section. Stamp and footers are added afterwards.
pub fn layout_report(report: &DailyReport, images: &[ImageSlot]) -> Canvas {
    let mut canvas = Canvas::new();

    draw_title(&mut canvas);
    draw_info_table(&mut canvas, report);
    if !report.equipment.is_empty() {
        draw_equipment_table(&mut canvas, report);
    }
    if !report.staff.is_empty() {
        draw_staff_table(&mut canvas, report);
    }

    let activities: Vec<&str> = report.activities.iter().map(|a| a.description.as_str()).collect();
    draw_list(&mut canvas, ACTIVITIES_HEADING, &activities);
    let services: Vec<&str> = report.services.iter().map(|s| s.description.as_str()).collect();
    draw_list(&mut canvas, SERVICES_HEADING, &services);

    draw_description(&mut canvas, &report.description);
    draw_image_grid(&mut canvas, images);

    debug!(pages = canvas.page_count(), "Report layout complete");
    canvas
}

fn heading(canvas: &mut Canvas, text: &str) {
    canvas.text(
        text,
        MARGIN,
        canvas.y,
        HEADING_SIZE,
        FontStyle::Bold,
        RgbColor::BLACK,
        Align::Left,
    );
    canvas.y += 10.0;
}

fn draw_title(canvas: &mut Canvas) {
    canvas.text(
        TITLE,
        PAGE_WIDTH / 2.0,
        canvas.y,
        20.0,
        FontStyle::Bold,
        RgbColor::BLACK,
        Align::Center,
    );
    canvas.y += 15.0;
}

fn draw_info_table(canvas: &mut Canvas, report: &DailyReport) {
    let mut rows = vec![
        vec!["Nome da Obra:".to_string(), report.site_name.clone()],
        vec!["Empresa Contratada:".to_string(), report.contractor.clone()],
        vec!["Localização da Obra:".to_string(), report.location.clone()],
        vec!["Data:".to_string(), report.formatted_date()],
        vec!["Número da Folha (RDO):".to_string(), report.sheet_number.clone()],
        vec!["Condições do Tempo:".to_string(), report.weather.label().to_string()],
    ];
    if let Some(period) = report.printable_rain_period() {
        rows.push(vec!["Período da Chuva:".to_string(), period.to_string()]);
    }

    let table = Table {
        header: Header::Merged("INFORMAÇÕES GERAIS".into()),
        header_fill: INFO_FILL,
        columns: vec![Column::new(70.0).label(LABEL_FILL), Column::new(100.0)],
        font_size: BODY_SIZE,
        padding: 4.0,
        rows,
    };
    table.draw(canvas);
    canvas.y += TABLE_GAP;
}

fn draw_equipment_table(canvas: &mut Canvas, report: &DailyReport) {
    let with_notes = report.equipment.iter().any(|e| e.has_note());
    let table = if with_notes {
        Table {
            header: Header::Columns(vec![
                "Equipamento Utilizado".into(),
                "Quantidade".into(),
                "Observação".into(),
            ]),
            header_fill: EQUIPMENT_FILL,
            columns: vec![
                Column::new(70.0),
                Column::new(30.0).centered(),
                Column::new(70.0),
            ],
            font_size: 9.0,
            padding: 3.0,
            rows: report
                .equipment
                .iter()
                .map(|e| {
                    vec![
                        e.name.clone(),
                        e.quantity.to_string(),
                        e.note.as_deref().map(str::trim).unwrap_or("").to_string(),
                    ]
                })
                .collect(),
        }
    } else {
        Table {
            header: Header::Columns(vec!["Equipamento Utilizado".into(), "Quantidade".into()]),
            header_fill: EQUIPMENT_FILL,
            columns: vec![Column::new(120.0), Column::new(50.0).centered()],
            font_size: BODY_SIZE,
            padding: 3.0,
            rows: report
                .equipment
                .iter()
                .map(|e| vec![e.name.clone(), e.quantity.to_string()])
                .collect(),
        }
    };
    table.draw(canvas);
    canvas.y += TABLE_GAP;
}

fn draw_staff_table(canvas: &mut Canvas, report: &DailyReport) {
    let table = Table {
        header: Header::Columns(vec!["Colaboradores".into(), "Quantidade".into()]),
        header_fill: STAFF_FILL,
        columns: vec![Column::new(120.0), Column::new(50.0).centered()],
        font_size: BODY_SIZE,
        padding: 3.0,
        rows: report
            .staff
            .iter()
            .map(|s| vec![s.role.clone(), s.quantity.to_string()])
            .collect(),
    };
    table.draw(canvas);
    canvas.y += TABLE_GAP;
}

/// Bulleted list. Wrapped items continue under the text, not the bullet.
fn draw_list(canvas: &mut Canvas, title: &str, items: &[&str]) {
    let items: Vec<&str> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }

    canvas.break_if_below(LIST_START_LIMIT);
    heading(canvas, title);

    let bullet = "• ";
    let bullet_width = text_width(bullet, BODY_SIZE, FontStyle::Regular);
    let x = MARGIN + LIST_INDENT;
    let text_room = CONTENT_WIDTH - LIST_INDENT - bullet_width;

    for item in items {
        canvas.break_if_below(LINE_LIMIT);
        let lines = wrap_text(item, text_room, BODY_SIZE, FontStyle::Regular);
        for (n, line) in lines.iter().enumerate() {
            if n == 0 {
                let first = format!("{bullet}{line}");
                canvas.text(&first, x, canvas.y, BODY_SIZE, FontStyle::Regular, RgbColor::BLACK, Align::Left);
                continue;
            }
            canvas.y += LIST_WRAP_SPACING;
            canvas.break_if_below(LINE_LIMIT);
            canvas.text(
                line,
                x + bullet_width,
                canvas.y,
                BODY_SIZE,
                FontStyle::Regular,
                RgbColor::BLACK,
                Align::Left,
            );
        }
        canvas.y += LIST_ITEM_SPACING;
    }
    canvas.y += LIST_ITEM_SPACING;
}

fn draw_description(canvas: &mut Canvas, description: &str) {
    let description = description.trim();
    if description.is_empty() {
        return;
    }

    canvas.break_if_below(DESCRIPTION_START_LIMIT);
    heading(canvas, DESCRIPTION_HEADING);

    for line in wrap_text(description, CONTENT_WIDTH, BODY_SIZE, FontStyle::Regular) {
        canvas.break_if_below(LINE_LIMIT);
        if !line.is_empty() {
            canvas.text(&line, MARGIN, canvas.y, BODY_SIZE, FontStyle::Regular, RgbColor::BLACK, Align::Left);
        }
        canvas.y += DESCRIPTION_LINE_HEIGHT;
    }
    canvas.y += 5.0;
}

/// Size an image into its grid cell: aspect ratio kept, never enlarged.
pub fn fit_image(pixels: (u32, u32)) -> (f32, f32) {
    let px_to_mm = 25.4 / IMAGE_DPI;
    let width = pixels.0.max(1) as f32 * px_to_mm;
    let height = pixels.1.max(1) as f32 * px_to_mm;
    let ratio = (IMAGE_COLUMN_WIDTH / width)
        .min(IMAGE_MAX_HEIGHT / height)
        .min(1.0);
    (width * ratio, height * ratio)
}

/// Draw one grid cell and return the height it takes in the row.
fn draw_image_cell(canvas: &mut Canvas, index: usize, slot: &ImageSlot, x: f32, y: f32) -> f32 {
    let number = index + 1;
    let Some(pixels) = slot.pixels else {
        canvas.text(
            &format!("Erro ao processar imagem {number}"),
            x,
            y,
            BODY_SIZE,
            FontStyle::Regular,
            RgbColor::BLACK,
            Align::Left,
        );
        return FAILED_IMAGE_ROW_HEIGHT;
    };

    let (width, height) = fit_image(pixels);
    canvas.push(DrawOp::Image {
        index,
        x,
        y,
        width,
        height,
    });

    let caption_y = y + height + CAPTION_GAP;
    let mut caption_height = 0.0;
    if caption_y < CAPTION_LIMIT {
        let caption = format!("Img {number}: {}", slot.name);
        let lines = wrap_text(&caption, IMAGE_COLUMN_WIDTH, CAPTION_SIZE, FontStyle::Oblique);
        for (n, line) in lines.iter().enumerate() {
            canvas.text(
                line,
                x,
                caption_y + n as f32 * line_height(CAPTION_SIZE),
                CAPTION_SIZE,
                FontStyle::Oblique,
                RgbColor::BLACK,
                Align::Left,
            );
        }
        caption_height = CAPTION_HEIGHT;
    }
    height + caption_height + CAPTION_GAP
}

fn draw_image_grid(canvas: &mut Canvas, images: &[ImageSlot]) {
    if images.is_empty() {
        return;
    }

    canvas.break_if_below(IMAGES_START_LIMIT);
    let title = if images.len() == 1 {
        "IMAGEM DO DIÁRIO DE OBRA".to_string()
    } else {
        format!("IMAGENS DO DIÁRIO DE OBRA ({})", images.len())
    };
    heading(canvas, &title);

    for (row, pair) in images.chunks(2).enumerate() {
        canvas.break_if_below(IMAGE_ROW_LIMIT);
        let top = canvas.y;
        let mut row_height: f32 = 0.0;
        for (col, slot) in pair.iter().enumerate() {
            let x = MARGIN + col as f32 * (IMAGE_COLUMN_WIDTH + IMAGE_GAP);
            let height = draw_image_cell(canvas, row * 2 + col, slot, x, top);
            row_height = row_height.max(height);
        }
        canvas.y = top + row_height + IMAGE_GAP;
        canvas.break_if_below(IMAGE_AFTER_ROW_LIMIT);
    }
    canvas.y += 5.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Equipment, Service, StaffEntry, WeatherCondition};
    use crate::pdf::layout::Page;
    use chrono::NaiveDate;

    fn report() -> DailyReport {
        DailyReport {
            site_name: "Edifício Residencial XYZ".into(),
            contractor: "Construtora ABC".into(),
            location: "Rua das Flores, 123".into(),
            date: NaiveDate::from_ymd_opt(2024, 12, 5).unwrap(),
            sheet_number: "001".into(),
            weather: WeatherCondition::Bom,
            rain_period: None,
            equipment: vec![],
            staff: vec![],
            activities: vec![],
            services: vec![],
            description: String::new(),
            images: vec![],
        }
    }

    fn all_texts(pages: &[Page]) -> Vec<String> {
        pages
            .iter()
            .flat_map(|p| p.texts().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    fn text_y(page: &Page, needle: &str) -> Option<f32> {
        page.ops.iter().find_map(|op| match op {
            DrawOp::Text { text, y, .. } if text == needle => Some(*y),
            _ => None,
        })
    }

    fn slot(name: &str, w: u32, h: u32) -> ImageSlot {
        ImageSlot {
            name: name.into(),
            pixels: Some((w, h)),
        }
    }

    #[test]
    fn minimal_report_is_one_page_with_info_rows() {
        let pages = layout_report(&report(), &[]).into_pages();
        assert_eq!(pages.len(), 1);
        let texts = all_texts(&pages);
        assert!(texts.contains(&TITLE.to_string()));
        assert!(texts.contains(&"INFORMAÇÕES GERAIS".to_string()));
        assert!(texts.contains(&"05/12/2024".to_string()));
        assert!(texts.contains(&"Bom".to_string()));
        assert!(!texts.iter().any(|t| t == "Período da Chuva:"));
        assert!(!texts.iter().any(|t| t == "Equipamento Utilizado"));
        assert!(!texts.iter().any(|t| t == DESCRIPTION_HEADING));
    }

    #[test]
    fn rain_period_row_only_when_rainy() {
        let mut r = report();
        r.weather = WeatherCondition::Chuvoso;
        r.rain_period = Some("13h às 15h".into());
        let texts = all_texts(&layout_report(&r, &[]).into_pages());
        assert!(texts.contains(&"Período da Chuva:".to_string()));
        assert!(texts.contains(&"Chuvoso".to_string()));

        r.weather = WeatherCondition::Nublado;
        let texts = all_texts(&layout_report(&r, &[]).into_pages());
        assert!(!texts.contains(&"Período da Chuva:".to_string()));
    }

    #[test]
    fn equipment_note_column_only_with_notes() {
        let mut r = report();
        r.equipment = vec![Equipment {
            name: "Betoneira".into(),
            quantity: 2,
            note: None,
        }];
        let texts = all_texts(&layout_report(&r, &[]).into_pages());
        assert!(texts.contains(&"Equipamento Utilizado".to_string()));
        assert!(!texts.contains(&"Observação".to_string()));

        r.equipment[0].note = Some("Manutenção às 14h".into());
        let texts = all_texts(&layout_report(&r, &[]).into_pages());
        assert!(texts.contains(&"Observação".to_string()));
        assert!(texts.contains(&"Manutenção às 14h".to_string()));
    }

    #[test]
    fn staff_table_lists_roles() {
        let mut r = report();
        r.staff = vec![StaffEntry {
            role: "Pedreiro".into(),
            quantity: 4,
        }];
        let texts = all_texts(&layout_report(&r, &[]).into_pages());
        assert!(texts.contains(&"Colaboradores".to_string()));
        assert!(texts.contains(&"Pedreiro".to_string()));
        assert!(texts.contains(&"4".to_string()));
    }

    #[test]
    fn list_items_are_bulleted_and_spaced() {
        let mut r = report();
        r.activities = vec![
            Activity { description: "Concretagem".into() },
            Activity { description: "   ".into() },
            Activity { description: "Armação".into() },
        ];
        r.services = vec![Service { description: "Reboco".into() }];
        let pages = layout_report(&r, &[]).into_pages();
        let page = &pages[0];
        let first = text_y(page, "• Concretagem").unwrap();
        let second = text_y(page, "• Armação").unwrap();
        assert!((second - first - LIST_ITEM_SPACING).abs() < 1e-3);
        let heading_y = text_y(page, ACTIVITIES_HEADING).unwrap();
        assert!((first - heading_y - 10.0).abs() < 1e-3);
        assert!(text_y(page, "• Reboco").is_some());
        assert_eq!(all_texts(&pages).iter().filter(|t| t.starts_with('•')).count(), 3);
    }

    #[test]
    fn wrapped_list_item_uses_hanging_indent() {
        let mut canvas = Canvas::new();
        let long = "Execução de alvenaria de vedação no segundo pavimento com blocos cerâmicos e amarração nos pilares";
        draw_list(&mut canvas, SERVICES_HEADING, &[long]);
        let pages = canvas.into_pages();
        let xs: Vec<f32> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, size, style: FontStyle::Regular, .. } if *size == BODY_SIZE => Some(*x),
                _ => None,
            })
            .collect();
        assert!(xs.len() >= 2);
        let bullet = text_width("• ", BODY_SIZE, FontStyle::Regular);
        assert_eq!(xs[0], MARGIN + LIST_INDENT);
        assert!((xs[1] - (MARGIN + LIST_INDENT + bullet)).abs() < 1e-4);
    }

    #[test]
    fn list_starts_new_page_past_threshold() {
        let mut canvas = Canvas::new();
        canvas.y = 251.0;
        draw_list(&mut canvas, ACTIVITIES_HEADING, &["Limpeza"]);
        assert_eq!(canvas.page_count(), 2);
        let pages = canvas.into_pages();
        assert_eq!(text_y(&pages[1], ACTIVITIES_HEADING), Some(MARGIN));
    }

    #[test]
    fn long_list_breaks_at_line_limit() {
        let mut canvas = Canvas::new();
        let items: Vec<String> = (0..40).map(|i| format!("Item {i}")).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        draw_list(&mut canvas, ACTIVITIES_HEADING, &refs);
        let pages = canvas.into_pages();
        assert_eq!(pages.len(), 2);
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y <= LINE_LIMIT + LIST_ITEM_SPACING);
                }
            }
        }
        assert!(text_y(&pages[1], "• Item 39").is_some());
    }

    #[test]
    fn description_keeps_line_breaks() {
        let mut canvas = Canvas::new();
        draw_description(&mut canvas, "Primeira linha\nSegunda linha");
        let pages = canvas.into_pages();
        let a = text_y(&pages[0], "Primeira linha").unwrap();
        let b = text_y(&pages[0], "Segunda linha").unwrap();
        assert!((b - a - DESCRIPTION_LINE_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn blank_description_is_skipped() {
        let mut canvas = Canvas::new();
        draw_description(&mut canvas, "  \n ");
        assert!(canvas.into_pages()[0].ops.is_empty());
    }

    #[test]
    fn fit_image_never_upscales_and_keeps_ratio() {
        // 96 px at 96 DPI is one inch.
        let (w, h) = fit_image((96, 48));
        assert!((w - 25.4).abs() < 1e-3);
        assert!((h - 12.7).abs() < 1e-3);

        let (w, h) = fit_image((4000, 3000));
        assert!((w - IMAGE_COLUMN_WIDTH).abs() < 1e-3);
        assert!((w / h - 4.0 / 3.0).abs() < 1e-3);

        let (w, h) = fit_image((1000, 4000));
        assert!((h - IMAGE_MAX_HEIGHT).abs() < 1e-3);
        assert!((h / w - 4.0).abs() < 1e-3);
    }

    #[test]
    fn image_grid_places_pairs_in_two_columns() {
        let mut canvas = Canvas::new();
        canvas.y = 40.0;
        let slots = vec![slot("a.png", 800, 600), slot("b.png", 800, 600), slot("c.png", 400, 400)];
        draw_image_grid(&mut canvas, &slots);
        let pages = canvas.into_pages();
        let images: Vec<(usize, f32, f32)> = pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Image { index, x, y, .. } => Some((*index, *x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].1, MARGIN);
        assert_eq!(images[1].1, MARGIN + IMAGE_COLUMN_WIDTH + IMAGE_GAP);
        assert_eq!(images[0].2, images[1].2);
        assert_eq!(images[2].1, MARGIN);
        assert!(images[2].2 > images[0].2);

        let texts = all_texts(&pages);
        assert!(texts.contains(&"IMAGENS DO DIÁRIO DE OBRA (3)".to_string()));
        assert!(texts.contains(&"Img 2: b.png".to_string()));
    }

    #[test]
    fn single_image_heading() {
        let mut canvas = Canvas::new();
        draw_image_grid(&mut canvas, &[slot("foto.jpg", 100, 100)]);
        let texts = all_texts(&canvas.into_pages());
        assert!(texts.contains(&"IMAGEM DO DIÁRIO DE OBRA".to_string()));
    }

    #[test]
    fn undecodable_image_becomes_error_text() {
        let mut canvas = Canvas::new();
        canvas.y = 40.0;
        let slots = vec![
            ImageSlot {
                name: "quebrada.png".into(),
                pixels: None,
            },
            ImageSlot {
                name: "outra.png".into(),
                pixels: None,
            },
        ];
        draw_image_grid(&mut canvas, &slots);
        let y_after_heading = 50.0;
        assert_eq!(canvas.y, y_after_heading + FAILED_IMAGE_ROW_HEIGHT + IMAGE_GAP + 5.0);
        let texts = all_texts(&canvas.into_pages());
        assert!(texts.contains(&"Erro ao processar imagem 1".to_string()));
        assert!(texts.contains(&"Erro ao processar imagem 2".to_string()));
    }

    #[test]
    fn image_rows_break_pages() {
        let mut canvas = Canvas::new();
        // Portrait photos fill 80 mm rows: two rows per page.
        let slots: Vec<ImageSlot> = (0..10).map(|i| slot(&format!("{i}.jpg"), 3000, 4000)).collect();
        draw_image_grid(&mut canvas, &slots);
        assert_eq!(canvas.page_count(), 3);
        for page in canvas.into_pages() {
            for op in &page.ops {
                if let DrawOp::Image { y, height, .. } = op {
                    assert!(*y <= IMAGE_ROW_LIMIT);
                    assert!(y + height <= PAGE_HEIGHT);
                }
            }
        }
    }

    #[test]
    fn images_start_new_page_past_threshold() {
        let mut canvas = Canvas::new();
        canvas.y = 201.0;
        draw_image_grid(&mut canvas, &[slot("x.png", 10, 10)]);
        assert_eq!(canvas.page_count(), 2);
    }
}
