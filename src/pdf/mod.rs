//! Daily report PDF: A4 portrait, Helvetica, tables and a photo grid, with
//! the engineer's stamp and page numbers on every page.
//!
//! Layout and rendering are separate passes. `sections` builds a page plan
//! of positioned draw operations; `render` writes that plan with printpdf.

pub mod layout;
pub mod render;
pub mod sections;
pub mod stamp;
pub mod table;

use image::{DynamicImage, GenericImageView};
use thiserror::Error;
use tracing::{info, warn};

pub use layout::Page;
pub use sections::ImageSlot;
pub use stamp::{StampConfig, StampLine};

use crate::models::DailyReport;
use crate::pipeline::import::decode_oriented;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF image error: {0}")]
    Image(String),

    #[error("PDF save error: {0}")]
    Save(String),
}

/// Decode every attached image once. Failures become `None` and are
/// printed as an error line in the grid.
fn decode_images(report: &DailyReport) -> Vec<Option<DynamicImage>> {
    report
        .images
        .iter()
        .enumerate()
        .map(|(i, img)| match decode_oriented(&img.bytes, img.format) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(index = i + 1, error = %e, "Image could not be decoded for the PDF");
                None
            }
        })
        .collect()
}

/// Page plan for `report`: content, stamp and footers.
pub fn plan_report(
    report: &DailyReport,
    decoded: &[Option<DynamicImage>],
    stamp: &StampConfig,
) -> Vec<Page> {
    let slots: Vec<ImageSlot> = report
        .images
        .iter()
        .zip(decoded)
        .map(|(img, dec)| ImageSlot {
            name: img.name.clone(),
            pixels: dec.as_ref().map(|d| d.dimensions()),
        })
        .collect();

    let mut pages = sections::layout_report(report, &slots).into_pages();
    stamp::apply_stamp(&mut pages, stamp);
    stamp::apply_footers(&mut pages);
    pages
}

/// Render `report` to PDF bytes.
pub fn generate_report_pdf(report: &DailyReport, stamp: &StampConfig) -> Result<Vec<u8>, PdfError> {
    let decoded = decode_images(report);
    let pages = plan_report(report, &decoded, stamp);
    let title = format!("Diário de Obra {}", report.sheet_number);
    let bytes = render::render_pages(&title, &pages, &decoded)?;

    info!(
        pages = pages.len(),
        images = report.images.len(),
        failed_images = decoded.iter().filter(|d| d.is_none()).count(),
        size_bytes = bytes.len(),
        "Report PDF generated"
    );
    Ok(bytes)
}

/// `Diario_Obra_<sheet>_<YYYYMMDD>.pdf`, with the sheet number made safe
/// for file systems.
pub fn report_file_name(report: &DailyReport) -> String {
    let sheet: String = report
        .sheet_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sheet = if sheet.is_empty() {
        "sem_numero".to_string()
    } else {
        sheet
    };
    format!("Diario_Obra_{}_{}.pdf", sheet, report.date.format("%Y%m%d"))
}
