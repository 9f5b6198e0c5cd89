//! `render`: form → validated report → PDF file.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{read_form, RenderArgs};
use crate::form::{FormError, ReportForm};
use crate::pdf::{generate_report_pdf, report_file_name, StampConfig};
use crate::pipeline::import::load_image_file;

/// Stamp selected by the command-line flags.
pub fn stamp_from_args(args: &RenderArgs) -> Result<StampConfig, String> {
    if args.no_stamp {
        return Ok(StampConfig::disabled());
    }
    match &args.stamp {
        Some(path) => {
            let bytes = std::fs::read(path)
                .map_err(|e| format!("Não foi possível ler {}: {e}", path.display()))?;
            serde_json::from_slice(&bytes)
                .map_err(|e| format!("Carimbo inválido em {}: {e}", path.display()))
        }
        None => Ok(StampConfig::default()),
    }
}

/// Attach images, submit and write the PDF. Returns the written path.
pub fn render_form(mut form: ReportForm, args: &RenderArgs) -> Result<PathBuf, String> {
    for path in &args.images {
        let image = load_image_file(path)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        form.add_image(image).map_err(|e| e.to_string())?;
    }

    let report = form.submit().map_err(|e| match e {
        FormError::Validation(errors) => {
            let lines: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
            format!("Formulário incompleto:\n{}", lines.join("\n"))
        }
        other => other.to_string(),
    })?;

    let stamp = stamp_from_args(args)?;
    let bytes = generate_report_pdf(&report, &stamp).map_err(|e| format!("Erro ao gerar PDF: {e}"))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report_file_name(&report)));
    std::fs::write(&output, &bytes)
        .map_err(|e| format!("Não foi possível gravar {}: {e}", output.display()))?;

    info!(size_bytes = bytes.len(), images = report.images.len(), "PDF written");
    Ok(output)
}

pub fn render_form_file(form_path: &Path, args: &RenderArgs) -> Result<PathBuf, String> {
    render_form(read_form(form_path)?, args)
}
