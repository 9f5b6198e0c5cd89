//! `import`: Word document → extracted fields (or a pre-filled form).

use std::path::Path;

use tracing::info;

use super::{read_form, write_json};
use crate::config;
use crate::models::ImportedReport;
use crate::pipeline::structuring::{import_word_document, ExtractionEngine};

/// Read and extract a .docx file from disk.
pub fn import_file(path: &Path, engine: ExtractionEngine) -> Result<ImportedReport, String> {
    if !path.is_file() {
        return Err(format!("Arquivo não encontrado: {}", path.display()));
    }
    let size = std::fs::metadata(path).map_err(|e| e.to_string())?.len();
    if size > config::MAX_WORD_FILE_BYTES {
        return Err(format!(
            "Arquivo muito grande: {:.1}MB excede o limite de {}MB",
            size as f64 / (1024.0 * 1024.0),
            config::MAX_WORD_FILE_BYTES / (1024 * 1024)
        ));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| format!("Não foi possível ler {}: {e}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("documento.docx");

    import_word_document(file_name, &bytes, engine)
        .map_err(|e| format!("Erro ao processar documento: {e}"))
}

/// Extract, optionally merge into an existing form, and write the JSON.
pub fn import_command(
    file: &Path,
    engine: ExtractionEngine,
    form: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), String> {
    let imported = import_file(file, engine)?;
    if imported.is_empty() {
        info!("No report fields recognised in document");
    }

    match form {
        Some(form_path) => {
            let mut form = read_form(form_path)?;
            form.apply_import(&imported);
            write_json(&form, output)
        }
        None => write_json(&imported, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ReportForm;
    use crate::models::WeatherCondition;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            zip.start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        std::fs::write(path, buffer.into_inner()).unwrap();
    }

    #[test]
    fn import_writes_extracted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("rdo.docx");
        write_docx(&docx, &["Nome da Obra: Escola Municipal", "Condições do Tempo: chuvoso"]);
        let out = dir.path().join("dados.json");

        import_command(&docx, ExtractionEngine::Heuristic, None, Some(&out)).unwrap();

        let imported: ImportedReport =
            serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(imported.site_name.as_deref(), Some("Escola Municipal"));
        assert_eq!(imported.weather, Some(WeatherCondition::Chuvoso));
    }

    #[test]
    fn import_merges_into_form() {
        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("rdo.docx");
        write_docx(&docx, &["Nome da Obra: Escola Municipal"]);

        let mut form = ReportForm::new();
        form.site_name = "Antigo".into();
        form.contractor = "Construtora ABC".into();
        let form_path = dir.path().join("form.json");
        std::fs::write(&form_path, serde_json::to_vec(&form).unwrap()).unwrap();
        let out = dir.path().join("merged.json");

        import_command(&docx, ExtractionEngine::Heuristic, Some(&form_path), Some(&out)).unwrap();

        let merged: ReportForm = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(merged.site_name, "Escola Municipal");
        assert_eq!(merged.contractor, "Construtora ABC");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_file(&dir.path().join("nada.docx"), ExtractionEngine::Heuristic).unwrap_err();
        assert!(err.contains("não encontrado"));
    }

    #[test]
    fn invalid_document_message_is_user_facing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texto.txt");
        std::fs::write(&path, "Nome da Obra: X").unwrap();
        let err = import_file(&path, ExtractionEngine::Heuristic).unwrap_err();
        assert!(err.starts_with("Erro ao processar documento"));
    }
}
