use std::io::Cursor;

use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use super::ImportError;
use crate::config::{MAX_IMAGE_FILE_BYTES, MAX_WORD_FILE_BYTES};
use crate::models::ImageFormat;

/// Broad file categories we handle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum FileCategory {
    WordDocx,
    LegacyWordDoc,
    Image(ImageFormat),
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WordDocx => "docx",
            Self::LegacyWordDoc => "doc",
            Self::Image(_) => "image",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDetection {
    pub mime_type: String,
    pub category: FileCategory,
    pub file_size_bytes: u64,
}

/// Main part of every Word 2007+ package.
const DOCX_MAIN_PART: &str = "word/document.xml";

/// Detect file format from magic bytes (NOT file extensions).
pub fn detect_format(bytes: &[u8]) -> FormatDetection {
    let (mime_type, category) = match bytes {
        // ZIP local file header: PK\x03\x04
        [0x50, 0x4B, 0x03, 0x04, ..] => {
            if zip_has_entry(bytes, DOCX_MAIN_PART) {
                (
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    FileCategory::WordDocx,
                )
            } else {
                ("application/zip", FileCategory::Unsupported)
            }
        }
        // OLE2 compound file (Word 97-2003)
        [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, ..] => {
            ("application/msword", FileCategory::LegacyWordDoc)
        }
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => ("image/jpeg", FileCategory::Image(ImageFormat::Jpeg)),
        // PNG: starts with 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => ("image/png", FileCategory::Image(ImageFormat::Png)),
        _ => ("application/octet-stream", FileCategory::Unsupported),
    };

    FormatDetection {
        mime_type: mime_type.to_string(),
        category,
        file_size_bytes: bytes.len() as u64,
    }
}

fn zip_has_entry(bytes: &[u8], entry: &str) -> bool {
    ZipArchive::new(Cursor::new(bytes)).is_ok_and(|archive| archive.index_for_name(entry).is_some())
}

fn check_size(len: u64, max: u64) -> Result<(), ImportError> {
    if len == 0 {
        return Err(ImportError::EmptyFile);
    }
    if len > max {
        return Err(ImportError::FileTooLarge {
            size_mb: len as f64 / (1024.0 * 1024.0),
            max_mb: max / (1024 * 1024),
        });
    }
    Ok(())
}

/// Validate a Word upload: `.docx`/`.doc` name, size limit, then content.
/// Only `.docx` content can be parsed; legacy `.doc` gets a dedicated error.
pub fn validate_word_upload(file_name: &str, bytes: &[u8]) -> Result<FormatDetection, ImportError> {
    let lower = file_name.to_lowercase();
    if !(lower.ends_with(".docx") || lower.ends_with(".doc")) {
        return Err(ImportError::UnsupportedFormat(
            "envie um arquivo Word (.docx ou .doc)".into(),
        ));
    }
    check_size(bytes.len() as u64, MAX_WORD_FILE_BYTES)?;

    let detection = detect_format(bytes);
    match detection.category {
        FileCategory::WordDocx => Ok(detection),
        FileCategory::LegacyWordDoc => Err(ImportError::LegacyDoc),
        _ => Err(ImportError::UnsupportedFormat(format!(
            "{} não é um documento Word válido",
            sanitize_filename(file_name)
        ))),
    }
}

/// Validate an image attachment: must be a JPEG/PNG by content, no larger
/// than 5 MB, and its name must not claim a non-image type.
pub fn validate_image_upload(file_name: &str, bytes: &[u8]) -> Result<ImageFormat, ImportError> {
    let name = sanitize_filename(file_name);

    if let Some(guess) = mime_guess::from_path(&name).first() {
        if guess.type_() != mime_guess::mime::IMAGE {
            return Err(ImportError::UnsupportedFormat(format!(
                "o arquivo {name} não é uma imagem válida"
            )));
        }
    }

    if bytes.len() as u64 > MAX_IMAGE_FILE_BYTES {
        return Err(ImportError::UnsupportedFormat(format!(
            "a imagem {name} excede o tamanho máximo de 5MB"
        )));
    }
    if bytes.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    match detect_format(bytes).category {
        FileCategory::Image(format) => Ok(format),
        _ => Err(ImportError::UnsupportedFormat(format!(
            "o arquivo {name} não é uma imagem JPEG ou PNG"
        ))),
    }
}

/// Sanitize a filename: strip path components, limit length
pub fn sanitize_filename(original: &str) -> String {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let clean: String = name
        .chars()
        .filter(|c| *c != '\0')
        .take(255)
        .collect();

    if clean.is_empty() || clean == "." || clean == ".." {
        "document".to_string()
    } else {
        clean
    }
}
