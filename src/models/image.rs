use base64::Engine;
use serde::{Deserialize, Serialize};

use super::enums::ImageFormat;
use super::ModelError;

/// An image attached to the report, already validated and decoded once.
///
/// Serialized as the form attachment payload: a data URL plus
/// the file name and pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ImagePayload", into = "ImagePayload")]
pub struct ReportImage {
    pub name: String,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
    /// Pixel dimensions after EXIF orientation.
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Dimensions {
    width: u32,
    height: u32,
}

#[derive(Serialize, Deserialize)]
struct ImagePayload {
    data: String,
    nome: String,
    dimensoes: Dimensions,
}

impl ReportImage {
    /// `data:image/<fmt>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Split a base64 data URL into its image format and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(ImageFormat, Vec<u8>), ModelError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ModelError::InvalidDataUrl("missing data: prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ModelError::InvalidDataUrl("missing payload".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ModelError::InvalidDataUrl("only base64 data URLs are supported".into()))?;
    let format = ImageFormat::from_mime(mime)
        .ok_or_else(|| ModelError::InvalidDataUrl(format!("unsupported image type: {mime}")))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ModelError::InvalidDataUrl(e.to_string()))?;
    Ok((format, bytes))
}

impl TryFrom<ImagePayload> for ReportImage {
    type Error = ModelError;

    fn try_from(p: ImagePayload) -> Result<Self, Self::Error> {
        let (format, bytes) = decode_data_url(&p.data)?;
        Ok(Self {
            name: p.nome,
            format,
            bytes,
            width: p.dimensoes.width,
            height: p.dimensoes.height,
        })
    }
}

impl From<ReportImage> for ImagePayload {
    fn from(img: ReportImage) -> Self {
        Self {
            data: img.to_data_url(),
            dimensoes: Dimensions {
                width: img.width,
                height: img.height,
            },
            nome: img.name,
        }
    }
}
