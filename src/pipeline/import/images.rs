//! Site photo intake: validation, decoding, and EXIF orientation.

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use super::format::{sanitize_filename, validate_image_upload};
use super::ImportError;
use crate::models::{ImageFormat, ReportImage};

/// Validate and decode an image attachment.
///
/// The original bytes are kept untouched; width/height reflect the
/// orientation the photo will be displayed in.
pub fn load_image(file_name: &str, bytes: Vec<u8>) -> Result<ReportImage, ImportError> {
    let format = validate_image_upload(file_name, &bytes)?;
    let decoded = decode_oriented(&bytes, format)?;

    let image = ReportImage {
        name: sanitize_filename(file_name),
        format,
        width: decoded.width(),
        height: decoded.height(),
        bytes,
    };
    debug!(
        width = image.width,
        height = image.height,
        format = format.as_str(),
        "Loaded image attachment"
    );
    Ok(image)
}

/// Read an image attachment from disk.
pub fn load_image_file(path: &Path) -> Result<ReportImage, ImportError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_image(&name, bytes)
}

/// Decode bytes and rotate/flip according to the EXIF orientation tag.
pub fn decode_oriented(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, ImportError> {
    let image_format = match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    };
    let decoded = image::load_from_memory_with_format(bytes, image_format)
        .map_err(|e| ImportError::ImageProcessing(e.to_string()))?;
    Ok(apply_orientation(decoded, read_exif_orientation(bytes)))
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
///
/// 1 = Normal, 2 = Mirrored, 3 = 180deg, 4 = Flipped V,
/// 5 = Mirrored + 90deg CW, 6 = 90deg CW, 7 = Mirrored + 270deg CW, 8 = 270deg CW
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}
