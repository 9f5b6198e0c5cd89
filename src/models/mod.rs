pub mod enums;
pub mod image;
pub mod imported;
pub mod report;

pub use enums::*;
pub use self::image::*;
pub use imported::*;
pub use report::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid image data URL: {0}")]
    InvalidDataUrl(String),
}
