use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(WeatherCondition {
    Bom => "bom",
    Nublado => "nublado",
    Chuvoso => "chuvoso",
});

str_enum!(ImageFormat {
    Jpeg => "jpeg",
    Png => "png",
});

impl Default for WeatherCondition {
    fn default() -> Self {
        Self::Bom
    }
}

impl WeatherCondition {
    /// Label printed on the report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bom => "Bom",
            Self::Nublado => "Nublado",
            Self::Chuvoso => "Chuvoso",
        }
    }

    pub fn is_rainy(&self) -> bool {
        matches!(self, Self::Chuvoso)
    }
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Maps a MIME type to a supported format. `image/jpg` is accepted as JPEG.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }
}
