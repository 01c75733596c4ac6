//! Thumbnail options sent with file listings.

use serde::{Deserialize, Serialize};

/// Encoding of generated thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Webp,
}

impl ImageFormat {
    /// The backend's name for the format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webp => "webp",
        }
    }
}

/// Size and format of the signed thumbnail URL returned for each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Encoding.
    pub format: ImageFormat,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            format: ImageFormat::Webp,
        }
    }
}

impl ImageOptions {
    /// Square thumbnails of the given edge length.
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_options_wire_shape() {
        let json = serde_json::to_value(ImageOptions::square(128)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "width": 128, "height": 128, "format": "webp" })
        );
        assert_eq!(json["format"], ImageFormat::Webp.as_str());
    }

    #[test]
    fn test_image_options_defaults() {
        let options: ImageOptions = serde_json::from_str(r#"{"width": 32}"#).unwrap();
        assert_eq!(options.width, 32);
        assert_eq!(options.height, 64);
        assert_eq!(options.format, ImageFormat::Webp);
    }
}
