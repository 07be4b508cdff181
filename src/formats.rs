//! File type detection for intake
//!
//! Maps file extensions to MIME types so that files read from disk carry the
//! same type information a browser would attach to a selected file.

use crate::constants::FALLBACK_MIME_TYPE;
use std::path::Path;

/// Image formats recognised at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
    Gif,
    Avif,
}

impl ImageKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "webp" => Some(ImageKind::WebP),
            "bmp" => Some(ImageKind::Bmp),
            "tif" | "tiff" => Some(ImageKind::Tiff),
            "gif" => Some(ImageKind::Gif),
            "avif" => Some(ImageKind::Avif),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::WebP => "image/webp",
            ImageKind::Bmp => "image/bmp",
            ImageKind::Tiff => "image/tiff",
            ImageKind::Gif => "image/gif",
            ImageKind::Avif => "image/avif",
        }
    }
}

/// MIME type for a path, falling back to `application/octet-stream`.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageKind::from_extension)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_kind_from_extension() {
        assert_eq!(ImageKind::from_extension("jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("JPEG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("PnG"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_extension("tif"), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_extension("txt"), None);
    }

    #[test]
    fn test_mime_type_for_path() {
        assert_eq!(mime_type_for_path(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type_for_path(Path::new("dir/b.WEBP")), "image/webp");
        assert_eq!(mime_type_for_path(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(mime_type_for_path(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn test_is_image_mime() {
        assert!(is_image_mime("image/png"));
        assert!(!is_image_mime("application/octet-stream"));
        assert!(!is_image_mime("text/image"));
    }
}
