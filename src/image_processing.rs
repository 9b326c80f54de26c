use image::ImageFormat;

use crate::settings::FileFormat;

/// Identifies a decoded payload from its magic bytes.
pub fn detect_format(bytes: &[u8]) -> Option<FileFormat> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some(FileFormat::Png),
        ImageFormat::Jpeg => Some(FileFormat::Jpg),
        ImageFormat::WebP => Some(FileFormat::Webp),
        _ => None,
    }
}

pub fn mime_type(format: FileFormat) -> &'static str {
    match format {
        FileFormat::Png => "image/png",
        FileFormat::Jpg => "image/jpeg",
        FileFormat::Webp => "image/webp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_format(&png), Some(FileFormat::Png));
        assert_eq!(detect_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(FileFormat::Jpg));
        assert_eq!(detect_format(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some(FileFormat::Webp));
        assert_eq!(detect_format(b"GIF89a......"), None);
        assert_eq!(detect_format(b"not an image"), None);
    }
}
