//! Magic-byte sniffing for image blobs handed to the providers as-is.

/// Formats both vendors accept inline.
pub const SUPPORTED_MIME_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/webp", "image/gif"];

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), assuming image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_known_formats() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            "image/png"
        );
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(detect_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(detect_image_mime(b"GIF89a"), "image/gif");
    }

    #[test]
    fn test_detected_types_are_supported() {
        for bytes in [&b"GIF87a"[..], &b"RIFF1234WEBP"[..], &[0xFF, 0xD8, 0xFF][..]] {
            assert!(SUPPORTED_MIME_TYPES.contains(&detect_image_mime(bytes)));
        }
    }

    #[test]
    fn test_unknown_and_empty_fall_back_to_png() {
        assert_eq!(detect_image_mime(b"BM\0\0"), "image/png");
        assert_eq!(detect_image_mime(&[]), "image/png");
    }
}
