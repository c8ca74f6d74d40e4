use admitnote_core::envelope::InlineImage;
use base64::Engine;
use std::path::Path;

/// Largest image accepted for an inline upload.
pub const MAX_INLINE_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

pub fn encode_inline_image(bytes: &[u8], mime_type: &str) -> InlineImage {
    InlineImage {
        mime_type: mime_type.to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    }
}
