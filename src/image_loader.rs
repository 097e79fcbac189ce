//! # Resource Loading
//!
//! Resolves picture and font sources (data URIs, file paths or raw base64)
//! to bytes, and reads intrinsic picture dimensions. Layout only needs the
//! size of a picture; its pixels go to the painter untouched.

use std::io::Cursor;

use crate::error::{DocflowError, Result};

/// Resolve a source string to raw bytes.
///
/// Supported `src` formats:
/// - `data:<mime>;base64,...`
/// - File path (absolute or explicitly relative)
/// - Raw base64
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DocflowError::Image("Invalid data URI: missing comma".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(DocflowError::Image(format!(
                "Unsupported data URI encoding '{header}', expected base64"
            )));
        }
        return base64_decode(payload);
    }

    // Only explicit path prefixes; base64 text may contain '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src)
            .map_err(|e| DocflowError::Image(format!("Failed to read '{src}': {e}")));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| DocflowError::Image(format!("Base64 decode error: {e}")))
}

/// Pixel width and height of a picture, read from its header only.
pub fn picture_dimensions(src: &str) -> Result<(u32, u32)> {
    let data = read_source_bytes(src)?;
    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| DocflowError::Image(format!("Format detection error: {e}")))?
        .into_dimensions()
        .map_err(|e| DocflowError::Image(format!("Failed to read dimensions: {e}")))
}
