use image::imageops::FilterType;
use std::path::Path;

use crate::error::MediaError;

/// A decoded, downscaled photo ready for display (RGBA8)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decode a camera photo and scale it to fit inside `max_width` x `max_height`,
/// keeping its aspect ratio.
pub fn load_thumbnail(path: &Path, max_width: u32, max_height: u32) -> Result<Thumbnail, MediaError> {
    let fail = |reason: String| MediaError::PhotoDecode {
        path: path.to_path_buf(),
        reason,
    };

    if path.as_os_str().is_empty() {
        return Err(fail("no photo selected".to_string()));
    }
    if !path.exists() {
        return Err(fail("file does not exist".to_string()));
    }

    let img = image::open(path).map_err(|e| fail(e.to_string()))?;
    let scaled = img.resize(max_width, max_height, FilterType::Triangle).to_rgba8();

    Ok(Thumbnail {
        width: scaled.width(),
        height: scaled.height(),
        pixels: scaled.into_raw(),
    })
}
