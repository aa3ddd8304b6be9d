/// Media decoding module
///
/// This module handles:
/// - Decoding camera photos into gallery thumbnails
/// - Decoding video files frame by frame for playback
/// - Recognizing photo and video files by extension

use std::path::Path;

pub mod thumbnail;
pub mod video;

/// Still image extensions offered by the photo picker
pub const PHOTO_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Video extensions offered by the video picker
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

pub fn is_photo_path(path: &Path) -> bool {
    has_extension(path, &PHOTO_EXTENSIONS)
}

pub fn is_video_path(path: &Path) -> bool {
    has_extension(path, &VIDEO_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}
