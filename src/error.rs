// Parking Monitor error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the camera registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("A camera named '{0}' already exists")]
    DuplicateName(String),

    #[error("Camera '{0}' was not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the image and video decoding surfaces
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Could not load image {}: {reason}", path.display())]
    PhotoDecode { path: PathBuf, reason: String },

    #[error("Could not open video {}: {reason}", path.display())]
    VideoOpen { path: PathBuf, reason: String },

    #[error("Video playback failed for {}: {reason}", path.display())]
    VideoDecode { path: PathBuf, reason: String },
}

/// Conditions that stop a management dialog from progressing
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogError {
    #[error("No cameras are registered yet")]
    EmptyRegistry,

    #[error("A name, a photo and a video are required")]
    EmptySelection,

    #[error("Camera name cannot be empty")]
    EmptyName,
}

/// Top-level error returned from `main`
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Dialog(#[from] DialogError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("GUI error: {0}")]
    Gui(#[from] iced::Error),
}
