/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the registry and the UI layer.

/// Represents a single camera in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Camera {
    /// Unique database ID, assigned on insert
    pub id: i64,
    /// Human-facing name (unique across the registry)
    pub name: String,
    /// Path to the still image used as the thumbnail (empty if none)
    pub photo_path: String,
    /// Path to the looping video file (empty if none)
    pub video_path: String,
}

impl Camera {
    pub fn has_photo(&self) -> bool {
        !self.photo_path.is_empty()
    }
}

/// Fields collected by the Add dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCamera {
    pub name: String,
    pub photo_path: String,
    pub video_path: String,
}

/// Replacement values written by the Edit dialog.
///
/// `None` clears the column; the store keeps no notion of "unchanged".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraUpdate {
    pub name: String,
    pub photo_path: Option<String>,
    pub video_path: Option<String>,
}
