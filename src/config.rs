use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the optional settings file inside the platform config directory
const CONFIG_FILE: &str = "parking-monitor.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub gallery: GallerySettings,
    pub playback: PlaybackSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    /// SQLite file holding the `cameras` table
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GallerySettings {
    pub columns: usize,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub spacing: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackSettings {
    /// Delay between frame pulls (~33 fps at 30 ms)
    pub frame_interval_ms: u64,
    pub ffmpeg_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Settings {
    /// Load settings from the platform config directory, falling back to defaults.
    ///
    /// - Linux: ~/.config/parking-monitor/parking-monitor.toml
    /// - macOS: ~/Library/Application Support/parking-monitor/parking-monitor.toml
    /// - Windows: %APPDATA%\parking-monitor\parking-monitor.toml
    pub fn load() -> Result<Self, ConfigError> {
        let path = dirs::config_dir()
            .map(|dir| dir.join("parking-monitor").join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load_from_file(path)
    }

    /// Load settings from a specific TOML file. A missing file yields defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading settings from {}", path.display());

        let settings = Config::builder()
            .set_default("registry.db_path", "cameras.db")?
            .set_default("gallery.columns", 3_i64)?
            .set_default("gallery.thumbnail_width", 300_i64)?
            .set_default("gallery.thumbnail_height", 200_i64)?
            .set_default("gallery.spacing", 10.0)?
            .set_default("playback.frame_interval_ms", 30_i64)?
            .set_default("playback.ffmpeg_path", "ffmpeg")?
            .set_default("logging.level", "info")?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gallery.columns == 0 {
            return Err(ConfigError::Message(
                "gallery.columns must be greater than 0".to_string(),
            ));
        }

        if self.gallery.thumbnail_width == 0 || self.gallery.thumbnail_height == 0 {
            return Err(ConfigError::Message(
                "Thumbnail size must be greater than 0".to_string(),
            ));
        }

        if self.playback.frame_interval_ms == 0 {
            return Err(ConfigError::Message(
                "playback.frame_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.playback.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from_file(dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings.registry.db_path, PathBuf::from("cameras.db"));
        assert_eq!(settings.gallery.columns, 3);
        assert_eq!(settings.gallery.thumbnail_width, 300);
        assert_eq!(settings.gallery.thumbnail_height, 200);
        assert_eq!(settings.frame_interval(), Duration::from_millis(30));
        assert_eq!(settings.playback.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parking-monitor.toml");
        std::fs::write(
            &path,
            "[registry]\ndb_path = \"/srv/lots/cameras.db\"\n\n[playback]\nframe_interval_ms = 40\n",
        )
        .unwrap();

        let settings = Settings::load_from_file(&path).unwrap();

        assert_eq!(settings.registry.db_path, PathBuf::from("/srv/lots/cameras.db"));
        assert_eq!(settings.frame_interval(), Duration::from_millis(40));
        assert_eq!(settings.gallery.columns, 3);
    }

    #[test]
    fn test_zero_columns_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parking-monitor.toml");
        std::fs::write(&path, "[gallery]\ncolumns = 0\n").unwrap();

        assert!(Settings::load_from_file(&path).is_err());
    }

    #[test]
    fn test_zero_thumbnail_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parking-monitor.toml");

        std::fs::write(&path, "[gallery]\nthumbnail_width = 0\n").unwrap();
        assert!(Settings::load_from_file(&path).is_err());

        std::fs::write(&path, "[gallery]\nthumbnail_height = 0\n").unwrap();
        assert!(Settings::load_from_file(&path).is_err());
    }

    #[test]
    fn test_zero_frame_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parking-monitor.toml");
        std::fs::write(&path, "[playback]\nframe_interval_ms = 0\n").unwrap();

        assert!(Settings::load_from_file(&path).is_err());
    }
}
