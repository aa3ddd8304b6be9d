use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::data::{Camera, CameraUpdate};
use crate::error::RegistryError;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// The Registry manages the SQLite camera database.
///
/// The on-disk schema is a single `cameras` table and is shared with
/// existing data files, so column names and the UNIQUE name constraint
/// must not change. Every method is one SQL statement, so a failed call
/// never leaves the table partially modified.
pub struct Registry {
    conn: Connection,
    db_path: PathBuf,
}

impl Registry {
    /// Open (or create) the registry file and make sure the schema exists.
    pub fn open(db_path: impl AsRef<Path>) -> RegistryResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!("📁 Camera registry opened at {}", db_path.display());

        let registry = Registry { conn, db_path };
        registry.init_schema()?;
        Ok(registry)
    }

    /// Registry backed by a private in-memory database
    #[cfg(test)]
    pub fn open_in_memory() -> RegistryResult<Self> {
        let registry = Registry {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        registry.init_schema()?;
        Ok(registry)
    }

    /// Create the cameras table if it does not exist yet. Safe to call repeatedly.
    pub fn init_schema(&self) -> RegistryResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cameras (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT UNIQUE,
                photo   TEXT,
                video   TEXT
            )",
            [],
        )?;
        debug!("Registry schema ready");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn camera_count(&self) -> RegistryResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM cameras", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get all cameras in insertion order.
    /// Missing photo/video columns come back as empty strings.
    pub fn list_cameras(&self) -> RegistryResult<Vec<Camera>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, photo, video FROM cameras ORDER BY id")?;

        let cameras = stmt
            .query_map([], row_to_camera)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cameras)
    }

    /// Names of all cameras, in the same order as `list_cameras`
    pub fn camera_names(&self) -> RegistryResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM cameras ORDER BY id")?;
        let names = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names.into_iter().map(Option::unwrap_or_default).collect())
    }

    pub fn find_by_name(&self, name: &str) -> RegistryResult<Option<Camera>> {
        let camera = self
            .conn
            .query_row(
                "SELECT id, name, photo, video FROM cameras WHERE name = ?1",
                params![name],
                row_to_camera,
            )
            .optional()?;
        Ok(camera)
    }

    pub fn find_by_id(&self, id: i64) -> RegistryResult<Option<Camera>> {
        let camera = self
            .conn
            .query_row(
                "SELECT id, name, photo, video FROM cameras WHERE id = ?1",
                params![id],
                row_to_camera,
            )
            .optional()?;
        Ok(camera)
    }

    /// Insert a new camera and return its id.
    /// Fails with `DuplicateName` if the name is taken.
    pub fn insert_camera(&self, name: &str, photo: &str, video: &str) -> RegistryResult<i64> {
        self.conn
            .execute(
                "INSERT INTO cameras (name, photo, video) VALUES (?1, ?2, ?3)",
                params![name, photo, video],
            )
            .map_err(|e| map_constraint(e, name))?;

        let id = self.conn.last_insert_rowid();
        info!("➕ Added camera '{}' (id {})", name, id);
        Ok(id)
    }

    /// Overwrite every field of the camera currently called `old_name`.
    ///
    /// `None` photo/video values clear the column.
    pub fn update_camera(&self, old_name: &str, update: &CameraUpdate) -> RegistryResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE cameras SET name = ?1, photo = ?2, video = ?3 WHERE name = ?4",
                params![update.name, update.photo_path, update.video_path, old_name],
            )
            .map_err(|e| map_constraint(e, &update.name))?;

        if changed == 0 {
            return Err(RegistryError::NotFound(old_name.to_string()));
        }

        info!("✏️  Updated camera '{}' -> '{}'", old_name, update.name);
        Ok(())
    }

    /// Delete a camera by name. Returns whether a row was removed.
    pub fn delete_camera(&self, name: &str) -> RegistryResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM cameras WHERE name = ?1", params![name])?;

        if removed > 0 {
            info!("🗑️  Deleted camera '{}'", name);
        } else {
            debug!("Delete of unknown camera '{}' ignored", name);
        }
        Ok(removed > 0)
    }
}

fn row_to_camera(row: &rusqlite::Row<'_>) -> rusqlite::Result<Camera> {
    Ok(Camera {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        photo_path: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        video_path: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

/// Turn a UNIQUE violation into `DuplicateName`; pass other errors through.
fn map_constraint(err: rusqlite::Error, name: &str) -> RegistryError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            RegistryError::DuplicateName(name.to_string())
        }
        other => RegistryError::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(registry: &Registry) -> Vec<String> {
        registry
            .list_cameras()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let registry = Registry::open_in_memory().unwrap();
        registry.insert_camera("Lot-A", "a.png", "a.mp4").unwrap();

        registry.init_schema().unwrap();
        registry.init_schema().unwrap();

        assert_eq!(registry.camera_count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let registry = Registry::open_in_memory().unwrap();

        let id = registry.insert_camera("Lot-A", "a.png", "a.mp4").unwrap();
        assert_eq!(id, 1);
        assert_eq!(registry.list_cameras().unwrap().len(), 1);

        let err = registry.insert_camera("Lot-A", "b.png", "b.mp4").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(ref n) if n == "Lot-A"));
        assert_eq!(registry.camera_count().unwrap(), 1);

        let stored = registry.find_by_name("Lot-A").unwrap().unwrap();
        assert_eq!(stored.photo_path, "a.png");
        assert_eq!(stored.video_path, "a.mp4");
    }

    #[test]
    fn test_list_returns_inserted_set_in_order() {
        let registry = Registry::open_in_memory().unwrap();
        for name in ["North", "South", "East", "West"] {
            registry
                .insert_camera(name, &format!("{name}.png"), &format!("{name}.mp4"))
                .unwrap();
        }

        assert_eq!(names(&registry), vec!["North", "South", "East", "West"]);
        assert_eq!(registry.camera_names().unwrap(), names(&registry));
    }

    #[test]
    fn test_rename_collision_leaves_both_rows_unchanged() {
        let registry = Registry::open_in_memory().unwrap();
        registry.insert_camera("A", "a.png", "a.mp4").unwrap();
        registry.insert_camera("B", "b.png", "b.mp4").unwrap();
        let before = registry.list_cameras().unwrap();

        let update = CameraUpdate {
            name: "B".to_string(),
            photo_path: Some("new.png".to_string()),
            video_path: Some("new.mp4".to_string()),
        };
        let err = registry.update_camera("A", &update).unwrap_err();

        assert!(matches!(err, RegistryError::DuplicateName(_)));
        assert_eq!(registry.list_cameras().unwrap(), before);
    }

    #[test]
    fn test_update_can_keep_own_name() {
        let registry = Registry::open_in_memory().unwrap();
        registry.insert_camera("A", "a.png", "a.mp4").unwrap();

        let update = CameraUpdate {
            name: "A".to_string(),
            photo_path: Some("a2.png".to_string()),
            video_path: Some("a2.mp4".to_string()),
        };
        registry.update_camera("A", &update).unwrap();

        let camera = registry.find_by_name("A").unwrap().unwrap();
        assert_eq!(camera.photo_path, "a2.png");
        assert_eq!(camera.video_path, "a2.mp4");
    }

    #[test]
    fn test_update_without_files_clears_them() {
        let registry = Registry::open_in_memory().unwrap();
        registry.insert_camera("A", "a.png", "a.mp4").unwrap();

        let update = CameraUpdate {
            name: "A-renamed".to_string(),
            photo_path: None,
            video_path: None,
        };
        registry.update_camera("A", &update).unwrap();

        assert!(registry.find_by_name("A").unwrap().is_none());
        let camera = registry.find_by_name("A-renamed").unwrap().unwrap();
        assert_eq!(camera.id, 1);
        assert!(!camera.has_photo());
        assert!(camera.video_path.is_empty());
    }

    #[test]
    fn test_update_unknown_camera() {
        let registry = Registry::open_in_memory().unwrap();
        let update = CameraUpdate {
            name: "X".to_string(),
            photo_path: None,
            video_path: None,
        };

        let err = registry.update_camera("ghost", &update).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
        assert_eq!(registry.camera_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_missing_name_is_noop() {
        let registry = Registry::open_in_memory().unwrap();
        registry.insert_camera("A", "a.png", "a.mp4").unwrap();
        let before = registry.list_cameras().unwrap();

        assert!(!registry.delete_camera("nope").unwrap());
        assert_eq!(registry.list_cameras().unwrap(), before);

        assert!(registry.delete_camera("A").unwrap());
        assert!(registry.list_cameras().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_id_follows_renames() {
        let registry = Registry::open_in_memory().unwrap();
        let id = registry.insert_camera("A", "a.png", "a.mp4").unwrap();

        let update = CameraUpdate {
            name: "A2".to_string(),
            photo_path: Some("a.png".to_string()),
            video_path: Some("a2.mp4".to_string()),
        };
        registry.update_camera("A", &update).unwrap();

        let camera = registry.find_by_id(id).unwrap().unwrap();
        assert_eq!(camera.name, "A2");
        assert_eq!(camera.video_path, "a2.mp4");

        registry.delete_camera("A2").unwrap();
        assert!(registry.find_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_reopen_file_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cameras.db");

        {
            let registry = Registry::open(&path).unwrap();
            registry.insert_camera("Lot-A", "a.png", "a.mp4").unwrap();
            assert_eq!(registry.path(), path.as_path());
        }

        let registry = Registry::open(&path).unwrap();
        assert_eq!(names(&registry), vec!["Lot-A"]);
    }
}
