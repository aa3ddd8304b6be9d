/// Gallery view-model: one thumbnail tile per displayable camera
///
/// The gallery is never patched in place. After every registry change it is
/// rebuilt from a fresh camera list, so the grid always mirrors the store.
use iced::widget::{column, container, image, mouse_area, row, text, tooltip, Column, Row};
use iced::{Alignment, ContentFit, Element, Length};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::GallerySettings;
use crate::error::MediaError;
use crate::media::thumbnail::{self, Thumbnail};
use crate::state::data::Camera;
use crate::Message;

/// Fixed grid geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub spacing: f32,
}

impl From<&GallerySettings> for GridLayout {
    fn from(settings: &GallerySettings) -> Self {
        GridLayout {
            columns: settings.columns,
            thumbnail_width: settings.thumbnail_width,
            thumbnail_height: settings.thumbnail_height,
            spacing: settings.spacing,
        }
    }
}

/// A single clickable thumbnail
#[derive(Debug, Clone)]
pub struct Tile {
    pub camera_id: i64,
    pub name: String,
    pub video_path: String,
    pub handle: image::Handle,
}

/// What the app needs to open a playback window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub camera_name: String,
    pub video_path: String,
}

#[derive(Debug, Clone)]
pub struct Gallery {
    layout: GridLayout,
    tiles: Vec<Tile>,
}

impl Gallery {
    pub fn empty(layout: GridLayout) -> Self {
        Gallery {
            layout,
            tiles: Vec::new(),
        }
    }

    /// Build tiles for every camera whose photo decodes, in registry order.
    /// Cameras without a usable photo are skipped.
    pub fn build<F>(cameras: &[Camera], layout: GridLayout, mut load: F) -> Self
    where
        F: FnMut(&Path, u32, u32) -> Result<Thumbnail, MediaError>,
    {
        let mut tiles = Vec::with_capacity(cameras.len());

        for camera in cameras {
            if !camera.has_photo() {
                debug!("Camera '{}' has no photo, not shown", camera.name);
                continue;
            }

            match load(
                Path::new(&camera.photo_path),
                layout.thumbnail_width,
                layout.thumbnail_height,
            ) {
                Ok(thumb) => tiles.push(Tile {
                    camera_id: camera.id,
                    name: camera.name.clone(),
                    video_path: camera.video_path.clone(),
                    handle: image::Handle::from_rgba(thumb.width, thumb.height, thumb.pixels),
                }),
                Err(e) => warn!("Skipping camera '{}': {}", camera.name, e),
            }
        }

        Gallery { layout, tiles }
    }

    /// Decode thumbnails off the UI thread
    pub async fn load(cameras: Vec<Camera>, layout: GridLayout) -> Self {
        tokio::task::spawn_blocking(move || {
            Gallery::build(&cameras, layout, thumbnail::load_thumbnail)
        })
        .await
        .unwrap_or_else(|e| {
            warn!("Thumbnail task failed: {}", e);
            Gallery::empty(layout)
        })
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tiles grouped into grid rows, `columns` per row
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.layout.columns.max(1))
    }

    /// Resolve a click on a thumbnail. Cameras without a video do nothing.
    pub fn activate(&self, camera_id: i64) -> Option<PlaybackRequest> {
        let tile = self.tiles.iter().find(|t| t.camera_id == camera_id)?;
        if tile.video_path.is_empty() {
            return None;
        }
        Some(PlaybackRequest {
            camera_name: tile.name.clone(),
            video_path: tile.video_path.clone(),
        })
    }

    pub fn view(&self) -> Element<'_, Message> {
        if self.tiles.is_empty() {
            return container(text("No cameras to display").size(16))
                .padding(20)
                .into();
        }

        let width = Length::Fixed(self.layout.thumbnail_width as f32);
        let height = Length::Fixed(self.layout.thumbnail_height as f32);

        let grid: Column<Message> = self
            .rows()
            .fold(column![].spacing(self.layout.spacing), |grid, tiles| {
                let line: Row<Message> = tiles
                    .iter()
                    .fold(row![].spacing(self.layout.spacing), |line, tile| {
                        let picture = container(
                            image(tile.handle.clone()).content_fit(ContentFit::Contain),
                        )
                        .center_x(width)
                        .center_y(height);

                        let clickable = mouse_area(picture)
                            .on_press(Message::ThumbnailActivated(tile.camera_id));

                        line.push(tooltip(
                            clickable,
                            text(tile.name.as_str()),
                            tooltip::Position::Bottom,
                        ))
                    })
                    .align_y(Alignment::Center);
                grid.push(line)
            });

        grid.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage};
    use std::path::PathBuf;

    const LAYOUT: GridLayout = GridLayout {
        columns: 3,
        thumbnail_width: 300,
        thumbnail_height: 200,
        spacing: 10.0,
    };

    fn camera(id: i64, photo: &str, video: &str) -> Camera {
        Camera {
            id,
            name: format!("Lot-{id}"),
            photo_path: photo.to_string(),
            video_path: video.to_string(),
        }
    }

    fn fake_loader(path: &Path, _w: u32, _h: u32) -> Result<Thumbnail, MediaError> {
        if path.to_string_lossy().contains("broken") {
            return Err(MediaError::PhotoDecode {
                path: path.to_path_buf(),
                reason: "bad data".to_string(),
            });
        }
        Ok(Thumbnail {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
        })
    }

    fn ids(gallery: &Gallery) -> Vec<i64> {
        gallery.tiles().iter().map(|t| t.camera_id).collect()
    }

    #[test]
    fn test_skips_missing_and_broken_photos() {
        let cameras = vec![
            camera(1, "a.png", "a.mp4"),
            camera(2, "", "b.mp4"),
            camera(3, "broken.png", "c.mp4"),
            camera(4, "d.png", ""),
        ];

        let gallery = Gallery::build(&cameras, LAYOUT, fake_loader);
        assert_eq!(ids(&gallery), vec![1, 4]);
    }

    #[test]
    fn test_rows_hold_three_tiles() {
        let cameras: Vec<Camera> = (1..=7).map(|id| camera(id, "x.png", "x.mp4")).collect();
        let gallery = Gallery::build(&cameras, LAYOUT, fake_loader);

        let rows: Vec<Vec<i64>> = gallery
            .rows()
            .map(|r| r.iter().map(|t| t.camera_id).collect())
            .collect();
        assert_eq!(rows, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    }

    #[test]
    fn test_activate_requires_video() {
        let cameras = vec![camera(1, "a.png", "a.mp4"), camera(2, "b.png", "")];
        let gallery = Gallery::build(&cameras, LAYOUT, fake_loader);

        assert_eq!(
            gallery.activate(1),
            Some(PlaybackRequest {
                camera_name: "Lot-1".to_string(),
                video_path: "a.mp4".to_string(),
            })
        );
        assert_eq!(gallery.activate(2), None);
        assert_eq!(gallery.activate(99), None);
    }

    #[test]
    fn test_rebuild_after_registry_change_uses_real_files() {
        let dir = tempfile::tempdir().unwrap();
        let photo = |name: &str| -> PathBuf {
            let path = dir.path().join(name);
            RgbImage::from_pixel(40, 20, Rgb([200, 0, 0])).save(&path).unwrap();
            path
        };

        let registry = crate::state::registry::Registry::open_in_memory().unwrap();
        let a = photo("a.png");
        let c = photo("c.jpg");
        registry.insert_camera("A", &a.to_string_lossy(), "a.mp4").unwrap();
        registry
            .insert_camera("B", &dir.path().join("gone.png").to_string_lossy(), "b.mp4")
            .unwrap();
        registry.insert_camera("C", &c.to_string_lossy(), "c.mp4").unwrap();

        let gallery = Gallery::build(&registry.list_cameras().unwrap(), LAYOUT, thumbnail::load_thumbnail);
        assert_eq!(ids(&gallery), vec![1, 3]);

        registry.delete_camera("A").unwrap();
        let gallery = Gallery::build(&registry.list_cameras().unwrap(), LAYOUT, thumbnail::load_thumbnail);
        assert_eq!(ids(&gallery), vec![3]);
    }
}
