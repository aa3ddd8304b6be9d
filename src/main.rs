use iced::widget::{button, column, horizontal_space, row, scrollable, text};
use iced::{time, window, Element, Length, Point, Size, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

mod config;
mod error;
mod logging;
mod media;
mod state;
mod ui;

use config::Settings;
use error::{AppError, RegistryError};
use media::thumbnail;
use media::video::{FfmpegSource, VideoSource};
use state::data::NewCamera;
use state::registry::Registry;
use ui::dialogs::{AddDialog, DeleteDialog, Dialog, DialogMessage, EditDialog};
use ui::gallery::{Gallery, GridLayout, PlaybackRequest};
use ui::notify;
use ui::playback::PlaybackView;

/// Main application state
struct ParkingMonitor {
    settings: Settings,
    /// The camera database
    registry: Registry,
    main_window: window::Id,
    gallery: Gallery,
    /// Bumped on every rebuild; older results are dropped
    gallery_generation: u64,
    /// Open management dialog, shown over the main window
    dialog: Option<Dialog>,
    /// One entry per open playback window
    playback: HashMap<window::Id, PlaybackView>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    WindowOpened(window::Id),
    WindowClosed(window::Id),
    /// Background thumbnail decoding finished
    GalleryLoaded(u64, Gallery),
    /// User clicked a thumbnail
    ThumbnailActivated(i64),
    /// Frame timer of a playback window fired
    PlaybackTick(window::Id),
    OpenAddDialog,
    OpenEditDialog,
    OpenDeleteDialog,
    Dialog(DialogMessage),
}

impl ParkingMonitor {
    fn new(settings: Settings, registry: Registry) -> (Self, Task<Message>) {
        let (main_window, open) = window::open(window::Settings {
            size: Size::new(900.0, 600.0),
            position: window::Position::Specific(Point::new(100.0, 100.0)),
            ..window::Settings::default()
        });

        let layout = GridLayout::from(&settings.gallery);
        let mut app = ParkingMonitor {
            settings,
            registry,
            main_window,
            gallery: Gallery::empty(layout),
            gallery_generation: 0,
            dialog: None,
            playback: HashMap::new(),
        };

        let load = app.refresh_gallery();
        (app, Task::batch([open.map(Message::WindowOpened), load]))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::WindowOpened(id) => {
                debug!("Window {:?} opened", id);
                Task::none()
            }
            Message::WindowClosed(id) if id == self.main_window => {
                // Dropping the views releases every decode session
                self.playback.clear();
                info!("👋 Main window closed, exiting");
                iced::exit()
            }
            Message::WindowClosed(id) => {
                if let Some(view) = self.playback.remove(&id) {
                    info!("⏹️  Closed playback of '{}'", view.camera_name());
                }
                Task::none()
            }
            Message::GalleryLoaded(generation, gallery) => {
                if generation == self.gallery_generation {
                    debug!("Gallery rebuilt with {} thumbnails", gallery.tiles().len());
                    self.gallery = gallery;
                } else {
                    debug!("Dropping stale gallery (generation {})", generation);
                }
                Task::none()
            }
            Message::ThumbnailActivated(camera_id) => self.open_playback(camera_id),
            Message::PlaybackTick(id) => {
                if let Some(view) = self.playback.get_mut(&id) {
                    view.tick();
                }
                Task::none()
            }
            Message::OpenAddDialog => {
                if self.dialog.is_none() {
                    self.dialog = Some(Dialog::Add(AddDialog::default()));
                }
                Task::none()
            }
            Message::OpenEditDialog => {
                let opened = self
                    .registry
                    .camera_names()
                    .map_err(AppError::from)
                    .and_then(|names| EditDialog::open(names).map_err(AppError::from));
                match opened {
                    Ok(edit) => self.dialog = Some(Dialog::Edit(edit)),
                    Err(e) => self.report(e),
                }
                Task::none()
            }
            Message::OpenDeleteDialog => {
                let opened = self
                    .registry
                    .camera_names()
                    .map_err(AppError::from)
                    .and_then(|names| DeleteDialog::open(names).map_err(AppError::from));
                match opened {
                    Ok(delete) => self.dialog = Some(Dialog::Delete(delete)),
                    Err(e) => self.report(e),
                }
                Task::none()
            }
            Message::Dialog(message) => self.update_dialog(message),
        }
    }

    fn update_dialog(&mut self, message: DialogMessage) -> Task<Message> {
        let Some(dialog) = self.dialog.as_mut() else {
            return Task::none();
        };

        match message {
            DialogMessage::Cancel => {
                self.dialog = None;
                Task::none()
            }
            DialogMessage::PickPhoto => {
                if let Some(path) = pick_file("Select image", "Images", &media::PHOTO_EXTENSIONS) {
                    if media::is_photo_path(Path::new(&path)) {
                        dialog.set_photo(path);
                    } else {
                        notify::error(format!("Unsupported image file: {}", path));
                    }
                }
                Task::none()
            }
            DialogMessage::PickVideo => {
                if let Some(path) = pick_file("Select video", "Video", &media::VIDEO_EXTENSIONS) {
                    if media::is_video_path(Path::new(&path)) {
                        dialog.set_video(path);
                    } else {
                        notify::error(format!("Unsupported video file: {}", path));
                    }
                }
                Task::none()
            }
            DialogMessage::ConfirmSelection => self.begin_edit(),
            DialogMessage::Submit => self.submit_dialog(),
            other => {
                dialog.update(other);
                Task::none()
            }
        }
    }

    /// Load the camera picked in the Edit dialog into its form
    fn begin_edit(&mut self) -> Task<Message> {
        let Some(Dialog::Edit(edit)) = self.dialog.as_mut() else {
            return Task::none();
        };
        let Some(name) = edit.selected().map(str::to_string) else {
            return Task::none();
        };

        match self.registry.find_by_name(&name) {
            Ok(Some(camera)) => {
                edit.begin_editing(camera);
                Task::none()
            }
            Ok(None) => {
                self.dialog = None;
                self.report(RegistryError::NotFound(name));
                self.refresh_gallery()
            }
            Err(e) => {
                self.report(e);
                Task::none()
            }
        }
    }

    fn submit_dialog(&mut self) -> Task<Message> {
        let Some(dialog) = self.dialog.clone() else {
            return Task::none();
        };

        let result = match &dialog {
            Dialog::Add(add) => self.submit_add(add),
            Dialog::Edit(edit) => self.submit_edit(edit),
            Dialog::Delete(delete) => self.submit_delete(delete),
        };

        match result {
            Ok(true) => {
                self.dialog = None;
                self.refresh_gallery()
            }
            // Still editing (missing fields or declined confirmation)
            Ok(false) => Task::none(),
            // Dialog stays open so the user can correct the input
            Err(e) => {
                self.report(e);
                Task::none()
            }
        }
    }

    fn submit_add(&self, add: &AddDialog) -> Result<bool, AppError> {
        let Ok(camera) = add.submit() else {
            return Ok(false);
        };

        let layout = GridLayout::from(&self.settings.gallery);
        add_camera(&self.registry, &layout, &camera)?;
        Ok(true)
    }

    fn submit_edit(&self, edit: &EditDialog) -> Result<bool, AppError> {
        let (original_name, update) = edit.save()?;
        self.registry.update_camera(&original_name, &update)?;
        notify::info("Success", "Camera updated.");
        Ok(true)
    }

    fn submit_delete(&self, delete: &DeleteDialog) -> Result<bool, AppError> {
        let Some(name) = delete.target() else {
            return Ok(false);
        };

        let question = format!("Are you sure you want to delete camera '{}'?", name);
        if !notify::confirm("Confirm", &question) {
            return Ok(false);
        }

        self.registry.delete_camera(name)?;
        Ok(true)
    }

    /// Open a playback window for the clicked camera
    fn open_playback(&mut self, camera_id: i64) -> Task<Message> {
        let request = match resolve_playback(&self.registry, &self.gallery, camera_id) {
            Ok(Some(request)) => request,
            Ok(None) => return Task::none(),
            Err(e) => {
                self.report(e);
                return Task::none();
            }
        };

        let ffmpeg = self.settings.playback.ffmpeg_path.clone();
        let opened = PlaybackView::open(&request.camera_name, Path::new(&request.video_path), |path| {
            FfmpegSource::open(&ffmpeg, path).map(|source| Box::new(source) as Box<dyn VideoSource>)
        });

        match opened {
            Ok(view) => {
                let (id, open) = window::open(window::Settings::default());
                self.playback.insert(id, view);
                Task::batch([open.map(Message::WindowOpened), window::maximize(id, true)])
            }
            Err(e) => {
                self.report(e);
                Task::none()
            }
        }
    }

    /// Rebuild the gallery wholesale from the registry
    fn refresh_gallery(&mut self) -> Task<Message> {
        self.gallery_generation += 1;
        let generation = self.gallery_generation;

        match self.registry.list_cameras() {
            Ok(cameras) => {
                let layout = GridLayout::from(&self.settings.gallery);
                Task::perform(Gallery::load(cameras, layout), move |gallery| {
                    Message::GalleryLoaded(generation, gallery)
                })
            }
            Err(e) => {
                self.report(e);
                Task::none()
            }
        }
    }

    /// Log a failed operation and tell the user about it
    fn report(&self, err: impl Into<AppError>) {
        let err = err.into();
        warn!("{}", err);
        notify::error(&err);
    }

    fn subscription(&self) -> Subscription<Message> {
        let interval = self.settings.frame_interval();

        let ticks = self
            .playback
            .iter()
            .filter(|(_, view)| view.is_playing())
            .map(|(id, _)| {
                time::every(interval)
                    .with(*id)
                    .map(|(id, _)| Message::PlaybackTick(id))
            });

        Subscription::batch(ticks.chain([
            window::close_events().map(Message::WindowClosed),
        ]))
    }

    /// Build the user interface for one window
    fn view(&self, id: window::Id) -> Element<'_, Message> {
        if id == self.main_window {
            return self.main_view();
        }

        match self.playback.get(&id) {
            Some(view) => view.view(),
            None => horizontal_space().into(),
        }
    }

    fn main_view(&self) -> Element<'_, Message> {
        let controls = column![
            button(text("Add camera"))
                .width(Length::Fixed(150.0))
                .on_press(Message::OpenAddDialog),
            button(text("Edit camera"))
                .width(Length::Fixed(150.0))
                .on_press(Message::OpenEditDialog),
            button(text("Delete camera"))
                .width(Length::Fixed(150.0))
                .on_press(Message::OpenDeleteDialog),
        ]
        .spacing(10);

        let content = row![
            controls,
            scrollable(self.gallery.view())
                .width(Length::Fill)
                .height(Length::Fill),
        ]
        .spacing(20)
        .padding(20);

        match &self.dialog {
            Some(dialog) => ui::modal::modal(content, dialog.view()),
            None => content.into(),
        }
    }

    fn title(&self, id: window::Id) -> String {
        match self.playback.get(&id) {
            Some(view) => format!("Camera: {}", view.camera_name()),
            None => "Parking Monitor".to_string(),
        }
    }

    /// Set the application theme
    fn theme(&self, _id: window::Id) -> Theme {
        Theme::Dark
    }
}

/// Insert a camera from the Add dialog.
///
/// The photo must decode first; an unreadable photo would never show up in
/// the gallery, so nothing is written for it.
fn add_camera(registry: &Registry, layout: &GridLayout, camera: &NewCamera) -> Result<i64, AppError> {
    thumbnail::load_thumbnail(
        Path::new(&camera.photo_path),
        layout.thumbnail_width,
        layout.thumbnail_height,
    )?;

    let id = registry.insert_camera(&camera.name, &camera.photo_path, &camera.video_path)?;
    Ok(id)
}

/// Turn a thumbnail click into a playback request.
///
/// The shown gallery can lag behind an Edit or Delete until its rebuild
/// lands, so the camera is read back from the registry.
fn resolve_playback(
    registry: &Registry,
    gallery: &Gallery,
    camera_id: i64,
) -> Result<Option<PlaybackRequest>, RegistryError> {
    if gallery.activate(camera_id).is_none() {
        return Ok(None);
    }

    let request = registry
        .find_by_id(camera_id)?
        .filter(|camera| !camera.video_path.is_empty())
        .map(|camera| PlaybackRequest {
            camera_name: camera.name,
            video_path: camera.video_path,
        });
    Ok(request)
}

/// Native file picker limited to `extensions`
fn pick_file(title: &str, filter_name: &str, extensions: &[&str]) -> Option<String> {
    FileDialog::new()
        .set_title(title)
        .add_filter(filter_name, extensions)
        .pick_file()
        .map(|path| path.to_string_lossy().to_string())
}

fn main() -> Result<(), AppError> {
    let settings = Settings::load()?;
    logging::init(&settings.logging.level);

    let registry = Registry::open(&settings.registry.db_path)?;
    info!(
        "🅿️  Parking monitor initialized with {} cameras from {}",
        registry.camera_count()?,
        registry.path().display()
    );

    iced::daemon(ParkingMonitor::title, ParkingMonitor::update, ParkingMonitor::view)
        .subscription(ParkingMonitor::subscription)
        .theme(ParkingMonitor::theme)
        .run_with(move || ParkingMonitor::new(settings, registry))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::MediaError;

    const LAYOUT: GridLayout = GridLayout {
        columns: 3,
        thumbnail_width: 300,
        thumbnail_height: 200,
        spacing: 10.0,
    };

    fn new_camera(name: &str, photo: &Path) -> NewCamera {
        NewCamera {
            name: name.to_string(),
            photo_path: photo.to_string_lossy().to_string(),
            video_path: "feed.mp4".to_string(),
        }
    }

    fn gallery_for(registry: &Registry) -> Gallery {
        let cameras = registry.list_cameras().unwrap();
        Gallery::build(&cameras, LAYOUT, |_, _, _| {
            Ok(media::thumbnail::Thumbnail {
                width: 1,
                height: 1,
                pixels: vec![0, 0, 0, 255],
            })
        })
    }

    #[test]
    fn test_stale_tile_does_not_play_deleted_camera() {
        let registry = Registry::open_in_memory().unwrap();
        let id = registry.insert_camera("Lot-A", "a.png", "a.mp4").unwrap();
        let shown = gallery_for(&registry);

        registry.delete_camera("Lot-A").unwrap();

        assert_eq!(resolve_playback(&registry, &shown, id).unwrap(), None);
    }

    #[test]
    fn test_stale_tile_plays_edited_values() {
        let registry = Registry::open_in_memory().unwrap();
        let id = registry.insert_camera("Lot-A", "a.png", "a.mp4").unwrap();
        let shown = gallery_for(&registry);

        let update = state::data::CameraUpdate {
            name: "Lot-B".to_string(),
            photo_path: Some("a.png".to_string()),
            video_path: Some("b.mp4".to_string()),
        };
        registry.update_camera("Lot-A", &update).unwrap();

        assert_eq!(
            resolve_playback(&registry, &shown, id).unwrap(),
            Some(PlaybackRequest {
                camera_name: "Lot-B".to_string(),
                video_path: "b.mp4".to_string(),
            })
        );
    }

    #[test]
    fn test_add_rejects_undecodable_photo() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("lot.png");
        std::fs::write(&photo, b"definitely not a png").unwrap();
        let registry = Registry::open_in_memory().unwrap();

        let err = add_camera(&registry, &LAYOUT, &new_camera("Lot-A", &photo)).unwrap_err();

        assert!(matches!(err, AppError::Media(MediaError::PhotoDecode { .. })));
        assert_eq!(registry.camera_count().unwrap(), 0);
    }

    #[test]
    fn test_add_duplicate_name_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("lot.png");
        ::image::RgbImage::new(4, 2).save(&photo).unwrap();
        let registry = Registry::open_in_memory().unwrap();

        let id = add_camera(&registry, &LAYOUT, &new_camera("Lot-A", &photo)).unwrap();
        assert_eq!(id, 1);

        let err = add_camera(&registry, &LAYOUT, &new_camera("Lot-A", &photo)).unwrap_err();
        assert!(matches!(err, AppError::Registry(RegistryError::DuplicateName(_))));
        assert_eq!(registry.camera_count().unwrap(), 1);
    }
}
