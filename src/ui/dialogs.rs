/// Camera management dialogs (Add / Edit / Delete)
///
/// Each dialog is a small state machine that knows nothing about the
/// registry. The app feeds it registry data, asks it for the values to
/// write, and closes it once the write succeeds.
use iced::widget::{button, column, container, pick_list, row, text, text_input, Column};
use iced::{Element, Length};
use std::path::Path;

use crate::error::DialogError;
use crate::state::data::{Camera, CameraUpdate, NewCamera};
use crate::Message;

/// Label shown for a path that has not been chosen
pub const NO_FILE_SELECTED: &str = "No file selected";

#[derive(Debug, Clone)]
pub enum DialogMessage {
    NameChanged(String),
    PickPhoto,
    PickVideo,
    ClearPhoto,
    ClearVideo,
    CameraSelected(String),
    ConfirmSelection,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Add(AddDialog),
    Edit(EditDialog),
    Delete(DeleteDialog),
}

// ========== Add ==========

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddDialog {
    pub name: String,
    pub photo: Option<String>,
    pub video: Option<String>,
}

impl AddDialog {
    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty() && self.photo.is_some() && self.video.is_some()
    }

    /// Values to insert, once a name, a photo and a video are all present
    pub fn submit(&self) -> Result<NewCamera, DialogError> {
        match (&self.photo, &self.video) {
            (Some(photo), Some(video)) if !self.name.trim().is_empty() => Ok(NewCamera {
                name: self.name.trim().to_string(),
                photo_path: photo.clone(),
                video_path: video.clone(),
            }),
            _ => Err(DialogError::EmptySelection),
        }
    }
}

// ========== Edit ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditDialog {
    Selecting {
        names: Vec<String>,
        selected: Option<String>,
    },
    Editing {
        original_name: String,
        name: String,
        photo: Option<String>,
        video: Option<String>,
    },
}

impl EditDialog {
    /// Start with a picker over `names`; refuses to open on an empty registry.
    pub fn open(names: Vec<String>) -> Result<Self, DialogError> {
        if names.is_empty() {
            return Err(DialogError::EmptyRegistry);
        }
        let selected = names.first().cloned();
        Ok(EditDialog::Selecting { names, selected })
    }

    pub fn select(&mut self, name: String) {
        if let EditDialog::Selecting { selected, .. } = self {
            *selected = Some(name);
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            EditDialog::Selecting { selected, .. } => selected.as_deref(),
            EditDialog::Editing { .. } => None,
        }
    }

    /// Move to the editing stage with the camera's current values loaded
    pub fn begin_editing(&mut self, camera: Camera) {
        *self = EditDialog::Editing {
            original_name: camera.name.clone(),
            name: camera.name,
            photo: Some(camera.photo_path).filter(|p| !p.is_empty()),
            video: Some(camera.video_path).filter(|p| !p.is_empty()),
        };
    }

    /// The values to write over the original camera.
    ///
    /// A photo or video left at "no file selected" is written as cleared.
    pub fn save(&self) -> Result<(String, CameraUpdate), DialogError> {
        match self {
            EditDialog::Selecting { .. } => Err(DialogError::EmptySelection),
            EditDialog::Editing {
                original_name,
                name,
                photo,
                video,
            } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(DialogError::EmptyName);
                }
                Ok((
                    original_name.clone(),
                    CameraUpdate {
                        name: name.to_string(),
                        photo_path: photo.clone(),
                        video_path: video.clone(),
                    },
                ))
            }
        }
    }
}

// ========== Delete ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDialog {
    pub names: Vec<String>,
    pub selected: Option<String>,
}

impl DeleteDialog {
    pub fn open(names: Vec<String>) -> Result<Self, DialogError> {
        if names.is_empty() {
            return Err(DialogError::EmptyRegistry);
        }
        let selected = names.first().cloned();
        Ok(DeleteDialog { names, selected })
    }

    pub fn target(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

// ========== Shared ==========

impl Dialog {
    /// Apply the messages that only touch dialog state.
    /// File picking, submission and cancel are handled by the app.
    pub fn update(&mut self, message: DialogMessage) {
        match (self, message) {
            (Dialog::Add(add), DialogMessage::NameChanged(value)) => add.name = value,
            (Dialog::Edit(EditDialog::Editing { name, .. }), DialogMessage::NameChanged(value)) => {
                *name = value
            }
            (Dialog::Edit(EditDialog::Editing { photo, .. }), DialogMessage::ClearPhoto) => *photo = None,
            (Dialog::Edit(EditDialog::Editing { video, .. }), DialogMessage::ClearVideo) => *video = None,
            (Dialog::Edit(edit), DialogMessage::CameraSelected(name)) => edit.select(name),
            (Dialog::Delete(delete), DialogMessage::CameraSelected(name)) => {
                delete.selected = Some(name)
            }
            _ => {}
        }
    }

    /// Store a file chosen in the photo picker
    pub fn set_photo(&mut self, path: String) {
        match self {
            Dialog::Add(add) => add.photo = Some(path),
            Dialog::Edit(EditDialog::Editing { photo, .. }) => *photo = Some(path),
            _ => {}
        }
    }

    /// Store a file chosen in the video picker
    pub fn set_video(&mut self, path: String) {
        match self {
            Dialog::Add(add) => add.video = Some(path),
            Dialog::Edit(EditDialog::Editing { video, .. }) => *video = Some(path),
            _ => {}
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let body: Column<DialogMessage> = match self {
            Dialog::Add(add) => column![
                text("Add camera").size(24),
                text_input("Parking lot name", &add.name).on_input(DialogMessage::NameChanged),
                file_row("Select photo", DialogMessage::PickPhoto, &add.photo, true),
                file_row("Select video", DialogMessage::PickVideo, &add.video, true),
                row![
                    button("Add").on_press_maybe(add.can_submit().then_some(DialogMessage::Submit)),
                    button("Cancel").on_press(DialogMessage::Cancel),
                ]
                .spacing(10),
            ],
            Dialog::Edit(EditDialog::Selecting { names, selected }) => column![
                text("Select camera").size(24),
                text("Choose the camera to edit:"),
                pick_list(names.as_slice(), selected.clone(), DialogMessage::CameraSelected),
                row![
                    button("Next").on_press_maybe(selected.as_ref().map(|_| DialogMessage::ConfirmSelection)),
                    button("Cancel").on_press(DialogMessage::Cancel),
                ]
                .spacing(10),
            ],
            Dialog::Edit(EditDialog::Editing {
                name, photo, video, ..
            }) => column![
                text("Edit camera").size(24),
                text("New camera name:"),
                text_input("Camera name", name).on_input(DialogMessage::NameChanged),
                file_row("Select photo", DialogMessage::PickPhoto, photo, false),
                button("Clear photo").on_press(DialogMessage::ClearPhoto),
                file_row("Select video", DialogMessage::PickVideo, video, false),
                button("Clear video").on_press(DialogMessage::ClearVideo),
                row![
                    button("Save changes").on_press(DialogMessage::Submit),
                    button("Cancel").on_press(DialogMessage::Cancel),
                ]
                .spacing(10),
            ],
            Dialog::Delete(delete) => column![
                text("Delete camera").size(24),
                text("Choose the camera to delete:"),
                pick_list(
                    delete.names.as_slice(),
                    delete.selected.clone(),
                    DialogMessage::CameraSelected
                ),
                row![
                    button("Delete").on_press_maybe(delete.target().map(|_| DialogMessage::Submit)),
                    button("Cancel").on_press(DialogMessage::Cancel),
                ]
                .spacing(10),
            ],
        };

        let content: Element<'_, DialogMessage> = container(body.spacing(12))
            .width(Length::Fixed(420.0))
            .padding(20)
            .style(container::rounded_box)
            .into();

        content.map(Message::Dialog)
    }
}

/// Picker button plus the current selection label
fn file_row<'a>(
    label: &'a str,
    pick: DialogMessage,
    path: &'a Option<String>,
    file_name_only: bool,
) -> Element<'a, DialogMessage> {
    let shown = match path {
        Some(path) if file_name_only => display_name(path),
        Some(path) => path.clone(),
        None => NO_FILE_SELECTED.to_string(),
    };

    column![button(label).on_press(pick), text(shown).size(14)]
        .spacing(4)
        .into()
}

/// Last path component, for compact labels
pub fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}
