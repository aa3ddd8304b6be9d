/// User interface building blocks
///
/// - `gallery.rs` - thumbnail grid view-model
/// - `playback.rs` - per-window video playback state
/// - `dialogs.rs` - Add / Edit / Delete camera dialogs
/// - `modal.rs` - overlay that blocks the main window behind a dialog
/// - `notify.rs` - native message boxes

pub mod dialogs;
pub mod gallery;
pub mod modal;
pub mod notify;
pub mod playback;
