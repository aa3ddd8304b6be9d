/// Native message boxes for errors, confirmations and notices
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

pub fn error(text: impl std::fmt::Display) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Error")
        .set_description(text.to_string())
        .set_buttons(MessageButtons::Ok)
        .show();
}

pub fn info(title: &str, text: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title(title)
        .set_description(text)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Yes/No question; anything but "Yes" counts as no
pub fn confirm(title: &str, text: &str) -> bool {
    let answer = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(text)
        .set_buttons(MessageButtons::YesNo)
        .show();

    answer == MessageDialogResult::Yes
}
