/// Playback window state for one camera's looping video
///
/// A view owns its decode session. Ticks only reach views with a live
/// session, and dropping the view (window close, app exit) releases it.
use iced::widget::{center, image, text};
use iced::{ContentFit, Element, Length};
use std::path::Path;
use tracing::{debug, error};

use crate::error::MediaError;
use crate::media::video::{Frame, VideoSource};
use crate::Message;

pub struct PlaybackView {
    camera_name: String,
    session: Option<Box<dyn VideoSource>>,
    frame: Option<image::Handle>,
    failure: Option<String>,
}

impl PlaybackView {
    /// Open a decode session with `opener`. Nothing is created if it fails.
    pub fn open<F>(camera_name: &str, video_path: &Path, opener: F) -> Result<Self, MediaError>
    where
        F: FnOnce(&Path) -> Result<Box<dyn VideoSource>, MediaError>,
    {
        let session = opener(video_path)?;
        debug!("▶️  Playback started for '{}'", camera_name);

        Ok(PlaybackView {
            camera_name: camera_name.to_string(),
            session: Some(session),
            frame: None,
            failure: None,
        })
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    /// Whether this view still wants periodic frame pulls
    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Pull and show the next frame, looping at end of stream.
    pub fn tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let next = match session.read_frame() {
            Ok(None) => session.rewind().and_then(|_| session.read_frame()),
            other => other,
        };

        match next {
            Ok(Some(frame)) => self.show(frame),
            Ok(None) => self.stop("video contains no frames".to_string()),
            Err(e) => self.stop(e.to_string()),
        }
    }

    fn show(&mut self, frame: Frame) {
        self.frame = Some(image::Handle::from_rgba(frame.width, frame.height, frame.rgba));
    }

    fn stop(&mut self, reason: String) {
        error!("Playback of '{}' stopped: {}", self.camera_name, reason);
        self.session = None;
        self.failure = Some(reason);
    }

    pub fn view(&self) -> Element<'_, Message> {
        if let Some(reason) = &self.failure {
            return center(text(format!("Playback stopped: {}", reason)).size(18)).into();
        }

        match &self.frame {
            // Scaled to the window, keeping the frame's aspect ratio
            Some(handle) => center(
                image(handle.clone())
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Contain),
            )
            .into(),
            None => center(text("Loading…").size(18)).into(),
        }
    }
}
