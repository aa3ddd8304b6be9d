/// Frame-by-frame video decoding for the playback window
///
/// Decoding is delegated to an `ffmpeg` subprocess that writes raw RGB24
/// frames to its stdout. A session owns that process for as long as it
/// lives; dropping the session kills and reaps it.
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::error::MediaError;

/// One decoded video frame (RGBA8, row-major)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Frame {
    /// Expand packed RGB24 data into RGBA with an opaque alpha channel
    pub fn from_rgb24(width: u32, height: u32, rgb: &[u8]) -> Self {
        let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
        for px in rgb.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        Frame { width, height, rgba }
    }
}

/// An open decode session.
///
/// Releasing the session is `Drop`; implementors must free every decoder
/// resource there.
pub trait VideoSource {
    /// Next frame, or `None` at end of stream
    fn read_frame(&mut self) -> Result<Option<Frame>, MediaError>;

    /// Seek back to the first frame
    fn rewind(&mut self) -> Result<(), MediaError>;
}

/// ffmpeg-backed decode session
pub struct FfmpegSource {
    ffmpeg: PathBuf,
    path: PathBuf,
    child: FfmpegChild,
    events: FfmpegIterator,
    /// First frame pulled while probing the stream in `open`
    pending: Option<Frame>,
    /// Frames decoded since the decoder was last (re)started
    frames_decoded: u64,
}

impl FfmpegSource {
    /// Start decoding `path` with the ffmpeg binary at `ffmpeg`.
    ///
    /// The first frame is decoded eagerly so that unreadable files fail here
    /// instead of on the first tick.
    pub fn open(ffmpeg: &Path, path: &Path) -> Result<Self, MediaError> {
        if !path.is_file() {
            return Err(MediaError::VideoOpen {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }

        let (child, events) = spawn_decoder(ffmpeg, path)?;
        let mut source = FfmpegSource {
            ffmpeg: ffmpeg.to_path_buf(),
            path: path.to_path_buf(),
            child,
            events,
            pending: None,
            frames_decoded: 0,
        };

        match source.next_frame() {
            Ok(Some(frame)) => {
                debug!(
                    "🎬 Opened {} ({}x{})",
                    source.path.display(),
                    frame.width,
                    frame.height
                );
                source.pending = Some(frame);
                Ok(source)
            }
            Ok(None) => Err(MediaError::VideoOpen {
                path: path.to_path_buf(),
                reason: "no decodable video frames".to_string(),
            }),
            Err(MediaError::VideoDecode { reason, .. }) => Err(MediaError::VideoOpen {
                path: path.to_path_buf(),
                reason,
            }),
            Err(other) => Err(other),
        }
    }

    /// Pull events until the next frame or the end of the stream
    fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        let mut last_error = None;

        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    trace!("frame {} of {}", frame.frame_num, self.path.display());
                    self.frames_decoded += 1;
                    return Ok(Some(Frame::from_rgb24(frame.width, frame.height, &frame.data)));
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, msg) | FfmpegEvent::Error(msg) => {
                    debug!("ffmpeg: {}", msg);
                    last_error = Some(msg);
                }
                FfmpegEvent::Done => break,
                _ => {}
            }
        }

        end_of_stream(&self.path, self.frames_decoded, last_error)
    }

    fn stop_decoder(&mut self) {
        if let Err(e) = self.child.kill() {
            trace!("ffmpeg already exited: {}", e);
        }
        if let Err(e) = self.child.wait() {
            warn!("Failed to reap ffmpeg for {}: {}", self.path.display(), e);
        }
    }
}

impl VideoSource for FfmpegSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        self.next_frame()
    }

    fn rewind(&mut self) -> Result<(), MediaError> {
        self.stop_decoder();
        self.pending = None;
        self.frames_decoded = 0;

        let (child, events) = spawn_decoder(&self.ffmpeg, &self.path)?;
        self.child = child;
        self.events = events;
        debug!("🔁 Looping {}", self.path.display());
        Ok(())
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop_decoder();
        debug!("Released decode session for {}", self.path.display());
    }
}

/// Decide what the end of a decoder run means.
///
/// Only a run that produced no frame at all is a decode failure. Errors
/// logged after real frames (truncated recordings) still count as end of
/// stream so playback can loop.
fn end_of_stream(
    path: &Path,
    frames_decoded: u64,
    last_error: Option<String>,
) -> Result<Option<Frame>, MediaError> {
    match last_error {
        Some(reason) if frames_decoded == 0 => Err(MediaError::VideoDecode {
            path: path.to_path_buf(),
            reason,
        }),
        Some(reason) => {
            warn!(
                "{} ended after {} frames with: {}",
                path.display(),
                frames_decoded,
                reason
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

fn spawn_decoder(ffmpeg: &Path, path: &Path) -> Result<(FfmpegChild, FfmpegIterator), MediaError> {
    let open_error = |reason: String| MediaError::VideoOpen {
        path: path.to_path_buf(),
        reason,
    };

    let mut child = FfmpegCommand::new_with_path(ffmpeg)
        .hide_banner()
        .input(path)
        .args(["-an"])
        .rawvideo()
        .spawn()
        .map_err(|e| open_error(format!("could not start {}: {}", ffmpeg.display(), e)))?;

    match child.iter() {
        Ok(events) => Ok((child, events)),
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            Err(open_error(e.to_string()))
        }
    }
}

/// Shell script standing in for ffmpeg: prints the stream metadata the
/// event parser needs, writes `frames` 2x1 rgb24 frames to stdout, then
/// logs `trailing_error` (if any) on stderr.
#[cfg(all(test, unix))]
pub(crate) fn write_fake_decoder(
    dir: &Path,
    frames: usize,
    trailing_error: Option<&str>,
) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let mut script = String::from(
        "#!/bin/sh\n\
         echo \"[info] Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'feed.mp4':\" >&2\n\
         echo \"[info]   Stream #0:0: Video: h264, yuv420p, 2x1, 25 fps, 25 tbr, 25 tbn\" >&2\n\
         echo \"[info] Stream mapping:\" >&2\n\
         echo \"[info]   Stream #0:0 -> #0:0 (h264 (native) -> rawvideo (native))\" >&2\n\
         echo \"[info] Output #0, rawvideo, to 'pipe:':\" >&2\n\
         echo \"[info]   Stream #0:0: Video: rawvideo (RGB[24] / 0x18424752), rgb24(progressive), 2x1, q=2-31, 1 kb/s, 25 fps, 25 tbn\" >&2\n",
    );
    for _ in 0..frames {
        script.push_str("printf '\\001\\002\\003\\004\\005\\006'\n");
    }
    if let Some(message) = trailing_error {
        script.push_str(&format!("echo \"[error] {}\" >&2\n", message));
    }

    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
