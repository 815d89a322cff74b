//! Camera and microphone session controllers.
//!
//! Controllers own at most one platform stream each. The platform side is
//! reached only through [`MediaDevices`] and [`MediaStream`], so the same
//! controllers drive the browser (`probe-web`) and the in-memory fakes used
//! in tests.

use std::io::Cursor;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::media::{
    choose_recording_mime, AudioConstraints, MediaConstraints, MediaError, VideoConstraints,
};

/// Platform entry point for acquiring capture streams.
#[async_trait(?Send)]
pub trait MediaDevices {
    type Stream: MediaStream;

    /// Ask for a stream. Errors must already be classified.
    async fn open(&self, constraints: &MediaConstraints) -> Result<Self::Stream, MediaError>;

    /// Whether the platform recorder can produce `mime`.
    fn supports_recording_type(&self, mime: &str) -> bool;
}

/// An acquired capture stream.
pub trait MediaStream {
    type Chunk: Chunk;

    /// Stop every underlying track. Must be safe to call more than once.
    fn stop_tracks(&mut self);

    /// Number of tracks still holding hardware.
    fn live_tracks(&self) -> usize;

    /// Current video frame, if this stream carries video and a frame is
    /// available.
    fn snapshot(&self) -> Option<Frame> {
        None
    }
}

/// A piece of recorded data. Pieces are concatenated into one object when a
/// recording finishes.
pub trait Chunk: Sized {
    fn byte_len(&self) -> usize;

    /// Join `chunks` in order. The error carries the platform's reason.
    fn concat(chunks: Vec<Self>, mime: Option<&str>) -> Result<Self, String>;
}

impl Chunk for Vec<u8> {
    fn byte_len(&self) -> usize {
        self.len()
    }

    fn concat(chunks: Vec<Self>, _mime: Option<&str>) -> Result<Self, String> {
        Ok(chunks.concat())
    }
}

/// Raw RGBA video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Still image taken from the camera, PNG encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Start the camera first")]
    NoSession,
    #[error("The camera has not delivered a frame yet")]
    FrameNotReady,
    #[error("Cannot encode photo: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("No stopped recording to finish")]
    NotFinished,
    #[error("Cannot assemble recording: {0}")]
    Assemble(String),
}

/// Encode an RGBA frame as PNG.
pub fn encode_png(frame: &Frame) -> Result<Photo, PhotoError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PhotoError::FrameNotReady);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
        .ok_or_else(|| {
            PhotoError::Encode(format!(
                "{} bytes do not fill a {}x{} frame",
                frame.rgba.len(),
                frame.width,
                frame.height
            ))
        })?;

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| PhotoError::Encode(e.to_string()))?;

    Ok(Photo {
        width: frame.width,
        height: frame.height,
        png,
    })
}

// ── camera ───────────────────────────────────────────────────────────────

pub struct CameraController<D: MediaDevices> {
    devices: D,
    constraints: VideoConstraints,
    stream: Option<D::Stream>,
}

impl<D: MediaDevices> CameraController<D> {
    pub fn new(devices: D) -> Self {
        Self::with_constraints(devices, VideoConstraints::default())
    }

    pub fn with_constraints(devices: D, constraints: VideoConstraints) -> Self {
        CameraController {
            devices,
            constraints,
            stream: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream(&self) -> Option<&D::Stream> {
        self.stream.as_ref()
    }

    /// Open the camera. Returns `Ok(false)` if a session is already active;
    /// a running session is only replaced by an explicit stop then start.
    pub async fn start(&mut self) -> Result<bool, MediaError> {
        if self.is_active() {
            debug!("camera already active");
            return Ok(false);
        }
        let constraints = MediaConstraints::Video(self.constraints.clone());
        let stream = self.devices.open(&constraints).await?;
        info!("camera started ({} track(s))", stream.live_tracks());
        self.stream = Some(stream);
        Ok(true)
    }

    /// Release the camera. Returns `false` when nothing was active.
    pub fn stop(&mut self) -> bool {
        match self.stream.as_mut() {
            Some(stream) => {
                stream.stop_tracks();
                self.stream = None;
                info!("camera stopped");
                true
            }
            None => false,
        }
    }

    /// Capture one still from the live stream.
    pub fn take_photo(&self) -> Result<Photo, PhotoError> {
        let stream = self.stream.as_ref().ok_or(PhotoError::NoSession)?;
        let frame = stream.snapshot().ok_or(PhotoError::FrameNotReady)?;
        encode_png(&frame)
    }
}

// ── microphone ───────────────────────────────────────────────────────────

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording<C> {
    /// `None` means the recorder picked its own format.
    pub mime: Option<&'static str>,
    pub chunk_count: usize,
    pub data: C,
}

enum RecorderState<S: MediaStream> {
    Idle,
    Recording {
        stream: S,
        mime: Option<&'static str>,
        chunks: Vec<S::Chunk>,
    },
    /// Tracks released; late chunks from the recorder are still accepted
    /// until [`MicrophoneController::finish`].
    Finishing {
        mime: Option<&'static str>,
        chunks: Vec<S::Chunk>,
    },
}

pub struct MicrophoneController<D: MediaDevices> {
    devices: D,
    constraints: AudioConstraints,
    state: RecorderState<D::Stream>,
}

impl<D: MediaDevices> MicrophoneController<D> {
    pub fn new(devices: D) -> Self {
        Self::with_constraints(devices, AudioConstraints::default())
    }

    pub fn with_constraints(devices: D, constraints: AudioConstraints) -> Self {
        MicrophoneController {
            devices,
            constraints,
            state: RecorderState::Idle,
        }
    }

    /// True while tracks are held.
    pub fn is_active(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    pub fn is_finishing(&self) -> bool {
        matches!(self.state, RecorderState::Finishing { .. })
    }

    /// Format chosen for the current or finishing recording.
    pub fn mime(&self) -> Option<&'static str> {
        match &self.state {
            RecorderState::Recording { mime, .. } | RecorderState::Finishing { mime, .. } => *mime,
            RecorderState::Idle => None,
        }
    }

    pub fn stream_mut(&mut self) -> Option<&mut D::Stream> {
        match &mut self.state {
            RecorderState::Recording { stream, .. } => Some(stream),
            _ => None,
        }
    }

    /// Open the microphone and begin collecting chunks. Returns `Ok(false)`
    /// if already recording.
    pub async fn start_recording(&mut self) -> Result<bool, MediaError> {
        match self.state {
            RecorderState::Recording { .. } => {
                debug!("microphone already recording");
                return Ok(false);
            }
            RecorderState::Finishing { ref chunks, .. } => {
                warn!(
                    "discarding unfinished recording ({} chunk(s))",
                    chunks.len()
                );
                self.state = RecorderState::Idle;
            }
            RecorderState::Idle => {}
        }

        let constraints = MediaConstraints::Audio(self.constraints.clone());
        let stream = self.devices.open(&constraints).await?;
        let mime = choose_recording_mime(|m| self.devices.supports_recording_type(m));
        info!(
            "recording started (format {})",
            mime.unwrap_or("platform default")
        );
        self.state = RecorderState::Recording {
            stream,
            mime,
            chunks: Vec::new(),
        };
        Ok(true)
    }

    /// Accept a chunk from the recorder. Empty chunks and chunks arriving
    /// with no recording in progress are dropped.
    pub fn push_chunk(&mut self, chunk: <D::Stream as MediaStream>::Chunk) -> bool {
        if chunk.byte_len() == 0 {
            return false;
        }
        match &mut self.state {
            RecorderState::Recording { chunks, .. } | RecorderState::Finishing { chunks, .. } => {
                chunks.push(chunk);
                true
            }
            RecorderState::Idle => false,
        }
    }

    /// Release the microphone. Returns `false` when nothing was recording.
    pub fn stop_recording(&mut self) -> bool {
        match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Recording {
                mut stream,
                mime,
                chunks,
            } => {
                stream.stop_tracks();
                self.state = RecorderState::Finishing { mime, chunks };
                info!("recording stopped");
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Concatenate the collected chunks into one recording. Only valid after
    /// [`Self::stop_recording`]. The controller returns to idle even when
    /// assembly fails.
    pub fn finish(
        &mut self,
    ) -> Result<Recording<<D::Stream as MediaStream>::Chunk>, RecordingError> {
        match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Finishing { mime, chunks } => {
                let chunk_count = chunks.len();
                let data = <<D::Stream as MediaStream>::Chunk as Chunk>::concat(chunks, mime)
                    .map_err(|e| {
                        warn!("recording of {chunk_count} chunk(s) not assembled: {e}");
                        RecordingError::Assemble(e)
                    })?;
                Ok(Recording {
                    mime,
                    chunk_count,
                    data,
                })
            }
            other => {
                self.state = other;
                Err(RecordingError::NotFinished)
            }
        }
    }
}
