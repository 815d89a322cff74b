//! Media capture vocabulary: constraint sets, the closed error taxonomy,
//! and recording format selection.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Camera,
    Microphone,
}

impl MediaKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Microphone => "Microphone",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing_mode: FacingMode,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        VideoConstraints {
            ideal_width: 640,
            ideal_height: 480,
            facing_mode: FacingMode::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub sample_rate: u32,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        AudioConstraints {
            echo_cancellation: true,
            noise_suppression: true,
            sample_rate: 44_100,
        }
    }
}

/// What to ask the platform for when opening a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaConstraints {
    Video(VideoConstraints),
    Audio(AudioConstraints),
}

impl MediaConstraints {
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Video(_) => MediaKind::Camera,
            Self::Audio(_) => MediaKind::Microphone,
        }
    }

    /// Constraint dictionary in the shape `getUserMedia` expects.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Video(v) => json!({
                "video": {
                    "width": { "ideal": v.ideal_width },
                    "height": { "ideal": v.ideal_height },
                    "facingMode": v.facing_mode,
                },
                "audio": false,
            }),
            Self::Audio(a) => json!({
                "audio": {
                    "echoCancellation": a.echo_cancellation,
                    "noiseSuppression": a.noise_suppression,
                    "sampleRate": a.sample_rate,
                },
                "video": false,
            }),
        }
    }
}

/// User-facing failure categories for media acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorKind {
    PermissionDenied,
    NotFound,
    Busy,
    ConstraintUnsatisfiable,
    Unsupported,
    InsecureContext,
    Unknown,
}

impl MediaErrorKind {
    /// Map a platform error name (a `DOMException.name`) to a kind. This is
    /// the only place raw names are inspected.
    pub fn from_platform_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => Self::NotFound,
            "NotReadableError" | "TrackStartError" | "AbortError" => Self::Busy,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                Self::ConstraintUnsatisfiable
            }
            "NotSupportedError" | "TypeError" => Self::Unsupported,
            "SecurityError" => Self::InsecureContext,
            _ => Self::Unknown,
        }
    }

    pub fn user_message(&self, media: MediaKind) -> String {
        let device = match media {
            MediaKind::Camera => "camera",
            MediaKind::Microphone => "microphone",
        };
        match self {
            Self::PermissionDenied => {
                format!("Access to the {device} was denied. Allow it in the browser settings.")
            }
            Self::NotFound => format!("No {device} was found on this device."),
            Self::Busy => format!("The {device} is in use by another application."),
            Self::ConstraintUnsatisfiable => {
                format!("The {device} does not support the requested settings.")
            }
            Self::Unsupported => format!("This browser does not support {device} access."),
            Self::InsecureContext => {
                format!("{} access requires HTTPS or localhost.", capitalize(device))
            }
            Self::Unknown => format!("The {device} could not be started."),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A classified acquisition failure plus the platform's own description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({detail})")]
pub struct MediaError {
    pub kind: MediaErrorKind,
    pub media: MediaKind,
    pub message: String,
    /// Raw technical detail as reported by the platform.
    pub detail: String,
}

impl MediaError {
    pub fn new(kind: MediaErrorKind, media: MediaKind, detail: impl Into<String>) -> Self {
        MediaError {
            kind,
            media,
            message: kind.user_message(media),
            detail: detail.into(),
        }
    }

    /// Classify a platform error from its name and message.
    pub fn from_platform(media: MediaKind, name: &str, message: &str) -> Self {
        let detail = if message.is_empty() {
            name.to_string()
        } else {
            format!("{name}: {message}")
        };
        Self::new(MediaErrorKind::from_platform_name(name), media, detail)
    }
}

/// Recording formats in order of preference. When none is supported the
/// recorder's own default is used.
pub const RECORDING_MIME_PREFERENCE: &[&str] =
    &["audio/webm;codecs=opus", "audio/webm", "audio/mp4"];

/// First supported format from [`RECORDING_MIME_PREFERENCE`], or `None`
/// for the platform default.
pub fn choose_recording_mime(is_supported: impl Fn(&str) -> bool) -> Option<&'static str> {
    RECORDING_MIME_PREFERENCE
        .iter()
        .copied()
        .find(|mime| is_supported(mime))
}
