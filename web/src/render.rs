//! Text and class names shown by the page views.

use probe_common::media::MediaKind;
use probe_common::RequestRecord;

/// Pretty JSON for the request details panel.
pub fn request_text(record: Option<&RequestRecord>) -> String {
    match record.map(serde_json::to_string_pretty) {
        Some(Ok(json)) => json,
        _ => "Request information not available".to_string(),
    }
}

/// CSS classes for a media status indicator.
pub fn status_class(active: bool) -> &'static str {
    if active {
        "status-indicator status-active"
    } else {
        "status-indicator status-inactive"
    }
}

/// Suggested download name for a recording in `mime`.
pub fn recording_file_name(mime: Option<&str>) -> String {
    let ext = match mime {
        Some(m) if m.starts_with("audio/mp4") => "m4a",
        Some(m) if m.starts_with("audio/webm") => "webm",
        _ => "audio",
    };
    format!("recording.{ext}")
}

/// Mount point of the status indicator for each media kind.
pub fn status_element(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Camera => "cameraStatus",
        MediaKind::Microphone => "micStatus",
    }
}
