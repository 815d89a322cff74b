//! Reactive state shared by the `Probe` controller and the mounted views.
//!
//! The controller only ever writes signals; the components in
//! [`crate::components`] only read them.

use leptos::prelude::*;
use probe_common::log::LogEntry;
use probe_common::media::MediaKind;
use probe_common::EventLogger;

/// A taken photo, ready to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoView {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A finished recording, ready to play and download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingView {
    pub url: String,
    pub file_name: String,
}

#[derive(Clone, Copy)]
pub struct ProbeState {
    pub logger: RwSignal<EventLogger>,
    pub request_details: RwSignal<String>,
    pub camera_active: RwSignal<bool>,
    pub mic_active: RwSignal<bool>,
    /// Last user-facing media error, empty when there is none.
    pub media_message: RwSignal<String>,
    pub photo: RwSignal<Option<PhotoView>>,
    pub recording: RwSignal<Option<RecordingView>>,
}

impl ProbeState {
    pub fn new(log_cap: usize, request_details: String) -> Self {
        ProbeState {
            logger: RwSignal::new(EventLogger::new(log_cap)),
            request_details: RwSignal::new(request_details),
            camera_active: RwSignal::new(false),
            mic_active: RwSignal::new(false),
            media_message: RwSignal::new(String::new()),
            photo: RwSignal::new(None),
            recording: RwSignal::new(None),
        }
    }

    pub fn media_active(&self, kind: MediaKind) -> RwSignal<bool> {
        match kind {
            MediaKind::Camera => self.camera_active,
            MediaKind::Microphone => self.mic_active,
        }
    }

    /// Log rows keyed by sequence number, newest first. Tracks `logger`.
    pub fn log_rows(&self) -> Vec<(u64, LogEntry)> {
        self.logger.with(|logger| {
            logger
                .log()
                .iter_keyed()
                .map(|(seq, entry)| (seq, entry.clone()))
                .collect()
        })
    }

    /// Append a free-form entry.
    pub fn note(&self, category: &str, details: impl Into<String>) {
        let details = details.into();
        self.logger.update(|logger| logger.note(category, details));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_common::event::ObservedEvent;

    #[test]
    fn test_log_rows_newest_first_with_distinct_keys() {
        let state = ProbeState::new(10, String::new());
        state.note("Camera", "started");
        state.note("Camera", "stopped");

        let rows = state.log_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.details, "stopped");
        assert_ne!(rows[0].0, rows[1].0);
    }

    #[test]
    fn test_sampled_event_leaves_rows_unchanged() {
        let state = ProbeState::new(10, String::new());
        let logged = state
            .logger
            .try_update(|logger| logger.observe(&ObservedEvent::new("mousemove")).is_some());
        assert_eq!(logged, Some(true));
        let logged = state
            .logger
            .try_update(|logger| logger.observe(&ObservedEvent::new("mousemove")).is_some());
        assert_eq!(logged, Some(false));
        assert_eq!(state.log_rows().len(), 1);
    }

    #[test]
    fn test_media_active_by_kind() {
        let state = ProbeState::new(10, String::new());
        state.media_active(MediaKind::Microphone).set(true);
        assert!(state.mic_active.get_untracked());
        assert!(!state.camera_active.get_untracked());
    }
}
