//! Camera and microphone status, errors, and captured output.

use leptos::prelude::*;
use probe_common::media::MediaKind;

use crate::render::status_class;
use crate::state::ProbeState;

/// Indicator dot plus label for one device.
#[component]
pub fn MediaStatus(state: ProbeState, kind: MediaKind) -> impl IntoView {
    let active = state.media_active(kind);
    view! {
        <span class=move || status_class(active.get())></span>
        {kind.label()}
        {move || if active.get() { " (active)" } else { "" }}
    }
}

/// Last user-facing media error.
#[component]
pub fn MediaMessage(state: ProbeState) -> impl IntoView {
    move || state.media_message.get()
}

#[component]
pub fn PhotoPanel(state: ProbeState) -> impl IntoView {
    move || {
        state.photo.get().map(|photo| {
            let alt = format!("Photo {}x{}", photo.width, photo.height);
            view! { <img class="photo" src=photo.url alt=alt/> }
        })
    }
}

/// Player and download link for the last finished recording.
#[component]
pub fn RecordingPanel(state: ProbeState) -> impl IntoView {
    move || {
        state.recording.get().map(|rec| {
            view! {
                <audio id="recordingPlayback" controls src=rec.url.clone()></audio>
                <a id="downloadRecording" href=rec.url download=rec.file_name>
                    "Download recording"
                </a>
            }
        })
    }
}
