//! Request details panel.

use leptos::prelude::*;

use crate::state::ProbeState;

/// Pretty-printed `window.requestInfo`, or a notice when it is missing.
#[component]
pub fn RequestDetails(state: ProbeState) -> impl IntoView {
    move || state.request_details.get()
}
