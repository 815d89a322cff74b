//! The on-page event log.

use leptos::prelude::*;

use crate::state::ProbeState;

/// Newest-first log rows. Rows are keyed by sequence number, so a new entry
/// adds one row and an eviction removes one.
#[component]
pub fn EventLog(state: ProbeState) -> impl IntoView {
    view! {
        <For
            each=move || state.log_rows()
            key=|(seq, _)| *seq
            children=|(_, entry)| {
                view! {
                    <div class="log-entry">
                        <div class="timestamp">{entry.timestamp}</div>
                        <strong>{entry.category}":"</strong>
                        " "
                        {entry.details}
                    </div>
                }
            }
        />
    }
}
