//! Event catalog and the platform-neutral event snapshot.
//!
//! The browser client converts each DOM event into an [`ObservedEvent`];
//! everything after that (sampling, formatting, logging) happens here.

use serde::{Deserialize, Serialize};

/// Catalog group an event type belongs to. The group decides the log
/// category shown next to each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventGroup {
    Keyboard,
    Mouse,
    Touch,
    Pointer,
    Focus,
    Form,
    Window,
    Drag,
    Media,
    Device,
    Visibility,
    Connectivity,
    Storage,
    Message,
    /// Hardware/vendor specific names; registered best-effort.
    Vendor,
    /// Types learned at runtime through [`crate::registry::EventRegistry::register`].
    Discovered,
}

impl EventGroup {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Keyboard => "Keyboard",
            Self::Mouse => "Mouse",
            Self::Touch => "Touch",
            Self::Pointer => "Pointer",
            Self::Focus => "Focus",
            Self::Form => "Form",
            Self::Window => "Window",
            Self::Drag => "Drag",
            Self::Media => "Media",
            Self::Device => "Device",
            Self::Visibility => "Visibility",
            Self::Connectivity => "Connectivity",
            Self::Storage => "Storage",
            Self::Message => "Message",
            Self::Vendor => "Hardware",
            Self::Discovered => "Discovered",
        }
    }
}

impl std::fmt::Display for EventGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.category())
    }
}

/// Every Kth occurrence of a high-frequency type is logged.
pub const HIGH_FREQUENCY_SAMPLE: u32 = 30;

/// Types that fire continuously while the user moves, scrolls or holds the
/// device. These are sampled instead of logged on every dispatch.
pub const HIGH_FREQUENCY_TYPES: &[&str] = &[
    "mousemove",
    "pointermove",
    "pointerrawupdate",
    "scroll",
    "touchmove",
    "devicemotion",
    "deviceorientation",
];

/// The fixed catalog attached when capturing starts.
pub const CATALOG: &[(&str, EventGroup)] = &[
    ("keydown", EventGroup::Keyboard),
    ("keyup", EventGroup::Keyboard),
    ("keypress", EventGroup::Keyboard),
    ("click", EventGroup::Mouse),
    ("dblclick", EventGroup::Mouse),
    ("contextmenu", EventGroup::Mouse),
    ("mousedown", EventGroup::Mouse),
    ("mouseup", EventGroup::Mouse),
    ("mousemove", EventGroup::Mouse),
    ("wheel", EventGroup::Mouse),
    ("touchstart", EventGroup::Touch),
    ("touchmove", EventGroup::Touch),
    ("touchend", EventGroup::Touch),
    ("touchcancel", EventGroup::Touch),
    ("pointerdown", EventGroup::Pointer),
    ("pointerup", EventGroup::Pointer),
    ("pointermove", EventGroup::Pointer),
    ("pointercancel", EventGroup::Pointer),
    ("pointerrawupdate", EventGroup::Pointer),
    ("focus", EventGroup::Focus),
    ("blur", EventGroup::Focus),
    ("focusin", EventGroup::Focus),
    ("focusout", EventGroup::Focus),
    ("input", EventGroup::Form),
    ("change", EventGroup::Form),
    ("submit", EventGroup::Form),
    ("reset", EventGroup::Form),
    ("resize", EventGroup::Window),
    ("scroll", EventGroup::Window),
    ("beforeunload", EventGroup::Window),
    ("hashchange", EventGroup::Window),
    ("popstate", EventGroup::Window),
    ("dragstart", EventGroup::Drag),
    ("drag", EventGroup::Drag),
    ("dragend", EventGroup::Drag),
    ("dragover", EventGroup::Drag),
    ("drop", EventGroup::Drag),
    ("play", EventGroup::Media),
    ("pause", EventGroup::Media),
    ("ended", EventGroup::Media),
    ("volumechange", EventGroup::Media),
    ("devicemotion", EventGroup::Device),
    ("deviceorientation", EventGroup::Device),
    ("orientationchange", EventGroup::Device),
    ("visibilitychange", EventGroup::Visibility),
    ("pageshow", EventGroup::Visibility),
    ("pagehide", EventGroup::Visibility),
    ("online", EventGroup::Connectivity),
    ("offline", EventGroup::Connectivity),
    ("storage", EventGroup::Storage),
    ("message", EventGroup::Message),
    ("sideClick", EventGroup::Vendor),
    ("longPressStart", EventGroup::Vendor),
    ("longPressEnd", EventGroup::Vendor),
    ("scrollUp", EventGroup::Vendor),
    ("scrollDown", EventGroup::Vendor),
];

pub fn is_high_frequency(event_type: &str) -> bool {
    HIGH_FREQUENCY_TYPES.contains(&event_type)
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.ctrl || self.shift || self.alt || self.meta
    }

    fn describe(&self) -> String {
        let names = [
            (self.ctrl, "Ctrl"),
            (self.shift, "Shift"),
            (self.alt, "Alt"),
            (self.meta, "Meta"),
        ];
        names
            .iter()
            .filter(|(held, _)| *held)
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Platform-neutral snapshot of one dispatched event. Only the fields the
/// source event actually carries are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedEvent {
    pub event_type: String,
    pub key: Option<String>,
    pub code: Option<String>,
    /// Client-area coordinates.
    pub position: Option<(f64, f64)>,
    pub button: Option<i16>,
    /// Wheel delta (x, y).
    pub delta: Option<(f64, f64)>,
    pub touch_count: Option<u32>,
    pub target_tag: Option<String>,
    pub modifiers: Option<Modifiers>,
}

impl ObservedEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        ObservedEvent {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// One-line description: the type followed by every present field.
    pub fn details(&self) -> String {
        let mut parts = vec![self.event_type.clone()];

        if let Some(key) = &self.key {
            parts.push(format!("Key: {key}"));
        }
        if let Some(code) = &self.code {
            parts.push(format!("Code: {code}"));
        }
        if let Some((x, y)) = self.position {
            parts.push(format!("Pos: ({x}, {y})"));
        }
        if let Some(button) = self.button {
            parts.push(format!("Button: {button}"));
        }
        if let Some((dx, dy)) = self.delta {
            parts.push(format!("Delta: ({dx}, {dy})"));
        }
        if let Some(n) = self.touch_count {
            parts.push(format!("Touches: {n}"));
        }
        if let Some(tag) = &self.target_tag {
            parts.push(format!("Target: {tag}"));
        }
        if let Some(mods) = self.modifiers.filter(Modifiers::any) {
            parts.push(format!("Mods: {}", mods.describe()));
        }

        parts.join(" | ")
    }
}
