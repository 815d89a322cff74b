//! DOM helpers: element lookup, view mounting, and reading DOM events into
//! [`InputSource`]s.

use leptos::mount::mount_to;
use leptos::prelude::IntoView;
use probe_common::event::{Modifiers, ObservedEvent};
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent,
};

use crate::platform::{self, InputSource};

/// Snapshot the fields this event actually has.
pub fn observe(event: &Event) -> ObservedEvent {
    let target_tag = event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .map(|el| el.tag_name());

    let source = if let Some(kb) = event.dyn_ref::<KeyboardEvent>() {
        InputSource::Keyboard {
            key: kb.key(),
            code: kb.code(),
            modifiers: Modifiers {
                ctrl: kb.ctrl_key(),
                shift: kb.shift_key(),
                alt: kb.alt_key(),
                meta: kb.meta_key(),
            },
        }
    } else if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        InputSource::Pointer {
            position: (f64::from(mouse.client_x()), f64::from(mouse.client_y())),
            button: mouse.button(),
            wheel: event
                .dyn_ref::<WheelEvent>()
                .map(|w| (w.delta_x(), w.delta_y())),
            modifiers: Modifiers {
                ctrl: mouse.ctrl_key(),
                shift: mouse.shift_key(),
                alt: mouse.alt_key(),
                meta: mouse.meta_key(),
            },
        }
    } else if let Some(touch) = event.dyn_ref::<TouchEvent>() {
        let touches = touch.touches();
        InputSource::Touch {
            count: touches.length(),
            first: touches
                .get(0)
                .map(|t| (f64::from(t.client_x()), f64::from(t.client_y()))),
            modifiers: Modifiers {
                ctrl: touch.ctrl_key(),
                shift: touch.shift_key(),
                alt: touch.alt_key(),
                meta: touch.meta_key(),
            },
        }
    } else {
        InputSource::Other
    };

    platform::observed_event(event.type_(), target_tag, source)
}

/// Thin wrapper over the page document; missing elements are skipped.
#[derive(Clone)]
pub struct Page {
    document: Document,
}

impl Page {
    pub fn new(document: Document) -> Self {
        Page { document }
    }

    pub fn element(&self, id: &str) -> Option<Element> {
        let el = self.document.get_element_by_id(id);
        if el.is_none() {
            debug!("no #{id} on this page");
        }
        el
    }

    pub fn element_as<T: JsCast>(&self, id: &str) -> Option<T> {
        self.element(id).and_then(|el| el.dyn_into::<T>().ok())
    }

    /// Mount `view` as the content of `#id` for the rest of the page's life.
    pub fn mount<F, N>(&self, id: &str, view: F)
    where
        F: FnOnce() -> N + 'static,
        N: IntoView,
    {
        if let Some(parent) = self.element_as::<HtmlElement>(id) {
            parent.set_text_content(None);
            mount_to(parent, view).forget();
        }
    }

    pub fn show(&self, id: &str, visible: bool, display: &str) {
        if let Some(el) = self.element_as::<HtmlElement>(id) {
            let value = if visible { display } else { "none" };
            let _ = el.style().set_property("display", value);
        }
    }
}
