//! The page controller exported to JavaScript.
//!
//! ```js
//! import init, { Probe } from "/static/pkg/probe_web.js";
//! await init({ module_or_path: "/static/pkg/probe_web.wasm" });
//! window.probe = new Probe();
//! ```
//!
//! A `Probe` owns both media controllers and a [`ProbeState`]. Creating it
//! mounts the views, then attaches the capture-phase listeners; listeners
//! stay attached for the lifetime of the page, and `pagehide` releases any
//! open media.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Promise, Reflect};
use leptos::prelude::*;
use probe_common::media::{MediaError, MediaKind};
use probe_common::message::InboundMessage;
use probe_common::session::{CameraController, Chunk, MicrophoneController, Photo};
use probe_common::settings::ClientSettings;
use probe_common::RequestRecord;
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{
    AddEventListenerOptions, Blob, BlobEvent, BlobPropertyBag, Event, HtmlVideoElement,
    MediaRecorder, MediaRecorderOptions, MessageEvent, Url, Window,
};

use crate::components::event_log::EventLog;
use crate::components::media::{MediaMessage, MediaStatus, PhotoPanel, RecordingPanel};
use crate::components::request_details::RequestDetails;
use crate::console;
use crate::devices::{BlobChunk, RecorderCallback, RecorderHooks, WebDevices};
use crate::dom::{self, Page};
use crate::recorder::HookSlot;
use crate::render;
use crate::state::{PhotoView, ProbeState, RecordingView};

/// Longest message payload shown in the log.
const MESSAGE_PREVIEW_CHARS: usize = 200;

/// `MediaRecorder` timeslice in milliseconds.
const RECORDER_TIMESLICE_MS: i32 = 1000;

type Listener = Closure<dyn FnMut(Event)>;

struct Inner {
    window: Window,
    page: Page,
    settings: ClientSettings,
    state: ProbeState,
    camera: RefCell<CameraController<WebDevices>>,
    microphone: RefCell<MicrophoneController<WebDevices>>,
    listener: RefCell<Option<Listener>>,
    recorder_hooks: RefCell<HookSlot<RecorderHooks>>,
    photo_url: RefCell<Option<String>>,
    recording_url: RefCell<Option<String>>,
}

#[wasm_bindgen]
pub struct Probe {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl Probe {
    /// Read `window.requestInfo`, mount the views, and start capturing events.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Probe, JsValue> {
        console_error_panic_hook::set_once();

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let (raw_info, record) = read_request_info(&window);
        let settings = record
            .as_ref()
            .map(ClientSettings::from_request)
            .unwrap_or_default();
        console::init_tracing(settings.debug);

        let details = match (&record, raw_info) {
            (Some(_), _) | (None, None) => render::request_text(record.as_ref()),
            (None, Some(raw)) => raw,
        };
        let state = ProbeState::new(settings.log_cap, details);

        let page = Page::new(document);
        mount_views(&page, state);

        let preview = page.element_as::<HtmlVideoElement>("video");
        let inner = Rc::new(Inner {
            camera: RefCell::new(CameraController::new(WebDevices::camera(
                window.clone(),
                preview,
            ))),
            microphone: RefCell::new(MicrophoneController::new(WebDevices::microphone(
                window.clone(),
            ))),
            listener: RefCell::new(None),
            recorder_hooks: RefCell::new(HookSlot::new()),
            photo_url: RefCell::new(None),
            recording_url: RefCell::new(None),
            window,
            page,
            settings,
            state,
        });

        inner.attach_listeners();
        inner.log_features();
        info!(
            "Probe ready (log cap {}, debug {})",
            settings.log_cap, settings.debug
        );
        Ok(Probe { inner })
    }

    #[wasm_bindgen(js_name = startCamera)]
    pub fn start_camera(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.start_camera().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = stopCamera)]
    pub fn stop_camera(&self) {
        self.inner.stop_camera();
    }

    #[wasm_bindgen(js_name = takePhoto)]
    pub fn take_photo(&self) {
        self.inner.take_photo();
    }

    #[wasm_bindgen(js_name = startRecording)]
    pub fn start_recording(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.start_recording().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = stopRecording)]
    pub fn stop_recording(&self) {
        self.inner.stop_recording();
    }

    #[wasm_bindgen(js_name = clearEventLog)]
    pub fn clear_event_log(&self) {
        self.inner.state.logger.update(|logger| logger.clear());
    }

    /// Listen for an event type outside the catalog. Returns `false` if it
    /// was already registered.
    #[wasm_bindgen(js_name = registerEventType)]
    pub fn register_event_type(&self, name: &str) -> bool {
        self.inner.register(name)
    }

    /// Free-form log entry, e.g. tab navigation from the page script.
    pub fn note(&self, category: &str, details: &str) {
        self.inner.state.note(category, details);
    }

    /// Release camera and microphone.
    pub fn shutdown(&self) {
        self.inner.release_media();
    }
}

/// Mount each view into its placeholder on the page.
fn mount_views(page: &Page, state: ProbeState) {
    page.mount("requestDetails", move || view! { <RequestDetails state=state/> });
    page.mount("eventLog", move || view! { <EventLog state=state/> });
    for kind in [MediaKind::Camera, MediaKind::Microphone] {
        page.mount(render::status_element(kind), move || {
            view! { <MediaStatus state=state kind=kind/> }
        });
    }
    page.mount("mediaMessage", move || view! { <MediaMessage state=state/> });
    page.mount("photoContainer", move || view! { <PhotoPanel state=state/> });
    page.mount("recordingOutput", move || view! { <RecordingPanel state=state/> });
}

/// `window.requestInfo` as raw JSON text and, when it parses, as a record.
fn read_request_info(window: &Window) -> (Option<String>, Option<RequestRecord>) {
    let value = match Reflect::get(window, &"requestInfo".into()) {
        Ok(v) if !v.is_undefined() && !v.is_null() => v,
        _ => return (None, None),
    };
    let raw = js_sys::JSON::stringify_with_replacer_and_space(
        &value,
        &JsValue::NULL,
        &JsValue::from(2),
    )
    .ok()
    .and_then(|s| s.as_string());

    let record = raw.as_deref().and_then(|text| {
        serde_json::from_str::<RequestRecord>(text)
            .map_err(|e| warn!("window.requestInfo is not a request record: {e}"))
            .ok()
    });
    (raw, record)
}

fn capture_options() -> AddEventListenerOptions {
    let options = AddEventListenerOptions::new();
    options.set_capture(true);
    options.set_passive(true);
    options
}

impl Inner {
    fn attach_listeners(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let listener: Listener = Closure::new(move |event: Event| {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch(&event);
            }
        });

        let options = capture_options();
        let callback: &js_sys::Function = listener.as_ref().unchecked_ref();
        self.state.logger.update(|logger| {
            logger.start_capturing(|name| {
                self.window
                    .add_event_listener_with_callback_and_add_event_listener_options(
                        name, callback, &options,
                    )
            });
        });
        *self.listener.borrow_mut() = Some(listener);
    }

    fn register(&self, name: &str) -> bool {
        let added = self
            .state
            .logger
            .try_maybe_update(|logger| {
                let added = logger.discover(name);
                (added, added)
            })
            .unwrap_or(false);
        if !added {
            return false;
        }

        if let Some(listener) = self.listener.borrow().as_ref() {
            if let Err(e) = self
                .window
                .add_event_listener_with_callback_and_add_event_listener_options(
                    name,
                    listener.as_ref().unchecked_ref(),
                    &capture_options(),
                )
            {
                debug!("listener for {name} not attached: {e:?}");
            }
        }
        true
    }

    fn dispatch(&self, event: &Event) {
        if let Some(msg) = event.dyn_ref::<MessageEvent>() {
            self.handle_message(msg);
        } else {
            let observed = dom::observe(event);
            // Only a written entry notifies the views.
            self.state.logger.maybe_update(|logger| logger.observe(&observed).is_some());
        }

        if event.type_() == "pagehide" {
            self.release_media();
        }
    }

    fn handle_message(&self, msg: &MessageEvent) {
        let data = msg.data();
        let raw = if let Some(s) = data.as_string() {
            s
        } else if data.is_undefined() {
            "undefined".to_string()
        } else {
            js_sys::JSON::stringify(&data)
                .ok()
                .and_then(|s| s.as_string())
                .unwrap_or_else(|| "[unserializable]".to_string())
        };

        let parsed = InboundMessage::parse(&raw);
        let origin = msg.origin();
        let origin = if origin.is_empty() { "(unknown origin)".to_string() } else { origin };
        self.state.note(
            "Message",
            format!("from {origin}: {}", parsed.describe(MESSAGE_PREVIEW_CHARS)),
        );

        if self.settings.debug {
            if let Some(shape) = parsed.shape_summary() {
                self.state.note("Debug", format!("message shape: {shape}"));
            }
        }
    }

    fn report_media_error(&self, err: &MediaError) {
        warn!("{} error: {err}", err.media);
        self.state.media_message.set(err.message.clone());
        self.state
            .note(err.media.label(), format!("{} ({})", err.message, err.detail));
    }

    fn log_features(&self) {
        let navigator = self.window.navigator();
        let has = |target: &JsValue, key: &str| Reflect::has(target, &key.into()).unwrap_or(false);
        let features = [
            ("Service Worker", has(navigator.as_ref(), "serviceWorker")),
            ("Camera/Media", has(navigator.as_ref(), "mediaDevices")),
            ("MediaRecorder", has(self.window.as_ref(), "MediaRecorder")),
            ("Notifications", has(self.window.as_ref(), "Notification")),
            ("Geolocation", has(navigator.as_ref(), "geolocation")),
            ("Local Storage", has(self.window.as_ref(), "localStorage")),
            ("IndexedDB", has(self.window.as_ref(), "indexedDB")),
        ];
        let summary = features
            .iter()
            .map(|(name, ok)| format!("{name} {}", if *ok { "✓" } else { "✗" }))
            .collect::<Vec<_>>()
            .join(", ");
        self.state.note("Features", summary);
    }

    // ── camera ───────────────────────────────────────────────────────────

    // The borrow spans the await; a second request while one is pending
    // finds it taken and backs off.
    #[allow(clippy::await_holding_refcell_ref)]
    async fn start_camera(&self) {
        let Ok(mut camera) = self.camera.try_borrow_mut() else {
            self.state.note("Camera", "A camera request is already pending");
            return;
        };
        let result = camera.start().await;
        let active = camera.is_active();
        drop(camera);

        match result {
            Ok(true) => {
                self.page.show("video", true, "block");
                self.page.show("cameraPlaceholder", false, "flex");
                self.state.media_message.set(String::new());
                self.state.note("Camera", "Camera started");
            }
            Ok(false) => self.state.note("Camera", "Camera is already running"),
            Err(e) => self.report_media_error(&e),
        }
        self.state.camera_active.set(active);
    }

    fn stop_camera(&self) {
        let Ok(mut camera) = self.camera.try_borrow_mut() else {
            self.state.note("Camera", "A camera request is still pending");
            return;
        };
        if camera.stop() {
            drop(camera);
            self.page.show("video", false, "block");
            self.page.show("cameraPlaceholder", true, "flex");
            self.state.camera_active.set(false);
            self.state.note("Camera", "Camera stopped");
        }
    }

    fn take_photo(&self) {
        let photo = match self.camera.try_borrow() {
            Ok(camera) => camera.take_photo(),
            Err(_) => {
                self.state.note("Camera", "A camera request is still pending");
                return;
            }
        };

        match photo {
            Ok(photo) => match self.show_photo(&photo) {
                Ok(()) => self.state.note(
                    "Camera",
                    format!("Photo taken ({}x{})", photo.width, photo.height),
                ),
                Err(e) => self
                    .state
                    .note("Camera", format!("Cannot display photo: {e:?}")),
            },
            Err(e) => {
                self.state.media_message.set(e.to_string());
                self.state.note("Camera", e.to_string());
            }
        }
    }

    fn show_photo(&self, photo: &Photo) -> Result<(), JsValue> {
        let bytes = js_sys::Uint8Array::from(photo.png.as_slice());
        let options = BlobPropertyBag::new();
        options.set_type("image/png");
        let blob = Blob::new_with_u8_array_sequence_and_options(&Array::of1(&bytes), &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;

        self.state.photo.set(Some(PhotoView {
            url: url.clone(),
            width: photo.width,
            height: photo.height,
        }));
        if let Some(old) = self.photo_url.replace(Some(url)) {
            Url::revoke_object_url(&old)?;
        }
        Ok(())
    }

    // ── microphone ───────────────────────────────────────────────────────

    #[allow(clippy::await_holding_refcell_ref)]
    async fn start_recording(self: &Rc<Self>) {
        let Ok(mut mic) = self.microphone.try_borrow_mut() else {
            self.state
                .note("Microphone", "A microphone request is already pending");
            return;
        };

        match mic.start_recording().await {
            Ok(true) => match self.attach_recorder(&mut mic) {
                Ok(()) => {
                    let format = mic.mime().unwrap_or("default format");
                    drop(mic);
                    self.state.media_message.set(String::new());
                    self.state.mic_active.set(true);
                    self.state
                        .note("Microphone", format!("Recording started ({format})"));
                }
                Err(e) => {
                    mic.stop_recording();
                    let _ = mic.finish();
                    drop(mic);
                    self.state.mic_active.set(false);
                    self.state
                        .note("Microphone", format!("Recorder unavailable: {e:?}"));
                }
            },
            Ok(false) => {
                drop(mic);
                self.state.note("Microphone", "Already recording");
            }
            Err(e) => {
                drop(mic);
                self.state.mic_active.set(false);
                self.report_media_error(&e);
            }
        }
    }

    /// Wire a `MediaRecorder` to the open stream. Its callbacks replace those
    /// of any earlier recording.
    fn attach_recorder(
        self: &Rc<Self>,
        mic: &mut MicrophoneController<WebDevices>,
    ) -> Result<(), JsValue> {
        let mime = mic.mime();
        let stream = mic
            .stream_mut()
            .ok_or_else(|| JsValue::from_str("no active microphone stream"))?;

        let options = MediaRecorderOptions::new();
        if let Some(mime) = mime {
            options.set_mime_type(mime);
        }
        let recorder = MediaRecorder::new_with_media_stream_and_media_recorder_options(
            stream.media(),
            &options,
        )?;

        let (generation, replaced) = self.recorder_hooks.borrow_mut().install(|generation| {
            let weak = Rc::downgrade(self);
            let on_data: RecorderCallback = Closure::new(move |event: JsValue| {
                let Some(inner) = weak.upgrade() else { return };
                let Some(blob) = event.dyn_ref::<BlobEvent>().and_then(BlobEvent::data) else {
                    return;
                };
                match inner.microphone.try_borrow_mut() {
                    Ok(mut mic) => {
                        mic.push_chunk(BlobChunk(blob));
                    }
                    Err(_) => debug!("recording chunk dropped: microphone busy"),
                }
            });
            let weak = Rc::downgrade(self);
            let on_stop: RecorderCallback = Closure::new(move |_event: JsValue| {
                if let Some(inner) = weak.upgrade() {
                    inner.finish_recording(generation);
                }
            });
            RecorderHooks::attach(recorder.clone(), on_data, on_stop)
        });
        drop(replaced);

        if let Err(e) = recorder.start_with_time_slice(RECORDER_TIMESLICE_MS) {
            drop(self.recorder_hooks.borrow_mut().release(generation));
            return Err(e);
        }
        stream.set_recorder(recorder);
        Ok(())
    }

    fn stop_recording(&self) {
        let Ok(mut mic) = self.microphone.try_borrow_mut() else {
            self.state
                .note("Microphone", "A microphone request is still pending");
            return;
        };
        if mic.stop_recording() {
            drop(mic);
            self.state.mic_active.set(false);
            self.state.note("Microphone", "Recording stopped");
        }
    }

    /// Runs from the recorder's `stop` callback, after the last chunk.
    fn finish_recording(&self, generation: u64) {
        // The hooks own the callback running right now; free them once it
        // has returned.
        if let Some(hooks) = self.recorder_hooks.borrow_mut().release(generation) {
            spawn_local(async move { drop(hooks) });
        }

        let finished = match self.microphone.try_borrow_mut() {
            Ok(mut mic) => mic.finish(),
            Err(_) => return,
        };
        let recording = match finished {
            Ok(recording) => recording,
            Err(e) => {
                self.state.note("Microphone", e.to_string());
                return;
            }
        };

        let url = match Url::create_object_url_with_blob(&recording.data.0) {
            Ok(url) => url,
            Err(e) => {
                self.state
                    .note("Microphone", format!("Cannot play recording: {e:?}"));
                return;
            }
        };

        self.state.recording.set(Some(RecordingView {
            url: url.clone(),
            file_name: render::recording_file_name(recording.mime),
        }));
        if let Some(old) = self.recording_url.replace(Some(url)) {
            let _ = Url::revoke_object_url(&old);
        }

        self.state.note(
            "Microphone",
            format!(
                "Recording ready ({} chunk(s), {} bytes)",
                recording.chunk_count,
                recording.data.byte_len()
            ),
        );
    }

    fn release_media(&self) {
        if let Ok(mut camera) = self.camera.try_borrow_mut() {
            camera.stop();
        }
        if let Ok(mut mic) = self.microphone.try_borrow_mut() {
            mic.stop_recording();
        }
        self.state.camera_active.set(false);
        self.state.mic_active.set(false);
        debug!("media released");
    }
}
