//! `MediaDevices` implementation over `navigator.mediaDevices`.
//!
//! Rejections are classified here, once, through
//! [`platform::classify_error`].

use async_trait::async_trait;
use js_sys::{Array, Reflect};
use probe_common::media::{MediaConstraints, MediaError, MediaErrorKind, MediaKind};
use probe_common::session::{Chunk, Frame, MediaDevices, MediaStream};
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, Document, DomException, HtmlCanvasElement,
    HtmlVideoElement, MediaRecorder, MediaStreamConstraints, MediaStreamTrack,
    MediaStreamTrackState, RecordingState, Window,
};

use crate::platform;

/// Map a rejected promise value to a classified error.
fn classify(media: MediaKind, err: JsValue) -> MediaError {
    if let Some(dom) = err.dyn_ref::<DomException>() {
        return platform::classify_error(media, Some(&dom.name()), &dom.message());
    }
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return platform::classify_error(
            media,
            Some(&String::from(e.name())),
            &String::from(e.message()),
        );
    }
    let detail = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    platform::classify_error(media, None, &detail)
}

/// Recorded data as delivered by `MediaRecorder`.
#[derive(Clone)]
pub struct BlobChunk(pub Blob);

impl Chunk for BlobChunk {
    fn byte_len(&self) -> usize {
        self.0.size() as usize
    }

    fn concat(chunks: Vec<Self>, mime: Option<&str>) -> Result<Self, String> {
        let parts: Array = chunks.iter().map(|c| JsValue::from(c.0.clone())).collect();
        let options = BlobPropertyBag::new();
        if let Some(mime) = mime {
            options.set_type(mime);
        }
        Blob::new_with_blob_sequence_and_options(&parts, &options)
            .or_else(|_| Blob::new_with_blob_sequence(&parts))
            .map(BlobChunk)
            .map_err(|e| format!("{e:?}"))
    }
}

pub type RecorderCallback = Closure<dyn FnMut(JsValue)>;

/// A recorder together with the callbacks wired into it. Dropping detaches
/// the callbacks before they are freed.
pub struct RecorderHooks {
    recorder: MediaRecorder,
    _on_data: RecorderCallback,
    _on_stop: RecorderCallback,
}

impl RecorderHooks {
    pub fn attach(
        recorder: MediaRecorder,
        on_data: RecorderCallback,
        on_stop: RecorderCallback,
    ) -> Self {
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));
        recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));
        RecorderHooks {
            recorder,
            _on_data: on_data,
            _on_stop: on_stop,
        }
    }
}

impl Drop for RecorderHooks {
    fn drop(&mut self) {
        self.recorder.set_ondataavailable(None);
        self.recorder.set_onstop(None);
    }
}

/// An acquired browser stream, optionally bound to a preview element and a
/// recorder. Tracks are stopped when the stream is dropped.
pub struct WebStream {
    media: web_sys::MediaStream,
    document: Document,
    preview: Option<HtmlVideoElement>,
    recorder: Option<MediaRecorder>,
}

impl WebStream {
    pub fn media(&self) -> &web_sys::MediaStream {
        &self.media
    }

    pub fn set_recorder(&mut self, recorder: MediaRecorder) {
        self.recorder = Some(recorder);
    }

    fn tracks(&self) -> impl Iterator<Item = MediaStreamTrack> {
        self.media
            .get_tracks()
            .iter()
            .filter_map(|t| t.dyn_into::<MediaStreamTrack>().ok())
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl Drop for WebStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

impl MediaStream for WebStream {
    type Chunk = BlobChunk;

    fn stop_tracks(&mut self) {
        if let Some(recorder) = &self.recorder {
            if recorder.state() != RecordingState::Inactive {
                if let Err(e) = recorder.stop() {
                    debug!("recorder.stop failed: {e:?}");
                }
            }
        }
        for track in self.tracks() {
            track.stop();
        }
        if let Some(video) = &self.preview {
            video.set_src_object(None);
        }
    }

    fn live_tracks(&self) -> usize {
        self.tracks()
            .filter(|t| t.ready_state() == MediaStreamTrackState::Live)
            .count()
    }

    fn snapshot(&self) -> Option<Frame> {
        let video = self.preview.as_ref()?;
        let (width, height) = (video.video_width(), video.video_height());
        if width == 0 || height == 0 {
            return None;
        }

        let canvas: HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .ok()?
            .dyn_into()
            .ok()?;
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx: CanvasRenderingContext2d = canvas.get_context("2d").ok()??.dyn_into().ok()?;
        ctx.draw_image_with_html_video_element(video, 0.0, 0.0)
            .ok()?;
        let data = ctx
            .get_image_data(0.0, 0.0, f64::from(width), f64::from(height))
            .ok()?;

        Some(Frame {
            width,
            height,
            rgba: data.data().0,
        })
    }
}

/// Browser media access. A camera instance binds streams to `preview`.
#[derive(Clone)]
pub struct WebDevices {
    window: Window,
    preview: Option<HtmlVideoElement>,
}

impl WebDevices {
    pub fn camera(window: Window, preview: Option<HtmlVideoElement>) -> Self {
        WebDevices { window, preview }
    }

    pub fn microphone(window: Window) -> Self {
        WebDevices {
            window,
            preview: None,
        }
    }
}

#[async_trait(?Send)]
impl MediaDevices for WebDevices {
    type Stream = WebStream;

    async fn open(&self, constraints: &MediaConstraints) -> Result<WebStream, MediaError> {
        let media = constraints.kind();

        if !self.window.is_secure_context() {
            return Err(MediaError::new(
                MediaErrorKind::InsecureContext,
                media,
                "window.isSecureContext is false",
            ));
        }
        let navigator = self.window.navigator();
        if !Reflect::has(&navigator, &"mediaDevices".into()).unwrap_or(false) {
            return Err(MediaError::new(
                MediaErrorKind::Unsupported,
                media,
                "navigator.mediaDevices is missing",
            ));
        }
        let devices = navigator.media_devices().map_err(|e| classify(media, e))?;
        let document = self.window.document().ok_or_else(|| {
            MediaError::new(MediaErrorKind::Unknown, media, "window has no document")
        })?;

        let constraints: MediaStreamConstraints =
            js_sys::JSON::parse(&constraints.to_json().to_string())
                .map_err(|e| classify(media, e))?
                .unchecked_into();
        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| classify(media, e))?;
        let stream: web_sys::MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| classify(media, e))?
            .dyn_into()
            .map_err(|_| {
                MediaError::new(
                    MediaErrorKind::Unknown,
                    media,
                    "getUserMedia resolved to something other than a MediaStream",
                )
            })?;

        if let Some(video) = &self.preview {
            video.set_src_object(Some(&stream));
            if let Err(e) = video.play() {
                debug!("preview play() failed: {e:?}");
            }
        }

        Ok(WebStream {
            media: stream,
            document,
            preview: self.preview.clone(),
            recorder: None,
        })
    }

    fn supports_recording_type(&self, mime: &str) -> bool {
        Reflect::has(&self.window, &"MediaRecorder".into()).unwrap_or(false)
            && MediaRecorder::is_type_supported(mime)
    }
}
