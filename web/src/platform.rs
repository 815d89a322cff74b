//! Platform-neutral halves of the DOM glue: assembling [`ObservedEvent`]s
//! from the fields a DOM event exposes, and classifying rejected media
//! requests. `dom` and `devices` only read values out of `web_sys` objects
//! and hand them here.

use probe_common::event::{Modifiers, ObservedEvent};
use probe_common::media::{MediaError, MediaErrorKind, MediaKind};

/// Fields read from a DOM event, by interface.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    Keyboard {
        key: String,
        code: String,
        modifiers: Modifiers,
    },
    /// `MouseEvent` and its subtypes (`PointerEvent`, `WheelEvent`).
    Pointer {
        position: (f64, f64),
        button: i16,
        wheel: Option<(f64, f64)>,
        modifiers: Modifiers,
    },
    Touch {
        count: u32,
        first: Option<(f64, f64)>,
        modifiers: Modifiers,
    },
    Other,
}

/// Mouse/pointer types for which `button` carries information.
pub fn reports_button(event_type: &str) -> bool {
    event_type.ends_with("down")
        || event_type.ends_with("up")
        || event_type.contains("click")
        || event_type == "contextmenu"
}

/// Snapshot of one dispatch. Fields the interface does not have stay `None`.
pub fn observed_event(
    event_type: String,
    target_tag: Option<String>,
    source: InputSource,
) -> ObservedEvent {
    let mut observed = ObservedEvent::new(event_type);
    observed.target_tag = target_tag;

    match source {
        InputSource::Keyboard {
            key,
            code,
            modifiers,
        } => {
            observed.key = Some(key);
            observed.code = Some(code);
            observed.modifiers = Some(modifiers);
        }
        InputSource::Pointer {
            position,
            button,
            wheel,
            modifiers,
        } => {
            observed.position = Some(position);
            if reports_button(&observed.event_type) {
                observed.button = Some(button);
            }
            observed.delta = wheel;
            observed.modifiers = Some(modifiers);
        }
        InputSource::Touch {
            count,
            first,
            modifiers,
        } => {
            observed.touch_count = Some(count);
            observed.position = first;
            observed.modifiers = Some(modifiers);
        }
        InputSource::Other => {}
    }

    observed
}

/// Classify a rejected media request. `name` is the `DOMException` or
/// `Error` name when the rejection value had one; anything else is
/// `Unknown` with `message` as the detail.
pub fn classify_error(media: MediaKind, name: Option<&str>, message: &str) -> MediaError {
    match name {
        Some(name) => MediaError::from_platform(media, name, message),
        None => MediaError::new(MediaErrorKind::Unknown, media, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_keyboard_fields() {
        let ev = observed_event(
            "keydown".into(),
            Some("BODY".into()),
            InputSource::Keyboard {
                key: "a".into(),
                code: "KeyA".into(),
                modifiers: ctrl(),
            },
        );
        assert_eq!(ev.key.as_deref(), Some("a"));
        assert_eq!(ev.code.as_deref(), Some("KeyA"));
        assert_eq!(ev.position, None);
        assert_eq!(ev.button, None);
        assert_eq!(
            ev.details(),
            "keydown | Key: a | Code: KeyA | Target: BODY | Mods: Ctrl"
        );
    }

    #[test]
    fn test_button_only_for_press_types() {
        let pointer = |ty: &str| {
            observed_event(
                ty.into(),
                None,
                InputSource::Pointer {
                    position: (3.0, 4.0),
                    button: 2,
                    wheel: None,
                    modifiers: Modifiers::default(),
                },
            )
        };
        assert_eq!(pointer("mousedown").button, Some(2));
        assert_eq!(pointer("pointerup").button, Some(2));
        assert_eq!(pointer("dblclick").button, Some(2));
        assert_eq!(pointer("contextmenu").button, Some(2));
        assert_eq!(pointer("mousemove").button, None);
        assert_eq!(pointer("mouseover").button, None);
        assert_eq!(pointer("mousemove").position, Some((3.0, 4.0)));
    }

    #[test]
    fn test_wheel_delta() {
        let ev = observed_event(
            "wheel".into(),
            None,
            InputSource::Pointer {
                position: (0.0, 0.0),
                button: 0,
                wheel: Some((0.0, -120.0)),
                modifiers: Modifiers::default(),
            },
        );
        assert_eq!(ev.delta, Some((0.0, -120.0)));
        assert_eq!(ev.button, None);
    }

    #[test]
    fn test_touch_fields() {
        let ev = observed_event(
            "touchstart".into(),
            Some("DIV".into()),
            InputSource::Touch {
                count: 2,
                first: Some((10.0, 20.0)),
                modifiers: Modifiers::default(),
            },
        );
        assert_eq!(ev.touch_count, Some(2));
        assert_eq!(ev.position, Some((10.0, 20.0)));

        // touchend after the last finger lifts: no touches left
        let ev = observed_event(
            "touchend".into(),
            None,
            InputSource::Touch {
                count: 0,
                first: None,
                modifiers: Modifiers::default(),
            },
        );
        assert_eq!(ev.touch_count, Some(0));
        assert_eq!(ev.position, None);
    }

    #[test]
    fn test_other_events_carry_only_type_and_target() {
        let ev = observed_event("focus".into(), Some("INPUT".into()), InputSource::Other);
        assert_eq!(ev.details(), "focus | Target: INPUT");
        assert_eq!(ev.modifiers, None);
    }

    #[test]
    fn test_classify_named_rejections() {
        let err = classify_error(MediaKind::Camera, Some("NotAllowedError"), "denied");
        assert_eq!(err.kind, MediaErrorKind::PermissionDenied);
        assert_eq!(err.detail, "NotAllowedError: denied");

        let err = classify_error(MediaKind::Microphone, Some("TypeError"), "bad constraints");
        assert_eq!(err.kind, MediaErrorKind::Unsupported);
        assert_eq!(err.media, MediaKind::Microphone);
    }

    #[test]
    fn test_classify_unnamed_rejection_is_unknown() {
        let err = classify_error(MediaKind::Camera, None, "\"boom\"");
        assert_eq!(err.kind, MediaErrorKind::Unknown);
        assert_eq!(err.detail, "\"boom\"");
        assert_eq!(err.message, MediaErrorKind::Unknown.user_message(MediaKind::Camera));
    }
}
