//! Event logger: owns the registry, the per-type counters and the display
//! log, and decides which dispatches become log entries.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::event::{EventGroup, ObservedEvent};
use crate::log::{EventLog, LogEntry};
use crate::registry::EventRegistry;

/// Listener attachment state. There is no way back to `Idle`: listeners
/// live as long as the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
}

#[derive(Debug)]
pub struct EventLogger {
    state: CaptureState,
    registry: EventRegistry,
    log: EventLog,
    counters: HashMap<String, u64>,
    total: u64,
}

impl EventLogger {
    /// Logger over the fixed catalog with a log of `cap` entries.
    pub fn new(cap: usize) -> Self {
        Self::with_registry(EventRegistry::catalog(), cap)
    }

    pub fn with_registry(registry: EventRegistry, cap: usize) -> Self {
        EventLogger {
            state: CaptureState::Idle,
            registry,
            log: EventLog::new(cap),
            counters: HashMap::new(),
            total: 0,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Total dispatches seen, logged or not.
    pub fn total_observed(&self) -> u64 {
        self.total
    }

    /// Idle → Capturing. Calls `attach` once per registered name; names the
    /// platform refuses are skipped without a log entry. Returns the number
    /// of listeners attached, or `None` if already capturing.
    pub fn start_capturing<E, F>(&mut self, mut attach: F) -> Option<usize>
    where
        E: std::fmt::Debug,
        F: FnMut(&str) -> Result<(), E>,
    {
        if self.state == CaptureState::Capturing {
            return None;
        }

        let mut attached = 0;
        for name in self.registry.names() {
            match attach(name) {
                Ok(()) => attached += 1,
                Err(e) => debug!("listener for {name} not attached: {e:?}"),
            }
        }

        self.state = CaptureState::Capturing;
        info!(
            "Capturing {attached} of {} event types",
            self.registry.len()
        );
        Some(attached)
    }

    /// Handle one dispatch. Returns the entry written, if any.
    pub fn observe(&mut self, event: &ObservedEvent) -> Option<&LogEntry> {
        self.total += 1;

        let Some(spec) = self.registry.get(&event.event_type).copied() else {
            self.discover(&event.event_type);
            return self.log.latest();
        };

        let count = self
            .counters
            .entry(event.event_type.clone())
            .or_insert(0);
        *count += 1;
        if !spec.policy.admits(*count) {
            return None;
        }

        self.log
            .push(LogEntry::now(spec.group.category(), event.details()));
        self.log.latest()
    }

    /// Register a type that was not in the catalog and note it in the log.
    /// Returns `false` if the type was already known.
    pub fn discover(&mut self, name: &str) -> bool {
        if !self.registry.register(name, EventGroup::Discovered) {
            return false;
        }
        self.counters.insert(name.to_string(), 0);
        self.log.push(LogEntry::now(
            EventGroup::Discovered.category(),
            format!("New event type discovered: {name}"),
        ));
        true
    }

    /// Write a free-form entry (camera, microphone, navigation, ...).
    pub fn note(&mut self, category: &str, details: impl Into<String>) {
        self.log.push(LogEntry::now(category, details));
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HIGH_FREQUENCY_SAMPLE;
    use crate::log::CLEARED_SENTINEL;

    #[test]
    fn test_start_capturing_once() {
        let mut logger = EventLogger::new(50);
        let mut names = Vec::new();
        let attached = logger.start_capturing(|name| {
            names.push(name.to_string());
            Ok::<(), ()>(())
        });
        assert_eq!(attached, Some(logger.registry().len()));
        assert_eq!(logger.state(), CaptureState::Capturing);
        assert!(names.contains(&"keydown".to_string()));

        assert_eq!(logger.start_capturing(|_| Ok::<(), ()>(())), None);
    }

    #[test]
    fn test_attach_failures_swallowed() {
        let mut logger = EventLogger::new(50);
        let attached = logger
            .start_capturing(|name| {
                if name == "sideClick" || name == "scrollUp" {
                    Err("unsupported")
                } else {
                    Ok(())
                }
            })
            .unwrap();
        assert_eq!(attached, logger.registry().len() - 2);
        assert!(logger.log().is_empty());
    }

    #[test]
    fn test_regular_events_always_logged() {
        let mut logger = EventLogger::new(500);
        for _ in 0..40 {
            assert!(logger.observe(&ObservedEvent::new("click")).is_some());
        }
        assert_eq!(logger.log().len(), 40);
        assert_eq!(logger.log().latest().unwrap().category, "Mouse");
    }

    #[test]
    fn test_high_frequency_sampled() {
        let mut logger = EventLogger::new(500);
        let k = HIGH_FREQUENCY_SAMPLE as usize;
        for _ in 0..(3 * k) {
            logger.observe(&ObservedEvent::new("mousemove"));
        }
        assert_eq!(logger.log().len(), 3);
        assert_eq!(logger.total_observed(), 3 * k as u64);
    }

    #[test]
    fn test_sampling_is_per_type() {
        let mut logger = EventLogger::new(500);
        logger.observe(&ObservedEvent::new("mousemove"));
        logger.observe(&ObservedEvent::new("scroll"));
        logger.observe(&ObservedEvent::new("mousemove"));
        assert_eq!(logger.log().len(), 2);
    }

    #[test]
    fn test_unknown_type_discovered_once() {
        let mut logger = EventLogger::new(50);
        let entry = logger
            .observe(&ObservedEvent::new("gamepadconnected"))
            .unwrap()
            .clone();
        assert_eq!(entry.details, "New event type discovered: gamepadconnected");
        assert!(logger.registry().contains("gamepadconnected"));

        let entry = logger
            .observe(&ObservedEvent::new("gamepadconnected"))
            .unwrap();
        assert_eq!(entry.category, "Discovered");
        assert_eq!(entry.details, "gamepadconnected");
        assert_eq!(logger.log().len(), 2);
        assert!(!logger.discover("gamepadconnected"));
    }

    #[test]
    fn test_cap_respected_under_load() {
        let mut logger = EventLogger::new(3);
        for _ in 0..100 {
            logger.observe(&ObservedEvent::new("keyup"));
            assert!(logger.log().len() <= 3);
        }
    }

    #[test]
    fn test_note_and_clear() {
        let mut logger = EventLogger::new(50);
        logger.note("Camera", "started");
        assert_eq!(logger.log().latest().unwrap().category, "Camera");
        logger.clear();
        assert_eq!(logger.log().len(), 1);
        assert_eq!(logger.log().latest().unwrap().details, CLEARED_SENTINEL);
    }
}
