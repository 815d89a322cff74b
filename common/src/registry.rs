//! Explicit registry of the event types the logger listens for.

use indexmap::IndexMap;

use crate::event::{self, EventGroup, HIGH_FREQUENCY_SAMPLE};

/// How often dispatches of a type reach the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPolicy {
    Always,
    /// Log occurrence 1, 1+K, 1+2K, ...
    Sampled(u32),
}

impl LogPolicy {
    /// Whether the `n`th occurrence (1-based) should be logged.
    pub fn admits(&self, n: u64) -> bool {
        match *self {
            Self::Always => true,
            Self::Sampled(k) => (n.saturating_sub(1)) % u64::from(k.max(1)) == 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSpec {
    pub group: EventGroup,
    pub policy: LogPolicy,
}

/// Mapping from event name to how it is handled. Registration order is
/// preserved so listeners attach in a stable order.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    specs: IndexMap<String, EventSpec>,
}

impl EventRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry pre-filled with the fixed catalog.
    pub fn catalog() -> Self {
        let mut registry = Self::empty();
        for (name, group) in event::CATALOG {
            registry.register(name, *group);
        }
        registry
    }

    /// Add `name` under `group`. Returns `false` if it was already present,
    /// in which case the existing entry is left untouched.
    pub fn register(&mut self, name: &str, group: EventGroup) -> bool {
        if self.specs.contains_key(name) {
            return false;
        }
        let policy = if event::is_high_frequency(name) {
            LogPolicy::Sampled(HIGH_FREQUENCY_SAMPLE)
        } else {
            LogPolicy::Always
        };
        self.specs
            .insert(name.to_string(), EventSpec { group, policy });
        true
    }

    pub fn get(&self, name: &str) -> Option<&EventSpec> {
        self.specs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}
