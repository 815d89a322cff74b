//! Ownership of per-recording callbacks.
//!
//! A recorder's final `dataavailable` and `stop` events arrive after the
//! microphone stream has been released, so the callbacks cannot live in the
//! stream. The slot keeps exactly one live set. Each set is tagged with a
//! generation, and a release naming an older generation is ignored.

#[derive(Debug)]
pub struct HookSlot<H> {
    current: Option<(u64, H)>,
    next: u64,
}

impl<H> Default for HookSlot<H> {
    fn default() -> Self {
        HookSlot {
            current: None,
            next: 0,
        }
    }
}

impl<H> HookSlot<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and install a new set. `build` receives the set's generation.
    /// Returns that generation and the set it replaced, for the caller to
    /// drop.
    pub fn install(&mut self, build: impl FnOnce(u64) -> H) -> (u64, Option<H>) {
        let generation = self.next;
        self.next += 1;
        let replaced = self
            .current
            .replace((generation, build(generation)))
            .map(|(_, hooks)| hooks);
        (generation, replaced)
    }

    /// Take the set installed as `generation`, if it is still the live one.
    pub fn release(&mut self, generation: u64) -> Option<H> {
        match self.current {
            Some((live, _)) if live == generation => self.current.take().map(|(_, hooks)| hooks),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_empties_slot() {
        let mut slot = HookSlot::new();
        let (generation, replaced) = slot.install(|g| format!("hooks #{g}"));
        assert!(replaced.is_none());
        assert_eq!(slot.release(generation).as_deref(), Some("hooks #0"));
        assert!(slot.is_empty());
        assert!(slot.release(generation).is_none());
    }

    #[test]
    fn test_install_hands_back_previous_set() {
        let mut slot = HookSlot::new();
        let (first, _) = slot.install(|g| g);
        let (second, replaced) = slot.install(|g| g);
        assert_eq!(replaced, Some(first));
        assert_ne!(first, second);
    }

    #[test]
    fn test_stale_release_keeps_live_set() {
        let mut slot = HookSlot::new();
        let (old, _) = slot.install(|_| "old");
        let (new, _) = slot.install(|_| "new");

        assert!(slot.release(old).is_none());
        assert!(!slot.is_empty());
        assert_eq!(slot.release(new), Some("new"));
    }

    #[test]
    fn test_repeated_recordings_hold_one_set() {
        let mut slot = HookSlot::new();
        for _ in 0..100 {
            let (generation, _) = slot.install(|g| vec![g; 2]);
            assert!(slot.release(generation).is_some());
        }
        assert!(slot.is_empty());
    }
}
