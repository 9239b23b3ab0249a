//! Mutable detection state: dedup fingerprints and the suppression gate
//!
//! Both structures are owned by the engine instance and shared across the
//! poll task and foreground callers, so all mutation goes through a Mutex.

use crate::shared::types::EntryKind;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Last-accepted fingerprint per content kind.
///
/// Only the single most recent fingerprint per kind is remembered, not full
/// history: returning to previously-seen content after the clipboard has held
/// something else in between is a new change and is re-emitted.
#[derive(Debug, Default)]
struct Slots {
    last_text_hash: Option<u64>,
    last_image_hash: Option<u64>,
    last_file_hash: Option<u64>,
}

#[derive(Clone, Default)]
pub struct DedupState {
    slots: Arc<Mutex<Slots>>,
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `fingerprint` represents a genuine change for `kind`.
    ///
    /// Equal to the stored slot: no-op, returns false. Different: the slot is
    /// updated and the other two kinds' slots are cleared, because the OS
    /// clipboard holds exactly one logical current item and a stale
    /// fingerprint must not block that kind when it reappears.
    pub fn accept(&self, kind: EntryKind, fingerprint: u64) -> bool {
        let mut slots = self.lock();
        let current = match kind {
            EntryKind::Text => slots.last_text_hash,
            EntryKind::Image => slots.last_image_hash,
            EntryKind::File => slots.last_file_hash,
        };

        if current == Some(fingerprint) {
            return false;
        }

        *slots = Slots::default();
        match kind {
            EntryKind::Text => slots.last_text_hash = Some(fingerprint),
            EntryKind::Image => slots.last_image_hash = Some(fingerprint),
            EntryKind::File => slots.last_file_hash = Some(fingerprint),
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub fn slot(&self, kind: EntryKind) -> Option<u64> {
        let slots = self.lock();
        match kind {
            EntryKind::Text => slots.last_text_hash,
            EntryKind::Image => slots.last_image_hash,
            EntryKind::File => slots.last_file_hash,
        }
    }
}

/// Short-lived flag absorbing the engine's own clipboard writes.
///
/// When the engine writes an entry back to the clipboard on the user's
/// behalf, the next poll would otherwise re-detect that write as a fresh
/// copy. Arming the gate marks the next detected change as self-inflicted:
/// dedup slots are updated but no entry is emitted.
#[derive(Clone, Default)]
pub struct SuppressionGate {
    armed_until: Arc<Mutex<Option<Instant>>>,
}

impl SuppressionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the gate for `window` from now. Re-arming before expiry resets
    /// the deadline rather than stacking.
    pub fn arm(&self, window: Duration) {
        let mut armed_until = self.lock();
        *armed_until = Some(Instant::now() + window);
    }

    /// Consume the gate if armed and unexpired, disarming it either way.
    ///
    /// A programmatic write landing after the window has elapsed is captured
    /// as a normal change. Accepted race, the window is a heuristic under
    /// system load, not a correctness guarantee.
    pub fn consume(&self) -> bool {
        let mut armed_until = self.lock();
        match armed_until.take() {
            Some(deadline) => Instant::now() < deadline,
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.armed_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FP_A: u64 = 0xA11CE;
    const FP_B: u64 = 0xB0B;

    #[test]
    fn repeated_fingerprint_is_rejected() {
        let state = DedupState::new();
        assert!(state.accept(EntryKind::Text, FP_A));
        assert!(!state.accept(EntryKind::Text, FP_A));
        assert!(!state.accept(EntryKind::Text, FP_A));
    }

    #[test]
    fn distinct_fingerprint_is_accepted() {
        let state = DedupState::new();
        assert!(state.accept(EntryKind::Text, FP_A));
        assert!(state.accept(EntryKind::Text, FP_B));
    }

    #[test]
    fn accepting_one_kind_clears_other_slots() {
        let state = DedupState::new();
        assert!(state.accept(EntryKind::Text, FP_A));
        assert!(state.accept(EntryKind::Image, FP_B));
        assert_eq!(state.slot(EntryKind::Text), None);

        // text reappearing with the same old fingerprint is a new change
        assert!(state.accept(EntryKind::Text, FP_A));
        assert_eq!(state.slot(EntryKind::Image), None);
    }

    #[test]
    fn gate_consumes_once_within_window() {
        let gate = SuppressionGate::new();
        gate.arm(Duration::from_millis(600));
        assert!(gate.consume());
        // explicitly disarmed by the first consume
        assert!(!gate.consume());
    }

    #[test]
    fn gate_expires_after_window() {
        let gate = SuppressionGate::new();
        gate.arm(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!gate.consume());
    }

    #[test]
    fn rearming_resets_the_window() {
        let gate = SuppressionGate::new();
        gate.arm(Duration::from_millis(0));
        gate.arm(Duration::from_millis(600));
        assert!(gate.consume());
    }

    #[test]
    fn unarmed_gate_is_inert() {
        let gate = SuppressionGate::new();
        assert!(!gate.consume());
    }
}
