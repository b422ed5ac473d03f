//! Touch-event de-duplication.
//!
//! A finger resting on a tile makes the controller emit the same
//! `touchmove` many times a second. Only a change in row, column or phase
//! is forwarded to displays. State is kept per controller session so two
//! people touching at once never suppress each other.

use std::collections::HashMap;

use mural_types::{SessionId, TouchEvent};

/// Last forwarded touch event per controller session.
#[derive(Debug, Default)]
pub struct TouchDeduplicator {
    last: HashMap<SessionId, TouchEvent>,
}

impl TouchDeduplicator {
    /// An empty de-duplicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `event` from `session` should be forwarded.
    ///
    /// Returns `false` when it is identical to the previous event admitted
    /// from the same session.
    pub fn admit(&mut self, session: SessionId, event: TouchEvent) -> bool {
        self.last.insert(session, event) != Some(event)
    }

    /// Drop the state kept for `session`.
    pub fn forget(&mut self, session: SessionId) {
        self.last.remove(&session);
    }

    /// Number of sessions with a remembered event.
    pub fn len(&self) -> usize {
        self.last.len()
    }

    /// Whether no session has a remembered event.
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use mural_types::TouchPhase;

    use super::*;

    #[test]
    fn repeated_events_are_suppressed() {
        let mut dedup = TouchDeduplicator::new();
        let session = SessionId::new();
        let events = [
            TouchEvent::new(1, 2, TouchPhase::Start),
            TouchEvent::new(1, 2, TouchPhase::Start),
            TouchEvent::new(1, 2, TouchPhase::Move),
            TouchEvent::new(1, 2, TouchPhase::Move),
            TouchEvent::new(1, 3, TouchPhase::Move),
        ];

        let forwarded: Vec<TouchEvent> = events
            .into_iter()
            .filter(|event| dedup.admit(session, *event))
            .collect();

        assert_eq!(
            forwarded,
            vec![
                TouchEvent::new(1, 2, TouchPhase::Start),
                TouchEvent::new(1, 2, TouchPhase::Move),
                TouchEvent::new(1, 3, TouchPhase::Move),
            ]
        );
    }

    #[test]
    fn sessions_do_not_suppress_each_other() {
        let mut dedup = TouchDeduplicator::new();
        let a = SessionId::new();
        let b = SessionId::new();
        let event = TouchEvent::new(0, 0, TouchPhase::Move);

        assert!(dedup.admit(a, event));
        assert!(dedup.admit(b, event));
        assert!(!dedup.admit(a, event));
    }

    #[test]
    fn returning_to_an_earlier_event_is_forwarded() {
        let mut dedup = TouchDeduplicator::new();
        let session = SessionId::new();
        let start = TouchEvent::new(4, 4, TouchPhase::Start);

        assert!(dedup.admit(session, start));
        assert!(dedup.admit(session, TouchEvent::new(4, 4, TouchPhase::End)));
        assert!(dedup.admit(session, start));
    }

    #[test]
    fn forget_resets_session() {
        let mut dedup = TouchDeduplicator::new();
        let session = SessionId::new();
        let event = TouchEvent::new(2, 2, TouchPhase::End);

        dedup.admit(session, event);
        dedup.forget(session);
        assert!(dedup.is_empty());
        assert!(dedup.admit(session, event));
    }
}
