use crate::events::AdEvent;

/// Playback milestones and the percentage at which each one is reported
pub const QUARTILE_EVENTS: [(AdEvent, f64); 6] = [
    (AdEvent::AdImpression, 0.0),
    (AdEvent::AdVideoStart, 0.0),
    (AdEvent::AdVideoFirstQuartile, 25.0),
    (AdEvent::AdVideoMidpoint, 50.0),
    (AdEvent::AdVideoThirdQuartile, 75.0),
    (AdEvent::AdVideoComplete, 100.0),
];

/// Forward-only cursor over [`QUARTILE_EVENTS`]
///
/// Only the entry under the cursor is checked on each update, so a jump past
/// several thresholds reports one milestone per update, never a batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuartileTracker {
    next: usize,
}

impl QuartileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the current milestone against `percent_played`
    ///
    /// Returns the event to report, advancing the cursor, or `None`.
    pub fn advance(&mut self, percent_played: f64) -> Option<AdEvent> {
        let &(event, threshold) = QUARTILE_EVENTS.get(self.next)?;
        if percent_played >= threshold {
            self.next += 1;
            Some(event)
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.next >= QUARTILE_EVENTS.len()
    }

    /// Number of milestones reported so far
    pub fn reported(&self) -> usize {
        self.next
    }
}
