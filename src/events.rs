use crate::error::VpaidError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Every event a VPAID 2.0 creative in this crate can emit
#[allow(clippy::enum_variant_names)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdEvent {
    AdLoaded,
    AdStarted,
    AdImpression,
    AdVideoStart,
    AdVideoFirstQuartile,
    AdVideoMidpoint,
    AdVideoThirdQuartile,
    AdVideoComplete,
    AdPaused,
    AdPlaying,
    AdSizeChange,
    AdExpanded,
    AdSkipped,
    AdVolumeChange,
    AdDurationChange,
    AdStopped,
    AdClickThru,
}

impl AdEvent {
    pub const ALL: [AdEvent; 17] = [
        Self::AdLoaded,
        Self::AdStarted,
        Self::AdImpression,
        Self::AdVideoStart,
        Self::AdVideoFirstQuartile,
        Self::AdVideoMidpoint,
        Self::AdVideoThirdQuartile,
        Self::AdVideoComplete,
        Self::AdPaused,
        Self::AdPlaying,
        Self::AdSizeChange,
        Self::AdExpanded,
        Self::AdSkipped,
        Self::AdVolumeChange,
        Self::AdDurationChange,
        Self::AdStopped,
        Self::AdClickThru,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::AdLoaded => "AdLoaded",
            Self::AdStarted => "AdStarted",
            Self::AdImpression => "AdImpression",
            Self::AdVideoStart => "AdVideoStart",
            Self::AdVideoFirstQuartile => "AdVideoFirstQuartile",
            Self::AdVideoMidpoint => "AdVideoMidpoint",
            Self::AdVideoThirdQuartile => "AdVideoThirdQuartile",
            Self::AdVideoComplete => "AdVideoComplete",
            Self::AdPaused => "AdPaused",
            Self::AdPlaying => "AdPlaying",
            Self::AdSizeChange => "AdSizeChange",
            Self::AdExpanded => "AdExpanded",
            Self::AdSkipped => "AdSkipped",
            Self::AdVolumeChange => "AdVolumeChange",
            Self::AdDurationChange => "AdDurationChange",
            Self::AdStopped => "AdStopped",
            Self::AdClickThru => "AdClickThru",
        }
    }
}

impl fmt::Display for AdEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for AdEvent {
    type Err = VpaidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| VpaidError::UnknownEvent(s.to_string()))
    }
}

/// Arguments delivered alongside an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventArgs {
    None,
    /// `AdClickThru(url, id, playerHandles)`
    ClickThru {
        url: String,
        id: String,
        player_handles: bool,
    },
}

pub type EventCallback = Box<dyn FnMut(&EventArgs)>;

/// One callback slot per event; the last subscription wins
#[derive(Default)]
pub struct EventRegistry {
    callbacks: HashMap<AdEvent, EventCallback>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `callback` to `event`, replacing any previous binding
    pub fn subscribe(&mut self, event: AdEvent, callback: EventCallback) {
        self.callbacks.insert(event, callback);
    }

    pub fn unsubscribe(&mut self, event: AdEvent) {
        self.callbacks.remove(&event);
    }

    pub fn is_subscribed(&self, event: AdEvent) -> bool {
        self.callbacks.contains_key(&event)
    }

    /// Invoke the callback bound to `event`, if any
    ///
    /// Returns whether a callback was invoked.
    pub fn emit(&mut self, event: AdEvent, args: &EventArgs) -> bool {
        match self.callbacks.get_mut(&event) {
            Some(callback) => {
                callback(args);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.callbacks.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_event_names_round_trip_through_from_str() {
        for event in AdEvent::ALL {
            assert_eq!(event.to_string().parse::<AdEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_serde_uses_vpaid_event_names() {
        for event in AdEvent::ALL {
            let json = serde_json::to_string(&event).unwrap();
            assert_eq!(json, format!("\"{}\"", event.name()));
            assert_eq!(serde_json::from_str::<AdEvent>(&json).unwrap(), event);
        }
        assert!(serde_json::from_str::<AdEvent>("\"AdInteraction\"").is_err());
    }

    #[test]
    fn test_unknown_event_name_is_rejected() {
        assert!(matches!(
            "AdUserAcceptInvitation".parse::<AdEvent>(),
            Err(VpaidError::UnknownEvent(name)) if name == "AdUserAcceptInvitation"
        ));
    }

    #[test]
    fn test_last_subscription_wins() {
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let mut registry = EventRegistry::new();

        let counter = first.clone();
        registry.subscribe(AdEvent::AdLoaded, Box::new(move |_| counter.set(counter.get() + 1)));
        let counter = second.clone();
        registry.subscribe(AdEvent::AdLoaded, Box::new(move |_| counter.set(counter.get() + 1)));

        assert!(registry.emit(AdEvent::AdLoaded, &EventArgs::None));
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_emit_without_subscriber_is_silent() {
        let mut registry = EventRegistry::new();
        assert!(!registry.emit(AdEvent::AdStopped, &EventArgs::None));

        registry.subscribe(AdEvent::AdStopped, Box::new(|_| {}));
        registry.unsubscribe(AdEvent::AdStopped);
        assert!(!registry.is_subscribed(AdEvent::AdStopped));
        assert!(!registry.emit(AdEvent::AdStopped, &EventArgs::None));
    }
}
