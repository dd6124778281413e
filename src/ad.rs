use crate::clock::{Clock, SystemClock};
use crate::config::AdConfig;
use crate::creative::{self, CreativeKind};
use crate::error::Result;
use crate::events::{AdEvent, EventArgs, EventRegistry};
use crate::models::{AdAttributes, AdParameters, AdState, CreativeData, ViewMode};
use crate::quartile::QuartileTracker;
use crate::scheduler::Scheduler;
use crate::slot::EnvironmentVars;
use std::rc::Rc;
use std::time::Duration;

/// The VPAID version every creative in this crate speaks
pub const VPAID_VERSION: &str = "2.0";

/// A non-linear VPAID ad which can hand over to linear playback
///
/// Calls made in a state where they make no sense are logged and ignored;
/// the only error a player sees from the lifecycle is malformed ad
/// parameters in [`VpaidNonLinear::init_ad`].
pub struct VpaidNonLinear {
    kind: CreativeKind,
    config: AdConfig,
    clock: Rc<dyn Clock>,
    scheduler: Scheduler<VpaidNonLinear>,
    state: AdState,
    attributes: AdAttributes,
    environment: Option<EnvironmentVars>,
    parameters: AdParameters,
    events: EventRegistry,
    quartiles: QuartileTracker,
    start_time: Duration,
    stop_pending: bool,
}

/// Build a banner creative with default settings
pub fn get_vpaid_ad() -> VpaidNonLinear {
    VpaidNonLinear::new(
        CreativeKind::Banner,
        AdConfig::default(),
        Rc::new(SystemClock::new()),
    )
}

impl VpaidNonLinear {
    pub fn new(kind: CreativeKind, config: AdConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            kind,
            attributes: AdAttributes::from_config(&config),
            config,
            scheduler: Scheduler::new(clock.clone()),
            clock,
            state: AdState::Created,
            environment: None,
            parameters: AdParameters::default(),
            events: EventRegistry::new(),
            quartiles: QuartileTracker::new(),
            start_time: Duration::ZERO,
            stop_pending: false,
        }
    }

    /// Handle to the queue of deferred work for this ad
    ///
    /// The host drives it with [`Scheduler::run_due`]. Event callbacks that
    /// need to call back into the ad queue the call here instead, through
    /// [`Scheduler::downgrade`]: a strong handle captured by a task that
    /// never runs keeps the whole queue alive.
    pub fn scheduler(&self) -> Scheduler<VpaidNonLinear> {
        self.scheduler.clone()
    }

    pub fn state(&self) -> AdState {
        self.state
    }

    pub fn attributes(&self) -> &AdAttributes {
        &self.attributes
    }

    pub fn parameters(&self) -> &AdParameters {
        &self.parameters
    }

    pub fn handshake_version(&self, version: &str) -> &'static str {
        log::debug!("handshakeVersion {}", version);
        VPAID_VERSION
    }

    pub fn init_ad(
        &mut self,
        width: u32,
        height: u32,
        view_mode: impl Into<ViewMode>,
        desired_bitrate: u32,
        creative_data: &CreativeData,
        environment_vars: EnvironmentVars,
    ) -> Result<()> {
        if !self.expect_state("initAd", &[AdState::Created]) {
            return Ok(());
        }

        self.parameters = AdParameters::from_json(&creative_data.ad_parameters)?;

        let view_mode = view_mode.into();
        log::debug!("initAd {}x{} {} {}", width, height, view_mode, desired_bitrate);

        self.attributes.width = width;
        self.attributes.height = height;
        self.attributes.view_mode = view_mode;
        self.attributes.desired_bitrate = desired_bitrate;
        self.environment = Some(environment_vars);
        self.state = AdState::Initialized;

        self.emit(AdEvent::AdLoaded);
        Ok(())
    }

    pub fn start_ad(&mut self) -> Result<()> {
        if !self.expect_state("startAd", &[AdState::Initialized]) {
            return Ok(());
        }
        log::debug!("Starting ad");

        let creative = creative::render(self.kind, &self.parameters)?;
        if let Some(env) = &self.environment {
            env.slot.borrow_mut().mount(&creative);
        }

        self.start_time = self.clock.now();
        self.state = AdState::Started;

        self.emit(AdEvent::AdStarted);
        self.emit(AdEvent::AdImpression);
        Ok(())
    }

    /// Stop the ad; `AdStopped` follows after the configured delay
    pub fn stop_ad(&mut self) {
        if !self.expect_state("stopAd", &[AdState::Started, AdState::Paused]) {
            return;
        }
        if self.stop_pending {
            log::warn!("stopAd ignored: AdStopped already scheduled");
            return;
        }
        log::debug!("Stopping ad");

        self.stop_pending = true;
        self.scheduler
            .defer(self.config.stop_delay(), VpaidNonLinear::finish);
    }

    pub fn pause_ad(&mut self) {
        if !self.expect_state("pauseAd", &[AdState::Started]) {
            return;
        }
        log::debug!("pauseAd");

        if let Some(env) = &self.environment {
            env.video_slot.borrow_mut().pause();
        }
        self.state = AdState::Paused;
        self.emit(AdEvent::AdPaused);
    }

    pub fn resume_ad(&mut self) {
        if !self.expect_state("resumeAd", &[AdState::Paused]) {
            return;
        }
        log::debug!("resumeAd");

        if let Some(env) = &self.environment {
            env.video_slot.borrow_mut().play();
        }
        self.state = AdState::Started;
        self.emit(AdEvent::AdPlaying);
    }

    pub fn resize_ad(&mut self, width: u32, height: u32, view_mode: impl Into<ViewMode>) {
        if !self.expect_state("resizeAd", &[AdState::Started, AdState::Paused]) {
            return;
        }
        let view_mode = view_mode.into();
        log::debug!("resizeAd {}x{} {}", width, height, view_mode);

        self.attributes.width = width;
        self.attributes.height = height;
        self.attributes.view_mode = view_mode;
        if let Some(env) = &self.environment {
            env.video_slot.borrow_mut().set_size(width, height);
        }
        self.emit(AdEvent::AdSizeChange);
    }

    pub fn expand_ad(&mut self) {
        log::debug!("expandAd");
        self.attributes.expanded = true;
        self.emit(AdEvent::AdExpanded);
    }

    /// Collapse the ad. Players do not expect an event for this.
    pub fn collapse_ad(&mut self) {
        log::debug!("collapseAd");
        self.attributes.expanded = false;
    }

    pub fn skip_ad(&mut self) {
        log::debug!("skipAd");
        if self.attributes.skippable_state {
            self.emit(AdEvent::AdSkipped);
        }
    }

    /// Store the volume as given and report the change
    pub fn set_ad_volume(&mut self, value: f64) {
        log::debug!("setAdVolume {}", value);
        self.attributes.volume = value;
        self.emit(AdEvent::AdVolumeChange);
    }

    /// Bind `callback` to `event`, replacing any earlier binding
    pub fn subscribe(&mut self, event: AdEvent, callback: impl FnMut(&EventArgs) + 'static) {
        log::debug!("Subscribe {}", event);
        self.events.subscribe(event, Box::new(callback));
    }

    /// Like [`subscribe`](Self::subscribe), by VPAID event name
    pub fn subscribe_named(
        &mut self,
        event_name: &str,
        callback: impl FnMut(&EventArgs) + 'static,
    ) -> Result<()> {
        let event = event_name.parse::<AdEvent>().inspect_err(|_| {
            log::warn!("Refusing subscription to unknown event {}", event_name);
        })?;
        self.subscribe(event, callback);
        Ok(())
    }

    pub fn unsubscribe(&mut self, event: AdEvent) {
        log::debug!("unsubscribe {}", event);
        self.events.unsubscribe(event);
    }

    /// Playback progress notification from the video element
    pub fn on_time_update(&mut self) {
        let Some(env) = &self.environment else {
            log::warn!("timeupdate ignored: ad not initialized");
            return;
        };
        let (current_time, duration) = {
            let video = env.video_slot.borrow();
            (video.current_time(), video.duration())
        };

        if !self.quartiles.is_complete() {
            let percent_played = current_time * 100.0 / duration;
            if let Some(event) = self.quartiles.advance(percent_played) {
                self.emit(event);
            }
        }

        if duration > 0.0 {
            self.attributes.remaining_time = Some(duration - current_time);
        }
    }

    /// The video element now knows its duration
    pub fn on_loaded_metadata(&mut self) {
        let Some(env) = &self.environment else {
            log::warn!("loadedmetadata ignored: ad not initialized");
            return;
        };
        let duration = env.video_slot.borrow().duration();

        self.attributes.duration = duration;
        self.emit(AdEvent::AdDurationChange);
    }

    /// The viewer clicked the overlay's linear affordance
    ///
    /// The ad stops shortly after so the player can take over with its own
    /// linear ad.
    pub fn on_linear_click(&mut self) {
        if !self.expect_state("linear click", &[AdState::Started, AdState::Paused]) {
            return;
        }
        log::debug!("Linear affordance clicked");
        self.scheduler
            .defer(self.config.linear_transition_delay(), VpaidNonLinear::finish);
    }

    /// The viewer clicked the ad body
    pub fn on_click_through(&mut self) {
        self.emit_with(
            AdEvent::AdClickThru,
            EventArgs::ClickThru {
                url: String::new(),
                id: "0".to_string(),
                player_handles: true,
            },
        );
    }

    pub fn get_ad_linear(&self) -> bool {
        self.attributes.linear
    }

    pub fn get_ad_width(&self) -> u32 {
        self.attributes.width
    }

    pub fn get_ad_height(&self) -> u32 {
        self.attributes.height
    }

    pub fn get_ad_view_mode(&self) -> &ViewMode {
        &self.attributes.view_mode
    }

    pub fn get_ad_desired_bitrate(&self) -> u32 {
        self.attributes.desired_bitrate
    }

    pub fn get_ad_expanded(&self) -> bool {
        log::debug!("getAdExpanded");
        self.attributes.expanded
    }

    pub fn get_ad_skippable_state(&self) -> bool {
        log::debug!("getAdSkippableState");
        self.attributes.skippable_state
    }

    /// Seconds left, measured on the wall clock since `startAd`
    pub fn get_ad_remaining_time(&self) -> f64 {
        let elapsed = self.clock.now().saturating_sub(self.start_time);
        self.attributes.duration - elapsed.as_secs_f64()
    }

    /// Seconds left according to the video element's playhead
    pub fn playback_remaining_time(&self) -> Option<f64> {
        self.attributes.remaining_time
    }

    pub fn get_ad_duration(&self) -> f64 {
        self.attributes.duration
    }

    pub fn get_ad_volume(&self) -> f64 {
        log::debug!("getAdVolume");
        self.attributes.volume
    }

    pub fn get_ad_companions(&self) -> &str {
        &self.attributes.companions
    }

    pub fn get_ad_icons(&self) -> &str {
        &self.attributes.icons
    }

    /// Deferred end of the ad. Only the first stop to fire is reported.
    fn finish(&mut self) {
        if self.state == AdState::Stopped {
            return;
        }
        self.state = AdState::Stopped;
        self.stop_pending = false;
        self.emit(AdEvent::AdStopped);
    }

    fn emit(&mut self, event: AdEvent) {
        self.emit_with(event, EventArgs::None);
    }

    fn emit_with(&mut self, event: AdEvent, args: EventArgs) {
        if !self.events.emit(event, &args) {
            log::trace!("{} has no subscriber", event);
        }
    }

    fn expect_state(&self, call: &str, allowed: &[AdState]) -> bool {
        if allowed.contains(&self.state) {
            true
        } else {
            log::warn!("{} ignored in state {:?}", call, self.state);
            false
        }
    }
}

impl std::fmt::Debug for VpaidNonLinear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VpaidNonLinear")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("attributes", &self.attributes)
            .field("events", &self.events)
            .field("quartiles", &self.quartiles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::slot::{MarkupSlot, SimulatedVideo};
    use std::cell::RefCell;

    fn initialized(clock: &ManualClock) -> (VpaidNonLinear, Rc<RefCell<SimulatedVideo>>) {
        let video = Rc::new(RefCell::new(SimulatedVideo::new(20.0)));
        let mut ad = VpaidNonLinear::new(
            CreativeKind::Banner,
            AdConfig::default(),
            Rc::new(clock.clone()),
        );
        ad.init_ad(
            300,
            250,
            "normal",
            500,
            &CreativeData::new(r#"{"gourl": "https://example.com/"}"#),
            EnvironmentVars::new(Rc::new(RefCell::new(MarkupSlot::default())), video.clone()),
        )
        .unwrap();
        (ad, video)
    }

    #[test]
    fn test_handshake_is_fixed() {
        assert_eq!(get_vpaid_ad().handshake_version("1.0"), "2.0");
        assert_eq!(get_vpaid_ad().handshake_version("3.0"), VPAID_VERSION);
    }

    #[test]
    fn test_defaults_before_init() {
        let ad = get_vpaid_ad();
        assert_eq!(ad.state(), AdState::Created);
        assert_eq!(ad.get_ad_duration(), 10.0);
        assert_eq!(ad.get_ad_desired_bitrate(), 256);
        assert_eq!(ad.get_ad_volume(), 1.0);
        assert!(!ad.get_ad_linear());
        assert!(!ad.get_ad_skippable_state());
        assert_eq!(ad.get_ad_companions(), "");
        assert_eq!(ad.get_ad_icons(), "");
    }

    #[test]
    fn test_calls_out_of_order_are_ignored() {
        let clock = ManualClock::new();
        let mut ad = get_vpaid_ad();
        ad.pause_ad();
        ad.stop_ad();
        ad.start_ad().unwrap();
        assert_eq!(ad.state(), AdState::Created);

        let (mut ad, video) = initialized(&clock);
        ad.resume_ad();
        ad.resize_ad(1, 1, "normal");
        assert_eq!(ad.state(), AdState::Initialized);
        assert_eq!(ad.get_ad_width(), 300);
        assert!(video.borrow().paused);
    }

    #[test]
    fn test_pause_and_resume_drive_video() {
        let clock = ManualClock::new();
        let (mut ad, video) = initialized(&clock);
        ad.start_ad().unwrap();

        ad.pause_ad();
        assert_eq!(ad.state(), AdState::Paused);
        assert!(video.borrow().paused);

        ad.resume_ad();
        assert_eq!(ad.state(), AdState::Started);
        assert!(!video.borrow().paused);
    }

    #[test]
    fn test_remaining_time_follows_wall_clock() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(100));
        let (mut ad, video) = initialized(&clock);
        ad.start_ad().unwrap();

        clock.advance(Duration::from_millis(2500));
        assert!((ad.get_ad_remaining_time() - 7.5).abs() < 1e-9);

        // Playhead-derived figure is independent
        video.borrow_mut().seek(15.0);
        ad.on_time_update();
        assert_eq!(ad.playback_remaining_time(), Some(5.0));
    }

    #[test]
    fn test_init_keeps_parsed_parameters() {
        let clock = ManualClock::new();
        let (ad, _video) = initialized(&clock);
        assert_eq!(ad.parameters().gourl.as_deref(), Some("https://example.com/"));
        assert!(ad.parameters().overlays.is_empty());
    }

    #[test]
    fn test_loaded_metadata_updates_duration() {
        let clock = ManualClock::new();
        let (mut ad, _video) = initialized(&clock);
        ad.on_loaded_metadata();
        assert_eq!(ad.get_ad_duration(), 20.0);
    }

    #[test]
    fn test_unknown_duration_leaves_remaining_time_unset() {
        let clock = ManualClock::new();
        let (mut ad, video) = initialized(&clock);
        video.borrow_mut().duration = 0.0;
        ad.on_time_update();
        assert_eq!(ad.playback_remaining_time(), None);
    }
}
