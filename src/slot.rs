use crate::creative::Creative;
use std::cell::RefCell;
use std::rc::Rc;

/// The container element the player reserves for the ad
pub trait AdSlot {
    /// Attach rendered creative markup to the container
    fn mount(&mut self, creative: &Creative);
}

/// The video element the player lends to the ad
pub trait VideoSlot {
    /// Playback position in seconds
    fn current_time(&self) -> f64;

    /// Media duration in seconds, 0 or NaN while unknown
    fn duration(&self) -> f64;

    fn play(&mut self);

    fn pause(&mut self);

    fn set_size(&mut self, width: u32, height: u32);
}

/// Runtime variables associated with the creative
///
/// Both elements belong to the player; the ad only keeps shared handles.
#[derive(Clone)]
pub struct EnvironmentVars {
    pub slot: Rc<RefCell<dyn AdSlot>>,
    pub video_slot: Rc<RefCell<dyn VideoSlot>>,
}

impl EnvironmentVars {
    pub fn new(slot: Rc<RefCell<dyn AdSlot>>, video_slot: Rc<RefCell<dyn VideoSlot>>) -> Self {
        Self { slot, video_slot }
    }
}

impl std::fmt::Debug for EnvironmentVars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentVars").finish_non_exhaustive()
    }
}

/// Ad slot that keeps every mounted creative's markup
#[derive(Debug, Default, Clone)]
pub struct MarkupSlot {
    pub mounted: Vec<String>,
}

impl AdSlot for MarkupSlot {
    fn mount(&mut self, creative: &Creative) {
        self.mounted.push(creative.markup.clone());
    }
}

/// Video element stand-in whose position is set by the host
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedVideo {
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
    pub width: u32,
    pub height: u32,
}

impl SimulatedVideo {
    pub fn new(duration: f64) -> Self {
        Self {
            current_time: 0.0,
            duration,
            paused: true,
            width: 0,
            height: 0,
        }
    }

    /// Move the playhead, clamped to the media duration
    pub fn seek(&mut self, to: f64) {
        self.current_time = to.clamp(0.0, self.duration.max(0.0));
    }
}

impl VideoSlot for SimulatedVideo {
    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}
