use crate::config::AdConfig;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a creative instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdState {
    Created,
    Initialized,
    Started,
    Paused,
    Stopped,
}

/// The view mode a player reports for the ad slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Normal,
    Fullscreen,
    Thumbnail,
    /// Any mode outside the VPAID 2.0 list, kept verbatim
    Other(String),
}

impl FromStr for ViewMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "normal" => Self::Normal,
            "fullscreen" => Self::Fullscreen,
            "thumbnail" => Self::Thumbnail,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Fullscreen => f.write_str("fullscreen"),
            Self::Thumbnail => f.write_str("thumbnail"),
            Self::Other(mode) => f.write_str(mode),
        }
    }
}

impl From<&str> for ViewMode {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(mode) => mode,
            Err(never) => match never {},
        }
    }
}

/// The readable (and partly writable) VPAID attributes of an ad
#[derive(Debug, Clone, PartialEq)]
pub struct AdAttributes {
    /// Companion ads as a VAST XML fragment
    pub companions: String,

    /// The bitrate requested by the player, in kbps
    pub desired_bitrate: u32,

    /// Ad duration in seconds
    pub duration: f64,

    /// Whether the ad is currently expanded
    pub expanded: bool,

    /// Ad height in pixels
    pub height: u32,

    /// Icon definitions
    pub icons: String,

    /// Always false for a non-linear creative
    pub linear: bool,

    /// Whether the ad can currently be skipped
    pub skippable_state: bool,

    /// The player's view mode
    pub view_mode: ViewMode,

    /// Ad width in pixels
    pub width: u32,

    /// Volume as given by the player, nominally 0.0 to 1.0
    pub volume: f64,

    /// Remaining playback time derived from the video element, in seconds
    pub remaining_time: Option<f64>,
}

impl AdAttributes {
    pub fn from_config(config: &AdConfig) -> Self {
        Self {
            companions: String::new(),
            desired_bitrate: config.default_desired_bitrate,
            duration: config.default_duration,
            expanded: false,
            height: 0,
            icons: String::new(),
            linear: false,
            skippable_state: config.skippable,
            view_mode: ViewMode::Normal,
            width: 0,
            volume: config.default_volume,
            remaining_time: None,
        }
    }
}

impl Default for AdAttributes {
    fn default() -> Self {
        Self::from_config(&AdConfig::default())
    }
}

/// Data associated with the creative, as handed over by the player
#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
pub struct CreativeData {
    /// The raw `AdParameters` text from the VAST response
    #[serde(rename = "AdParameters")]
    pub ad_parameters: String,
}

impl CreativeData {
    pub fn new(ad_parameters: impl Into<String>) -> Self {
        Self {
            ad_parameters: ad_parameters.into(),
        }
    }
}

/// Parsed `AdParameters` payload
///
/// Only malformed JSON is an error. Fields of an unexpected type, or a
/// payload that is not an object at all, read as absent.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct AdParameters {
    /// Overlay assets, first one wins
    pub overlays: Vec<Overlay>,

    /// Click-through destination
    pub gourl: Option<String>,
}

impl AdParameters {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let overlays = match value.get("overlays") {
            Some(Value::Array(entries)) => entries.iter().map(Overlay::from_value).collect(),
            _ => Vec::new(),
        };

        Self {
            overlays,
            gourl: value.get("gourl").and_then(lenient_string),
        }
    }

    pub fn first_overlay(&self) -> Option<&Overlay> {
        self.overlays.first()
    }
}

/// Read a scalar as text; null, false and containers read as absent
fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// A single overlay entry
///
/// Banner creatives list bare image URLs while text creatives list objects.
#[derive(Debug, PartialEq, Clone)]
pub enum Overlay {
    Image(String),
    Text {
        image: Option<String>,
        title: Option<String>,
        description: Option<String>,
    },
}

impl Overlay {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(fields) => Self::Text {
                image: fields.get("image").and_then(lenient_string),
                title: fields.get("title").and_then(lenient_string),
                description: fields.get("description").and_then(lenient_string),
            },
            other => Self::Image(lenient_string(other).unwrap_or_default()),
        }
    }

    pub fn image(&self) -> Option<&str> {
        match self {
            Self::Image(url) => Some(url),
            Self::Text { image, .. } => image.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Image(_) => None,
            Self::Text { title, .. } => title.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Image(_) => None,
            Self::Text { description, .. } => description.as_deref(),
        }
    }
}
