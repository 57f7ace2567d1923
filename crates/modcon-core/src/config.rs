//! Console configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every section has
//! defaults so a partial (or empty) file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collection::FetchKey;

/// Default pacing interval between consecutive mutation requests.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1500;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub deny_reasons: DenyReasonCatalogs,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Minimum spacing between mutation requests, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

fn default_request_delay_ms() -> u64 {
    DEFAULT_REQUEST_DELAY_MS
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

impl DashboardConfig {
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout applied by the transport.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One selectable deny reason.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DenyReason {
    /// Value sent to the backend.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl DenyReason {
    pub fn new(key: &str, name: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Deny reason catalogs for the denial-capable domains.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DenyReasonCatalogs {
    #[serde(default = "default_emoji_reasons")]
    pub emojis: Vec<DenyReason>,
    #[serde(default = "default_bot_reasons")]
    pub bots: Vec<DenyReason>,
    #[serde(default = "default_template_reasons")]
    pub templates: Vec<DenyReason>,
    #[serde(default = "default_sound_reasons")]
    pub sounds: Vec<DenyReason>,
}

impl Default for DenyReasonCatalogs {
    fn default() -> Self {
        Self {
            emojis: default_emoji_reasons(),
            bots: default_bot_reasons(),
            templates: default_template_reasons(),
            sounds: default_sound_reasons(),
        }
    }
}

impl DenyReasonCatalogs {
    /// Catalog for a dataset; `None` for domains that take free text.
    pub fn catalog(&self, key: FetchKey) -> Option<&[DenyReason]> {
        match key {
            FetchKey::Emojis => Some(&self.emojis),
            FetchKey::Bots => Some(&self.bots),
            FetchKey::Templates => Some(&self.templates),
            FetchKey::Sounds => Some(&self.sounds),
            _ => None,
        }
    }
}

fn default_emoji_reasons() -> Vec<DenyReason> {
    vec![
        DenyReason::new(
            "inappropriate-content",
            "Inappropriate Content",
            "The emoji contains sexual, violent or hateful imagery.",
        ),
        DenyReason::new(
            "low-quality",
            "Low Quality",
            "The emoji is blurry, badly cropped or unreadable at small sizes.",
        ),
        DenyReason::new(
            "duplicate",
            "Duplicate",
            "The same emoji has already been published.",
        ),
    ]
}

fn default_bot_reasons() -> Vec<DenyReason> {
    vec![
        DenyReason::new("offline", "Offline", "The bot was offline during review."),
        DenyReason::new(
            "unresponsive",
            "Unresponsive Commands",
            "The bot did not answer its documented commands.",
        ),
        DenyReason::new(
            "copied-bot",
            "Copied Bot",
            "The bot is an unmodified copy of another bot.",
        ),
        DenyReason::new(
            "nsfw-without-gate",
            "Unrestricted NSFW",
            "NSFW commands are usable outside age-restricted channels.",
        ),
    ]
}

fn default_template_reasons() -> Vec<DenyReason> {
    vec![
        DenyReason::new(
            "inappropriate-content",
            "Inappropriate Content",
            "Channel or role names contain offensive content.",
        ),
        DenyReason::new(
            "no-purpose",
            "No Clear Purpose",
            "The template has no meaningful structure.",
        ),
    ]
}

fn default_sound_reasons() -> Vec<DenyReason> {
    vec![
        DenyReason::new(
            "inappropriate-content",
            "Inappropriate Content",
            "The sound contains offensive or disturbing audio.",
        ),
        DenyReason::new(
            "low-quality",
            "Low Quality",
            "The sound is distorted, silent or too loud.",
        ),
        DenyReason::new(
            "copyright",
            "Copyright",
            "The sound is copyrighted material.",
        ),
    ]
}
