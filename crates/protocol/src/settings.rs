use crate::comment::SourcePlatform;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display-area cap the auto-filter heuristic tightens to.
pub const AUTO_FILTER_DISPLAY_AREA_PERCENT: u32 = 50;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("invalid value for option {key}: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("option {key} out of range: {message}")]
    InvalidRange { key: &'static str, message: String },
}

/// Flat options owned by the host client. The core reads these; the only
/// sanctioned mutation path besides [`Settings::set_option`] is the
/// auto-filter override scope ([`AutoFilterOverride`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Global offset added to every raw comment time. May be negative.
    pub time_offset_seconds: f64,

    /// Append a human-readable source suffix to displayed text.
    pub show_source: bool,

    /// Comment font size in pixels.
    pub font_size: f32,

    /// Scroll speed as a percentage of the base speed.
    pub speed_percent: u32,

    /// Vertical share of the container comments may occupy, 1-100.
    pub display_area_percent: u32,

    /// Density filter level 0-3; the per-second cap is `9 - 2 * level`
    /// and level 0 disables the cap.
    pub density_level: u8,

    /// Type filter: blocked display modes.
    pub block_scroll: bool,
    pub block_top: bool,
    pub block_bottom: bool,

    /// Type filter: drop comments whose color differs from default white.
    pub block_colored: bool,

    /// Source filter: platforms whose comments are dropped.
    pub blocked_sources: Vec<SourcePlatform>,

    /// Keyword filter: newline-delimited patterns, each tried as a regex
    /// and falling back to substring containment.
    pub keyword_blocklist: String,

    /// Similarity merge toggle and parameters.
    pub merge_enabled: bool,
    /// Similarity threshold, 0-100.
    pub merge_threshold: u8,
    /// Candidate window in seconds.
    pub merge_time_window_seconds: f64,

    /// Anti-overlap lane scheduling toggle.
    pub lanes_enabled: bool,

    /// Auto-filter heuristic: when the incoming count exceeds the
    /// threshold, three settings are temporarily tightened.
    pub auto_filter_enabled: bool,
    pub auto_filter_threshold: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_offset_seconds: 0.0,
            show_source: false,
            font_size: 25.0,
            speed_percent: 100,
            display_area_percent: 100,
            density_level: 0,
            block_scroll: false,
            block_top: false,
            block_bottom: false,
            block_colored: false,
            blocked_sources: Vec::new(),
            keyword_blocklist: String::new(),
            merge_enabled: false,
            merge_threshold: 90,
            merge_time_window_seconds: 10.0,
            lanes_enabled: true,
            auto_filter_enabled: true,
            auto_filter_threshold: 10_000,
        }
    }
}

impl Settings {
    /// Validate ranges. Call after bulk deserialization from the host.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.density_level > 3 {
            return Err(SettingsError::InvalidRange {
                key: "density_level",
                message: format!("must be 0-3, got {}", self.density_level),
            });
        }
        if self.merge_threshold > 100 {
            return Err(SettingsError::InvalidRange {
                key: "merge_threshold",
                message: format!("must be 0-100, got {}", self.merge_threshold),
            });
        }
        if self.display_area_percent == 0 || self.display_area_percent > 100 {
            return Err(SettingsError::InvalidRange {
                key: "display_area_percent",
                message: format!("must be 1-100, got {}", self.display_area_percent),
            });
        }
        if self.speed_percent == 0 {
            return Err(SettingsError::InvalidRange {
                key: "speed_percent",
                message: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Flat key-value read. Keys are the field names; the host persists
    /// them however it likes.
    #[must_use]
    pub fn get_option(&self, key: &str) -> Option<serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// Flat key-value write. Unknown keys and type mismatches are
    /// reported, not silently ignored.
    pub fn set_option(
        &mut self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SettingsError> {
        let mut map = match serde_json::to_value(&*self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return Err(SettingsError::UnknownOption(key.to_string())),
        };
        if !map.contains_key(key) {
            return Err(SettingsError::UnknownOption(key.to_string()));
        }
        map.insert(key.to_string(), value);
        *self = serde_json::from_value(serde_json::Value::Object(map)).map_err(|source| {
            SettingsError::InvalidValue {
                key: key.to_string(),
                source,
            }
        })?;
        Ok(())
    }
}

/// Explicit override scope for the auto-filter heuristic: captures the
/// prior values on entry, tightens the live settings, and restores them
/// at exactly one teardown point (playback stop).
#[derive(Debug, Clone, PartialEq)]
pub struct AutoFilterOverride {
    prev_display_area_percent: u32,
    prev_block_bottom: bool,
    prev_merge_enabled: bool,
}

impl AutoFilterOverride {
    /// Capture prior values and tighten: cap the display area, exclude
    /// bottom-pinned comments, force-enable similarity merge.
    pub fn engage(settings: &mut Settings) -> Self {
        let scope = Self {
            prev_display_area_percent: settings.display_area_percent,
            prev_block_bottom: settings.block_bottom,
            prev_merge_enabled: settings.merge_enabled,
        };
        settings.display_area_percent = settings
            .display_area_percent
            .min(AUTO_FILTER_DISPLAY_AREA_PERCENT);
        settings.block_bottom = true;
        settings.merge_enabled = true;
        scope
    }

    /// Put the captured values back. Consumes the scope so a double
    /// restore cannot compile.
    pub fn restore(self, settings: &mut Settings) {
        settings.display_area_percent = self.prev_display_area_percent;
        settings.block_bottom = self.prev_block_bottom;
        settings.merge_enabled = self.prev_merge_enabled;
    }
}
