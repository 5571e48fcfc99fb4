//! Tunable game configuration: progress limits, phase timings and viewport
//! physics.
//!
//! Every field defaults to the shipped value in [`crate::constants`], so a
//! partial JSON override only needs to name what it changes.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("configuration JSON is malformed: {0}")]
    Parse(String),
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("zoom bounds invalid (min {min:.2} > max {max:.2})")]
    ZoomBounds { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub progress: ProgressLimits,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
}

impl GameConfig {
    /// Parse and validate a configuration override.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed or a value is out of bounds.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.progress.validate()?;
        self.timing.validate()?;
        self.viewport.validate()?;
        Ok(())
    }
}

/// Resource and life limits for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLimits {
    #[serde(default = "ProgressLimits::default_resource_max")]
    pub resource_max: i32,
    #[serde(default = "ProgressLimits::default_lives_max")]
    pub lives_max: u32,
    #[serde(default = "ProgressLimits::default_boss_hit_bonus")]
    pub boss_hit_bonus: i32,
}

impl ProgressLimits {
    const fn default_resource_max() -> i32 {
        constants::RESOURCE_MAX
    }

    const fn default_lives_max() -> u32 {
        constants::LIVES_MAX
    }

    const fn default_boss_hit_bonus() -> i32 {
        constants::BOSS_HIT_BONUS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.resource_max < 1 {
            return Err(ConfigError::MinViolation {
                field: "progress.resource_max",
                min: 1.0,
                value: f64::from(self.resource_max),
            });
        }
        if !(1..=9).contains(&self.lives_max) {
            return Err(ConfigError::RangeViolation {
                field: "progress.lives_max",
                min: 1.0,
                max: 9.0,
                value: f64::from(self.lives_max),
            });
        }
        if self.boss_hit_bonus < 0 {
            return Err(ConfigError::MinViolation {
                field: "progress.boss_hit_bonus",
                min: 0.0,
                value: f64::from(self.boss_hit_bonus),
            });
        }
        Ok(())
    }
}

impl Default for ProgressLimits {
    fn default() -> Self {
        Self {
            resource_max: Self::default_resource_max(),
            lives_max: Self::default_lives_max(),
            boss_hit_bonus: Self::default_boss_hit_bonus(),
        }
    }
}

/// Phase delays and typewriter speeds, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_intro_reveal_ms")]
    pub intro_reveal_ms: u64,
    #[serde(default = "TimingConfig::default_dialogue_reveal_ms")]
    pub dialogue_reveal_ms: u64,
    #[serde(default = "TimingConfig::default_boss_reveal_ms")]
    pub boss_reveal_ms: u64,
    #[serde(default = "TimingConfig::default_feedback_reveal_ms")]
    pub feedback_reveal_ms: u64,
    #[serde(default = "TimingConfig::default_victory_reveal_ms")]
    pub victory_reveal_ms: u64,
    #[serde(default = "TimingConfig::default_quiz_success_delay_ms")]
    pub quiz_success_delay_ms: u64,
    #[serde(default = "TimingConfig::default_quiz_retry_delay_ms")]
    pub quiz_retry_delay_ms: u64,
    #[serde(default = "TimingConfig::default_boss_hit_delay_ms")]
    pub boss_hit_delay_ms: u64,
    #[serde(default = "TimingConfig::default_boss_miss_delay_ms")]
    pub boss_miss_delay_ms: u64,
    #[serde(default = "TimingConfig::default_boss_cutscene_ms")]
    pub boss_cutscene_ms: u64,
    #[serde(default = "TimingConfig::default_victory_pad_ms")]
    pub victory_pad_ms: u64,
    #[serde(default = "TimingConfig::default_advisory_ms")]
    pub advisory_ms: u64,
    #[serde(default = "TimingConfig::default_unlock_notice_delay_ms")]
    pub unlock_notice_delay_ms: u64,
    #[serde(default = "TimingConfig::default_villager_bubble_ms")]
    pub villager_bubble_ms: u64,
    #[serde(default = "TimingConfig::default_villager_chatter_jitter_ms")]
    pub villager_chatter_jitter_ms: u64,
}

impl TimingConfig {
    const fn default_intro_reveal_ms() -> u64 {
        constants::INTRO_REVEAL_INTERVAL_MS
    }

    const fn default_dialogue_reveal_ms() -> u64 {
        constants::DIALOGUE_REVEAL_INTERVAL_MS
    }

    const fn default_boss_reveal_ms() -> u64 {
        constants::BOSS_REVEAL_INTERVAL_MS
    }

    const fn default_feedback_reveal_ms() -> u64 {
        constants::FEEDBACK_REVEAL_INTERVAL_MS
    }

    const fn default_victory_reveal_ms() -> u64 {
        constants::VICTORY_REVEAL_INTERVAL_MS
    }

    const fn default_quiz_success_delay_ms() -> u64 {
        constants::QUIZ_SUCCESS_DELAY_MS
    }

    const fn default_quiz_retry_delay_ms() -> u64 {
        constants::QUIZ_RETRY_DELAY_MS
    }

    const fn default_boss_hit_delay_ms() -> u64 {
        constants::BOSS_HIT_DELAY_MS
    }

    const fn default_boss_miss_delay_ms() -> u64 {
        constants::BOSS_MISS_DELAY_MS
    }

    const fn default_boss_cutscene_ms() -> u64 {
        constants::BOSS_PHASE_CUTSCENE_MS
    }

    const fn default_victory_pad_ms() -> u64 {
        constants::VICTORY_SCREEN_PAD_MS
    }

    const fn default_advisory_ms() -> u64 {
        constants::ADVISORY_DISPLAY_MS
    }

    const fn default_unlock_notice_delay_ms() -> u64 {
        constants::UNLOCK_NOTICE_DELAY_MS
    }

    const fn default_villager_bubble_ms() -> u64 {
        constants::VILLAGER_BUBBLE_MS
    }

    const fn default_villager_chatter_jitter_ms() -> u64 {
        constants::VILLAGER_CHATTER_JITTER_MS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let reveal_speeds = [
            ("timing.intro_reveal_ms", self.intro_reveal_ms),
            ("timing.dialogue_reveal_ms", self.dialogue_reveal_ms),
            ("timing.boss_reveal_ms", self.boss_reveal_ms),
            ("timing.feedback_reveal_ms", self.feedback_reveal_ms),
            ("timing.victory_reveal_ms", self.victory_reveal_ms),
        ];
        for (field, value) in reveal_speeds {
            if value == 0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1.0,
                    value: 0.0,
                });
            }
        }
        if self.advisory_ms == 0 {
            return Err(ConfigError::MinViolation {
                field: "timing.advisory_ms",
                min: 1.0,
                value: 0.0,
            });
        }
        if self.villager_bubble_ms == 0 {
            return Err(ConfigError::MinViolation {
                field: "timing.villager_bubble_ms",
                min: 1.0,
                value: 0.0,
            });
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            intro_reveal_ms: Self::default_intro_reveal_ms(),
            dialogue_reveal_ms: Self::default_dialogue_reveal_ms(),
            boss_reveal_ms: Self::default_boss_reveal_ms(),
            feedback_reveal_ms: Self::default_feedback_reveal_ms(),
            victory_reveal_ms: Self::default_victory_reveal_ms(),
            quiz_success_delay_ms: Self::default_quiz_success_delay_ms(),
            quiz_retry_delay_ms: Self::default_quiz_retry_delay_ms(),
            boss_hit_delay_ms: Self::default_boss_hit_delay_ms(),
            boss_miss_delay_ms: Self::default_boss_miss_delay_ms(),
            boss_cutscene_ms: Self::default_boss_cutscene_ms(),
            victory_pad_ms: Self::default_victory_pad_ms(),
            advisory_ms: Self::default_advisory_ms(),
            unlock_notice_delay_ms: Self::default_unlock_notice_delay_ms(),
            villager_bubble_ms: Self::default_villager_bubble_ms(),
            villager_chatter_jitter_ms: Self::default_villager_chatter_jitter_ms(),
        }
    }
}

/// World size, zoom range and pan physics for the map viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_world_width")]
    pub world_width: f64,
    #[serde(default = "ViewportConfig::default_world_height")]
    pub world_height: f64,
    #[serde(default = "ViewportConfig::default_zoom_min")]
    pub zoom_min: f64,
    #[serde(default = "ViewportConfig::default_zoom_max")]
    pub zoom_max: f64,
    #[serde(default = "ViewportConfig::default_wheel_step")]
    pub wheel_step: f64,
    #[serde(default = "ViewportConfig::default_inertia_decay")]
    pub inertia_decay: f64,
    #[serde(default = "ViewportConfig::default_inertia_stop_speed")]
    pub inertia_stop_speed: f64,
    #[serde(default = "ViewportConfig::default_inertia_launch_speed")]
    pub inertia_launch_speed: f64,
    #[serde(default = "ViewportConfig::default_tap_max_travel_px")]
    pub tap_max_travel_px: f64,
    #[serde(default = "ViewportConfig::default_tap_max_duration_ms")]
    pub tap_max_duration_ms: u64,
}

impl ViewportConfig {
    const fn default_world_width() -> f64 {
        constants::WORLD_WIDTH
    }

    const fn default_world_height() -> f64 {
        constants::WORLD_HEIGHT
    }

    const fn default_zoom_min() -> f64 {
        constants::ZOOM_MIN
    }

    const fn default_zoom_max() -> f64 {
        constants::ZOOM_MAX
    }

    const fn default_wheel_step() -> f64 {
        constants::WHEEL_ZOOM_STEP
    }

    const fn default_inertia_decay() -> f64 {
        constants::INERTIA_DECAY
    }

    const fn default_inertia_stop_speed() -> f64 {
        constants::INERTIA_STOP_SPEED
    }

    const fn default_inertia_launch_speed() -> f64 {
        constants::INERTIA_LAUNCH_SPEED
    }

    const fn default_tap_max_travel_px() -> f64 {
        constants::TAP_MAX_TRAVEL_PX
    }

    const fn default_tap_max_duration_ms() -> u64 {
        constants::TAP_MAX_DURATION_MS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.world_width < 1.0 {
            return Err(ConfigError::MinViolation {
                field: "viewport.world_width",
                min: 1.0,
                value: self.world_width,
            });
        }
        if self.world_height < 1.0 {
            return Err(ConfigError::MinViolation {
                field: "viewport.world_height",
                min: 1.0,
                value: self.world_height,
            });
        }
        if self.zoom_min <= 0.0 {
            return Err(ConfigError::MinViolation {
                field: "viewport.zoom_min",
                min: 0.01,
                value: self.zoom_min,
            });
        }
        if self.zoom_min > self.zoom_max {
            return Err(ConfigError::ZoomBounds {
                min: self.zoom_min,
                max: self.zoom_max,
            });
        }
        if !(0.0..1.0).contains(&self.inertia_decay) {
            return Err(ConfigError::RangeViolation {
                field: "viewport.inertia_decay",
                min: 0.0,
                max: 0.99,
                value: self.inertia_decay,
            });
        }
        if self.inertia_stop_speed <= 0.0 {
            return Err(ConfigError::MinViolation {
                field: "viewport.inertia_stop_speed",
                min: 0.01,
                value: self.inertia_stop_speed,
            });
        }
        if self.wheel_step <= 0.0 {
            return Err(ConfigError::MinViolation {
                field: "viewport.wheel_step",
                min: 0.01,
                value: self.wheel_step,
            });
        }
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            world_width: Self::default_world_width(),
            world_height: Self::default_world_height(),
            zoom_min: Self::default_zoom_min(),
            zoom_max: Self::default_zoom_max(),
            wheel_step: Self::default_wheel_step(),
            inertia_decay: Self::default_inertia_decay(),
            inertia_stop_speed: Self::default_inertia_stop_speed(),
            inertia_launch_speed: Self::default_inertia_launch_speed(),
            tap_max_travel_px: Self::default_tap_max_travel_px(),
            tap_max_duration_ms: Self::default_tap_max_duration_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let json = r#"{ "progress": { "lives_max": 5 }, "timing": { "advisory_ms": 100 } }"#;
        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.progress.lives_max, 5);
        assert_eq!(config.progress.resource_max, constants::RESOURCE_MAX);
        assert_eq!(config.timing.advisory_ms, 100);
        assert_eq!(config.timing.quiz_retry_delay_ms, constants::QUIZ_RETRY_DELAY_MS);
        assert_eq!(config.viewport, ViewportConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(GameConfig::from_json("{}").unwrap(), GameConfig::default());
    }

    #[test]
    fn lives_out_of_range_is_rejected() {
        let err = GameConfig::from_json(r#"{ "progress": { "lives_max": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation { field, .. } if field == "progress.lives_max"
        ));
    }

    #[test]
    fn inverted_zoom_bounds_are_rejected() {
        let err = GameConfig::from_json(r#"{ "viewport": { "zoom_min": 3.0, "zoom_max": 2.0 } }"#)
            .unwrap_err();
        assert_eq!(err, ConfigError::ZoomBounds { min: 3.0, max: 2.0 });
    }

    #[test]
    fn zero_reveal_speed_is_rejected() {
        let err = GameConfig::from_json(r#"{ "timing": { "boss_reveal_ms": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MinViolation { field, .. } if field == "timing.boss_reveal_ms"
        ));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = GameConfig::from_json("[").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("configuration JSON is malformed"));
    }

    #[test]
    fn range_violation_message_formats_bounds() {
        let err = ConfigError::RangeViolation {
            field: "viewport.inertia_decay",
            min: 0.0,
            max: 0.99,
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "viewport.inertia_decay must be between 0.00 and 0.99 (got 1.50)"
        );
    }
}
