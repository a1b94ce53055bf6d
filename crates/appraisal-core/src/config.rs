//! Configuration loading and typed config structures for the Appraisal game.
//!
//! The canonical configuration lives in `appraisal-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every field has a default matching the shipped exhibition build, so an
//! empty or partial file is accepted.
//!
//! Misconfiguration (an empty slider range, a sampling range that escapes
//! the slider, probabilities outside `[0, 1]`) is rejected here, at load
//! time, and never surfaces during play.

use std::cmp::Ordering;
use std::path::Path;

use appraisal_types::SliderBounds;
use serde::Deserialize;

/// Environment variable that overrides [`RoundConfig::duration_sec`].
pub const DURATION_ENV_VAR: &str = "APPRAISAL_DURATION_SEC";

/// Tolerance used when counting whole steps in the slider range.
const GRID_EPSILON: f64 = 1e-9;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but violates an invariant.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `appraisal-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Round length and RNG seeding.
    #[serde(default)]
    pub game: RoundConfig,

    /// Value selector domain and stepping.
    #[serde(default)]
    pub slider: SliderConfig,

    /// Range the hidden target is drawn from.
    #[serde(default)]
    pub target: TargetConfig,

    /// Ambient notification spawner parameters.
    #[serde(default)]
    pub ambient: AmbientConfig,

    /// Summary text settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// `APPRAISAL_DURATION_SEC` overrides `game.duration_sec` when set to a
    /// valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.game.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every cross-field invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.slider.validate()?;
        self.target.validate(&self.slider)?;
        self.ambient.validate()
    }
}

/// Round-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoundConfig {
    /// Countdown length in seconds.
    #[serde(default = "default_duration_sec")]
    pub duration_sec: u32,

    /// Fixed RNG seed. When absent the OS entropy source is used.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RoundConfig {
    /// Override the duration from `APPRAISAL_DURATION_SEC` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(DURATION_ENV_VAR) {
            match val.trim().parse::<u32>() {
                Ok(secs) => self.duration_sec = secs,
                Err(e) => tracing::warn!(
                    value = %val,
                    error = %e,
                    "ignoring non-numeric {DURATION_ENV_VAR}"
                ),
            }
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration_sec: default_duration_sec(),
            seed: None,
        }
    }
}

/// Value selector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SliderConfig {
    /// Lower bound (inclusive).
    #[serde(default = "default_slider_min")]
    pub min: f64,

    /// Upper bound (inclusive). Must be strictly greater than `min`.
    #[serde(default = "default_slider_max")]
    pub max: f64,

    /// Quantization step measured from `min`. Must be positive.
    #[serde(default = "default_slider_step")]
    pub step: f64,

    /// Increment applied by arrow keys, independent of `step`. The result
    /// is re-quantized; a press always moves at least one grid step.
    #[serde(default = "default_keyboard_step")]
    pub keyboard_step: f64,
}

impl SliderConfig {
    /// The legal domain as a shared record.
    pub const fn bounds(&self) -> SliderBounds {
        SliderBounds {
            min: self.min,
            max: self.max,
            step: self.step,
        }
    }

    /// Number of whole steps between `min` and `max`.
    ///
    /// The top of the grid is `min + max_index * step`, which equals `max`
    /// whenever the range is a multiple of the step.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn max_index(&self) -> u64 {
        let steps = ((self.max - self.min) / self.step + GRID_EPSILON).floor();
        if steps.is_finite() && steps > 0.0 {
            // Saturating float-to-int conversion.
            steps as u64
        } else {
            0
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid("slider bounds must be finite"));
        }
        if self.max.partial_cmp(&self.min) != Some(Ordering::Greater) {
            return Err(invalid(format!(
                "slider.max ({}) must be greater than slider.min ({})",
                self.max, self.min
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(invalid("slider.step must be positive"));
        }
        if self.step > self.max - self.min {
            return Err(invalid("slider.step must not exceed the slider range"));
        }
        if !(self.keyboard_step.is_finite() && self.keyboard_step > 0.0) {
            return Err(invalid("slider.keyboard_step must be positive"));
        }
        Ok(())
    }
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            min: default_slider_min(),
            max: default_slider_max(),
            step: default_slider_step(),
            keyboard_step: default_keyboard_step(),
        }
    }
}

/// Sampling range of the hidden target (integers, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TargetConfig {
    /// Smallest target that can be drawn.
    #[serde(default = "default_target_min")]
    pub min: i64,

    /// Largest target that can be drawn.
    #[serde(default = "default_target_max")]
    pub max: i64,
}

impl TargetConfig {
    #[allow(clippy::cast_precision_loss)]
    fn validate(&self, slider: &SliderConfig) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(invalid("target.min must not exceed target.max"));
        }
        if (self.min as f64) <= slider.min || (self.max as f64) >= slider.max {
            return Err(invalid(format!(
                "target range [{}, {}] must lie strictly inside the slider range [{}, {}]",
                self.min, self.max, slider.min, slider.max
            )));
        }
        Ok(())
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            min: default_target_min(),
            max: default_target_max(),
        }
    }
}

/// A closed `[min, max]` range of viewport percentages.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PercentRange {
    /// Lower end.
    pub min: f64,
    /// Upper end.
    pub max: f64,
}

impl PercentRange {
    /// Construct a range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(invalid(format!("ambient.{name} must be an ordered finite range")));
        }
        Ok(())
    }
}

/// Ambient notification configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AmbientConfig {
    /// Remaining seconds at or below which notifications start. `0`
    /// disables the spawner.
    #[serde(default = "default_threshold_sec")]
    pub threshold_sec: u32,

    /// Interval between batches once active.
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,

    /// Probability that a batch holds a single item (otherwise two).
    #[serde(default = "default_single_probability")]
    pub single_probability: f64,

    /// Upper bound of the random delay before a batch's second item.
    #[serde(default = "default_follow_up_max_delay_ms")]
    pub follow_up_max_delay_ms: u64,

    /// How long each item stays on screen.
    #[serde(default = "default_lifetime_ms")]
    pub lifetime_ms: u64,

    /// Probability that an item uses the small size variant.
    #[serde(default = "default_small_probability")]
    pub small_probability: f64,

    /// Rotation is drawn from `[-max_rotation_deg, max_rotation_deg)`.
    #[serde(default = "default_max_rotation_deg")]
    pub max_rotation_deg: f64,

    /// Vertical position range, shared by both sides.
    #[serde(default = "default_top_percent")]
    pub top_percent: PercentRange,

    /// Horizontal position range for left-side items.
    #[serde(default = "default_left_side_percent")]
    pub left_side_percent: PercentRange,

    /// Horizontal position range for right-side items.
    #[serde(default = "default_right_side_percent")]
    pub right_side_percent: PercentRange,

    /// Message pool the item text is drawn from.
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,
}

impl AmbientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_interval_ms == 0 {
            return Err(invalid("ambient.batch_interval_ms must be at least 1"));
        }
        for (name, p) in [
            ("single_probability", self.single_probability),
            ("small_probability", self.small_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("ambient.{name} must be within [0, 1]")));
            }
        }
        if !(self.max_rotation_deg.is_finite() && self.max_rotation_deg >= 0.0) {
            return Err(invalid("ambient.max_rotation_deg must be non-negative"));
        }
        self.top_percent.validate("top_percent")?;
        self.left_side_percent.validate("left_side_percent")?;
        self.right_side_percent.validate("right_side_percent")?;
        if self.messages.is_empty() {
            return Err(invalid("ambient.messages must not be empty"));
        }
        Ok(())
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            threshold_sec: default_threshold_sec(),
            batch_interval_ms: default_batch_interval_ms(),
            single_probability: default_single_probability(),
            follow_up_max_delay_ms: default_follow_up_max_delay_ms(),
            lifetime_ms: default_lifetime_ms(),
            small_probability: default_small_probability(),
            max_rotation_deg: default_max_rotation_deg(),
            top_percent: default_top_percent(),
            left_side_percent: default_left_side_percent(),
            right_side_percent: default_right_side_percent(),
            messages: default_messages(),
        }
    }
}

/// Display configuration for the end-of-round summary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// Currency unit appended to amounts.
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_duration_sec() -> u32 {
    60
}

const fn default_slider_min() -> f64 {
    0.0
}

const fn default_slider_max() -> f64 {
    12_000.0
}

const fn default_slider_step() -> f64 {
    1.0
}

const fn default_keyboard_step() -> f64 {
    50.0
}

const fn default_target_min() -> i64 {
    800
}

const fn default_target_max() -> i64 {
    11_200
}

const fn default_threshold_sec() -> u32 {
    45
}

const fn default_batch_interval_ms() -> u64 {
    3000
}

const fn default_single_probability() -> f64 {
    0.6
}

const fn default_follow_up_max_delay_ms() -> u64 {
    250
}

const fn default_lifetime_ms() -> u64 {
    3000
}

const fn default_small_probability() -> f64 {
    0.5
}

const fn default_max_rotation_deg() -> f64 {
    2.0
}

const fn default_top_percent() -> PercentRange {
    PercentRange::new(18.0, 55.0)
}

const fn default_left_side_percent() -> PercentRange {
    PercentRange::new(6.0, 22.0)
}

const fn default_right_side_percent() -> PercentRange {
    PercentRange::new(62.0, 86.0)
}

fn default_messages() -> Vec<String> {
    [
        "IA appraised it at 3,000.00.",
        "772 appraised it at 170.00.",
        "Void_Walker appraised it at 9,420.00.",
        "Null_Set appraised it at 2,241.00.",
        "Zero_One appraised it at 425.00.",
        "Anon_KR appraised it at 6,660.00.",
        "Ghost_O appraised it at 1,120.00.",
        "User_99 appraised it at 8,005.00.",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

fn default_unit() -> String {
    "DZC".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
