use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    media::EncodeParams,
    scheduler::{ComposerParams, TargetSpec},
};

/// Main configuration for shortreel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Acceptable output duration window
    pub target: TargetConfig,

    /// How many candidate clips a run selects
    pub selection: SelectionConfig,

    /// Scheduling strategy settings
    pub compose: ComposeConfig,

    /// Encoding parameters for cutting and assembly
    pub media: EncodeParams,

    /// Optional voiceover settings
    pub voice: VoiceConfig,

    /// Optional publishing settings
    pub publish: PublishConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            selection: SelectionConfig::default(),
            compose: ComposeConfig::default(),
            media: EncodeParams::default(),
            voice: VoiceConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.target.validate()?;
        self.selection.validate()?;
        self.compose.validate()?;
        Ok(())
    }
}

/// Acceptable duration window for the assembled reel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Minimum acceptable duration (seconds)
    pub min_duration: f64,

    /// Maximum acceptable duration (seconds)
    pub max_duration: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self { min_duration: 21.0, max_duration: 28.0 }
    }
}

impl TargetConfig {
    pub fn as_spec(&self) -> TargetSpec {
        TargetSpec::Window { min: self.min_duration, max: self.max_duration }
    }

    fn validate(&self) -> Result<()> {
        if self.min_duration <= 0.0 || self.max_duration <= self.min_duration {
            return Err(ConfigError::InvalidValue {
                key: "target.duration_window".to_string(),
                value: format!("{}-{}", self.min_duration, self.max_duration),
            }
            .into());
        }
        Ok(())
    }
}

/// How many candidates a run randomly selects from the discovered files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Minimum number of clips to select
    pub min_clips: usize,

    /// Maximum number of clips to select
    pub max_clips: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { min_clips: 2, max_clips: 6 }
    }
}

impl SelectionConfig {
    fn validate(&self) -> Result<()> {
        if self.min_clips == 0 || self.max_clips < self.min_clips {
            return Err(ConfigError::InvalidValue {
                key: "selection.clip_range".to_string(),
                value: format!("{}-{}", self.min_clips, self.max_clips),
            }
            .into());
        }
        Ok(())
    }
}

/// Which scheduling strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeMode {
    /// Pick by pool size: fast-cut at or above the threshold, trim below
    Auto,

    /// Whole clips, trimmed or looped to fit
    Trim,

    /// Many short extracts from a large pool
    FastCut,
}

/// Scheduling strategy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Strategy selection
    pub mode: ComposeMode,

    /// Pool size at which Auto switches to fast-cut
    pub fast_cut_threshold: usize,

    /// Diversity floor for fast-cut plans
    pub min_distinct_clips: usize,

    /// Shortest randomized extract (seconds)
    pub segment_min: f64,

    /// Longest randomized extract (seconds)
    pub segment_max: f64,

    /// Exclusion buffer around placed extracts, per side (seconds)
    pub spacing_buffer: f64,

    /// Probability a segment plays at double rate
    pub speed_up_probability: f64,

    /// Retry budget for fast-cut placement
    pub max_attempts: u32,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            mode: ComposeMode::Auto,
            fast_cut_threshold: 20,
            min_distinct_clips: 20,
            segment_min: 1.0,
            segment_max: 1.5,
            spacing_buffer: 2.0,
            speed_up_probability: 0.3,
            max_attempts: 64,
        }
    }
}

impl ComposeConfig {
    pub fn composer_params(&self) -> ComposerParams {
        ComposerParams {
            segment_min: self.segment_min,
            segment_max: self.segment_max,
            spacing_buffer: self.spacing_buffer,
            speed_up_probability: self.speed_up_probability,
            max_attempts: self.max_attempts,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.segment_min <= 0.0 || self.segment_max < self.segment_min {
            return Err(ConfigError::InvalidValue {
                key: "compose.segment_range".to_string(),
                value: format!("{}-{}", self.segment_min, self.segment_max),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.speed_up_probability) {
            return Err(ConfigError::InvalidValue {
                key: "compose.speed_up_probability".to_string(),
                value: self.speed_up_probability.to_string(),
            }
            .into());
        }
        if self.spacing_buffer < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "compose.spacing_buffer".to_string(),
                value: self.spacing_buffer.to_string(),
            }
            .into());
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "compose.max_attempts".to_string(),
                value: self.max_attempts.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Voiceover settings; disabled by default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Generate and attach a narration track
    pub enabled: bool,

    /// Chat-completion model for the script
    pub script_model: String,

    /// TTS voice id
    pub voice_id: String,

    /// TTS model
    pub tts_model: String,

    /// Override for the script prompt; the built-in prompt is used when unset
    pub prompt: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            script_model: "gpt-4-turbo-preview".to_string(),
            voice_id: "8DzKSPdgEQPaK5vKG0Rs".to_string(),
            tts_model: "eleven_multilingual_v2".to_string(),
            prompt: None,
        }
    }
}

/// Publishing settings; disabled by default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Upload and schedule the finished reel
    pub enabled: bool,

    /// Platform integration identifier on the posting service
    pub platform: String,

    /// Caption attached to the scheduled post
    pub caption: String,

    /// Minutes from now to schedule the post
    pub delay_minutes: i64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            platform: "tiktok".to_string(),
            caption: String::new(),
            delay_minutes: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original_config = Config::default();

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.target.min_duration, loaded_config.target.min_duration);
        assert_eq!(original_config.compose.mode, loaded_config.compose.mode);
        assert_eq!(original_config.media.fps, loaded_config.media.fps);
    }

    #[test]
    fn test_invalid_duration_window() {
        let mut config = Config::default();
        config.target.min_duration = 28.0;
        config.target.max_duration = 21.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_clip_range() {
        let mut config = Config::default();
        config.selection.min_clips = 6;
        config.selection.max_clips = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_speed_up_probability() {
        let mut config = Config::default();
        config.compose.speed_up_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_attempt_budget_is_invalid() {
        let mut config = Config::default();
        config.compose.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_target_config_maps_to_window_spec() {
        let target = TargetConfig { min_duration: 21.0, max_duration: 28.0 };
        assert_eq!(target.as_spec(), TargetSpec::Window { min: 21.0, max: 28.0 });
    }
}
