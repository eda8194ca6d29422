// Engine tuning. Everything has a default matching the stock sound, and a
// JSON file only needs to name the fields it changes.

use serde::{Deserialize, Serialize};

use super::theme::ThemeId;
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How far ahead of the device clock each polling pass commits notes.
    pub lookahead_secs: f64,
    /// Polling cadence of the scheduler thread. 0 disables the thread and
    /// leaves pumping to the caller (offline rendering, tests).
    pub poll_interval_ms: u64,
    /// Gap between a play call and the first note.
    pub start_offset_secs: f64,
    pub stop_fade_secs: f64,
    pub mute_time_constant_secs: f64,
    pub volume: f32,
    pub default_theme: ThemeId,
    pub reverb: ReverbConfig,
    pub compressor: CompressorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_secs: 0.1,
            poll_interval_ms: 25,
            start_offset_secs: 0.1,
            stop_fade_secs: 0.1,
            mute_time_constant_secs: 0.1,
            volume: 0.30,
            default_theme: ThemeId::Menu,
            reverb: ReverbConfig::default(),
            compressor: CompressorConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    pub duration_secs: f64,
    pub decay: f64,    // exponent of the (1 - t)^decay tail
    pub wet_gain: f32, // level of the reverb return into the master stage
    pub seed: u64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            duration_secs: 2.0,
            decay: 3.0,
            wet_gain: 0.35,
            seed: 0x5EED_0F_4A11,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_secs: f32,
    pub release_secs: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            knee_db: 30.0,
            ratio: 12.0,
            attack_secs: 0.003,
            release_secs: 0.25,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("lookahead_secs", self.lookahead_secs)?;
        positive("start_offset_secs", self.start_offset_secs)?;
        positive("stop_fade_secs", self.stop_fade_secs)?;
        positive("mute_time_constant_secs", self.mute_time_constant_secs)?;
        positive("reverb.duration_secs", self.reverb.duration_secs)?;
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::setting("volume", format!("must be 0..=1, got {}", self.volume)));
        }
        if !(0.0..=1.0).contains(&self.reverb.wet_gain) {
            return Err(ConfigError::setting(
                "reverb.wet_gain",
                format!("must be 0..=1, got {}", self.reverb.wet_gain),
            ));
        }
        if !(self.reverb.decay >= 0.0) {
            return Err(ConfigError::setting("reverb.decay", format!("must be >= 0, got {}", self.reverb.decay)));
        }
        let c = &self.compressor;
        if !(c.threshold_db <= 0.0 && c.knee_db >= 0.0 && c.ratio >= 1.0) {
            return Err(ConfigError::setting(
                "compressor",
                format!("threshold {} dB, knee {} dB, ratio {}", c.threshold_db, c.knee_db, c.ratio),
            ));
        }
        if !(c.attack_secs > 0.0 && c.release_secs > 0.0) {
            return Err(ConfigError::setting("compressor", "attack and release must be positive"));
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::setting(name, format!("must be positive, got {value}")))
    }
}
