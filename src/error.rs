use thiserror::Error;

use crate::shared::Part;

/// Defects in compiled-in theme data or in the engine configuration.
///
/// These are caught when the engine is built; playback itself never fails.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("theme '{theme}' has no sections")]
    EmptyTheme { theme: &'static str },

    #[error("theme '{theme}', section '{section}' has zero bars")]
    EmptySection {
        theme: &'static str,
        section: &'static str,
    },

    #[error("theme '{theme}', section '{section}': {part:?} has {len} steps, expected {expected}")]
    PartLength {
        theme: &'static str,
        section: &'static str,
        part: Part,
        len: usize,
        expected: usize,
    },

    #[error("theme '{theme}': loop start bar {loop_start} is outside 0..{total_bars}")]
    LoopStart {
        theme: &'static str,
        loop_start: usize,
        total_bars: usize,
    },

    #[error("invalid setting '{name}': {message}")]
    InvalidSetting { name: &'static str, message: String },
}

impl ConfigError {
    pub fn setting(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name,
            message: message.into(),
        }
    }
}
