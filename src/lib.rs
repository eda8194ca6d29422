// Procedural game music: a look-ahead step sequencer feeding a small synth
// bank, a reverb bus and a master stage, driven through `MusicEngine`.
pub mod audio;
pub mod audio_api;
pub mod error;
pub mod pipeline;
pub mod scheduler;
pub mod shared;
pub mod transport;
pub mod tui;

pub use error::ConfigError;
pub use transport::{BackendFactory, EngineSnapshot, MusicEngine};
