use super::frame::StereoFrame;
use super::mixer::Mixer;
use super::voice::Voice;
use crate::audio_api::{AudioCommand, Bus};
use crate::pipeline::{EngineConfig, ThemeId};

// hard cap so a runaway schedule cannot grow the voice list without bound
const MAX_VOICES: usize = 512;

/// The render side: owns the device clock, every scheduled or sounding voice,
/// and the mixer they feed.
pub struct Engine {
    sample_rate: u32,
    frame: u64,
    voices: Vec<Voice>,
    mixer: Mixer,
    dry: Vec<f32>,
    wet: Vec<f32>,
}

impl Engine {
    pub fn new(config: &EngineConfig, sample_rate: u32, initial_gain: f32) -> Self {
        Self {
            sample_rate,
            frame: 0,
            voices: Vec::with_capacity(MAX_VOICES),
            mixer: Mixer::new(config, sample_rate, initial_gain),
            dry: vec![0.0; 4096],
            wet: vec![0.0; 4096],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far.
    pub fn clock(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn voices_for(&self, theme: ThemeId) -> usize {
        self.voices.iter().filter(|v| v.owner == Some(theme)).count()
    }

    pub fn master_gain(&self) -> f32 {
        self.mixer.master_gain_at(self.clock())
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::SpawnVoice(voice) => {
                if self.voices.len() < MAX_VOICES {
                    self.voices.push(*voice);
                } else {
                    log::debug!("voice limit {MAX_VOICES} reached, dropping note at {:.3}s", voice.start);
                }
            }
            AudioCommand::StopAll { at, fade } => {
                // not yet sounding: drop outright
                self.voices.retain(|v| v.start < at);
                for v in &mut self.voices {
                    v.release(at, fade);
                }
            }
            AudioCommand::SetMasterGain { target, at, time_constant } => {
                self.mixer.set_master_gain(target, at, time_constant);
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        let n = out.len();
        if self.dry.len() < n {
            self.dry.resize(n, 0.0);
            self.wet.resize(n, 0.0);
        }
        let dry = &mut self.dry[..n];
        let wet = &mut self.wet[..n];
        dry.fill(0.0);
        wet.fill(0.0);

        let sr = self.sample_rate as f64;
        for v in &mut self.voices {
            match v.bus {
                Bus::Dry => v.render_into(dry, self.frame, sr),
                Bus::Wet => v.render_into(wet, self.frame, sr),
            }
        }
        self.voices.retain(|v| v.active);

        self.mixer.mix(dry, wet, out, self.frame, sr);
        self.frame += n as u64;
    }
}
