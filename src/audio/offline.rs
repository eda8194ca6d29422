use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::engine::Engine;
use super::frame::StereoFrame;
use crate::audio_api::{AudioBackend, AudioCommand, BackendStatus};
use crate::pipeline::{EngineConfig, ThemeId};

/// A backend with no device behind it: time only moves when `render` is
/// called. Clones share the same engine.
#[derive(Clone)]
pub struct OfflineBackend {
    engine: Arc<Mutex<Engine>>,
}

impl OfflineBackend {
    pub fn new(config: &EngineConfig, sample_rate: u32) -> Self {
        Self {
            engine: Arc::new(Mutex::new(Engine::new(config, sample_rate, config.volume))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn render(&self, frames: usize) -> Vec<StereoFrame> {
        let mut out = vec![StereoFrame::zero(); frames];
        self.lock().render_block(&mut out);
        out
    }

    /// Renders `secs` of audio in device-sized blocks, calling `between`
    /// after each block so a caller can pump the scheduler like a real clock.
    pub fn render_for(&self, secs: f64, block: usize, mut between: impl FnMut()) -> Vec<StereoFrame> {
        let total = (secs * self.sample_rate() as f64).round() as usize;
        let block = block.max(1);
        let mut out = Vec::with_capacity(total);
        while out.len() < total {
            let n = block.min(total - out.len());
            out.extend(self.render(n));
            between();
        }
        out
    }

    pub fn voices_for(&self, theme: ThemeId) -> usize {
        self.lock().voices_for(theme)
    }
}

impl AudioBackend for OfflineBackend {
    fn send(&self, cmd: AudioCommand) {
        self.lock().handle_cmd(cmd);
    }

    fn status(&self) -> BackendStatus {
        let engine = self.lock();
        BackendStatus {
            clock: engine.clock(),
            active_voices: engine.active_voices(),
            master_gain: engine.master_gain(),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.lock().sample_rate()
    }
}

/// Writes interleaved 32-bit float stereo.
pub fn write_wav(path: &Path, frames: &[StereoFrame], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for f in frames {
        writer.write_sample(f.left)?;
        writer.write_sample(f.right)?;
    }
    writer.finalize()?;
    Ok(())
}
