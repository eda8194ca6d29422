use super::frame::StereoFrame;
use crate::pipeline::CompressorConfig;

/// In-place processing of a block of stereo frames on the audio thread.
pub trait Effect: Send {
    fn process(&mut self, buf: &mut [StereoFrame]);
}

fn amp_to_db(amp: f32) -> f32 {
    20.0 * amp.abs().max(1e-10).log10()
}

fn db_to_amp(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Feed-forward soft-knee compressor on the summed stereo level.
pub struct Compressor {
    threshold_db: f32,
    knee_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
}

impl Compressor {
    pub fn new(config: &CompressorConfig, sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        Self {
            threshold_db: config.threshold_db,
            knee_db: config.knee_db,
            ratio: config.ratio.max(1.0),
            attack_coeff: (-1.0 / (config.attack_secs * sr)).exp(),
            release_coeff: (-1.0 / (config.release_secs * sr)).exp(),
            envelope: 0.0,
        }
    }

    /// Static curve: output level in dB for an input level in dB.
    fn curve(&self, x_db: f32) -> f32 {
        let over = x_db - self.threshold_db;
        let half_knee = self.knee_db * 0.5;
        let slope = 1.0 / self.ratio - 1.0;
        if over <= -half_knee {
            x_db
        } else if over < half_knee && self.knee_db > 0.0 {
            let k = over + half_knee;
            x_db + slope * k * k / (2.0 * self.knee_db)
        } else {
            self.threshold_db + over / self.ratio
        }
    }

    pub fn gain_for(&self, level: f32) -> f32 {
        let x_db = amp_to_db(level);
        db_to_amp(self.curve(x_db) - x_db)
    }
}

impl Effect for Compressor {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            let level = f.peak();
            let coeff = if level > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = coeff * self.envelope + (1.0 - coeff) * level;

            let gain = self.gain_for(self.envelope);
            f.left *= gain;
            f.right *= gain;
        }
    }
}
