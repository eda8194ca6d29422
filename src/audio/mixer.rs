// Bus topology:
//
//   dry bus ───────────────────────────┐
//                                      ├─> master gain ─> compressor ─> out
//   wet bus ─> reverb ─> wet return ───┘

use super::effect::{Compressor, Effect};
use super::frame::StereoFrame;
use super::param::Param;
use super::reverb::Convolver;
use crate::pipeline::EngineConfig;

pub struct Mixer {
    reverb: Convolver,
    wet_gain: f32,
    master: Param,
    compressor: Compressor,
    wet_frames: Vec<StereoFrame>,
}

impl Mixer {
    pub fn new(config: &EngineConfig, sample_rate: u32, initial_gain: f32) -> Self {
        Self {
            reverb: Convolver::new(&config.reverb, sample_rate),
            wet_gain: config.reverb.wet_gain,
            master: Param::new(initial_gain),
            compressor: Compressor::new(&config.compressor, sample_rate),
            wet_frames: vec![StereoFrame::zero(); 4096],
        }
    }

    /// Glides the master gain towards `target` from `at` with time constant
    /// `time_constant`, starting from wherever it is at `at`.
    pub fn set_master_gain(&mut self, target: f32, at: f64, time_constant: f64) {
        let mut master = Param::new(self.master.value_at(at));
        master.target_at(at, target, time_constant);
        self.master = master;
    }

    pub fn master_gain_at(&self, t: f64) -> f32 {
        self.master.value_at(t)
    }

    /// Mixes one block of mono bus signals into `out`.
    pub fn mix(&mut self, dry: &[f32], wet: &[f32], out: &mut [StereoFrame], first_frame: u64, sample_rate: f64) {
        let n = out.len();
        if self.wet_frames.len() < n {
            self.wet_frames.resize(n, StereoFrame::zero());
        }
        let wet_frames = &mut self.wet_frames[..n];
        for (f, &s) in wet_frames.iter_mut().zip(wet) {
            *f = StereoFrame::splat(s);
        }
        self.reverb.process(wet_frames);

        for (i, frame) in out.iter_mut().enumerate() {
            let t = (first_frame + i as u64) as f64 / sample_rate;
            let g = self.master.value_at(t);
            let r = wet_frames[i];
            *frame = StereoFrame {
                left: (dry[i] + self.wet_gain * r.left) * g,
                right: (dry[i] + self.wet_gain * r.right) * g,
            };
        }
        self.compressor.process(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8_000;

    fn mixer(gain: f32) -> Mixer {
        Mixer::new(&EngineConfig::default(), SR, gain)
    }

    #[test]
    fn dry_signal_reaches_both_channels() {
        let mut m = mixer(0.3);
        let dry = vec![0.01; 256];
        let wet = vec![0.0; 256];
        let mut out = vec![StereoFrame::zero(); 256];
        m.mix(&dry, &wet, &mut out, 0, SR as f64);
        assert!(out[100].left > 0.0);
        assert_eq!(out[100].left, out[100].right);
    }

    #[test]
    fn wet_signal_comes_back_through_the_reverb() {
        let mut m = mixer(0.3);
        let dry = vec![0.0; 2048];
        let mut wet = vec![0.0; 2048];
        wet[0] = 1.0;
        let mut out = vec![StereoFrame::zero(); 2048];
        m.mix(&dry, &wet, &mut out, 0, SR as f64);
        // nothing within the convolver latency, a stereo tail afterwards
        assert!(out[..Convolver::latency_frames()].iter().all(|f| f.left == 0.0));
        assert!(out[Convolver::latency_frames()..].iter().any(|f| f.left != f.right));
    }

    #[test]
    fn master_gain_glides_to_target() {
        let mut m = mixer(0.3);
        m.set_master_gain(0.0, 1.0, 0.1);
        assert!((m.master_gain_at(1.0) - 0.3).abs() < 1e-6);
        assert!(m.master_gain_at(2.0) < 0.001);
        m.set_master_gain(0.3, 3.0, 0.1);
        assert!((m.master_gain_at(4.0) - 0.3).abs() < 0.001);
    }
}
