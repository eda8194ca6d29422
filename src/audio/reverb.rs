// Convolution reverb: mono in, stereo out, with a synthetic decaying-noise
// impulse response.
//
// Uniformly partitioned overlap-add in the frequency domain. The left and
// right responses are packed into one complex spectrum (L + iR); since the
// input is real, a single inverse transform yields the left output in the
// real part and the right output in the imaginary part.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::effect::Effect;
use super::frame::StereoFrame;
use crate::pipeline::ReverbConfig;

const BLOCK: usize = 512;
const FFT_LEN: usize = BLOCK * 2;

/// Stereo impulse response: independent noise per channel shaped by
/// `(1 - n/len)^decay`, normalised the way a Web Audio convolver does.
pub fn impulse_response(config: &ReverbConfig, sample_rate: u32) -> [Vec<f32>; 2] {
    let len = ((config.duration_secs * sample_rate as f64).round() as usize).max(1);
    let mut rng = fastrand::Rng::with_seed(config.seed);
    let mut channel = || -> Vec<f32> {
        (0..len)
            .map(|n| {
                let shape = (1.0 - n as f64 / len as f64).powf(config.decay) as f32;
                (rng.f32() * 2.0 - 1.0) * shape
            })
            .collect()
    };
    let mut ir = [channel(), channel()];

    let power: f64 = ir.iter().flatten().map(|&s| (s as f64) * (s as f64)).sum();
    let rms = (power / (2.0 * len as f64)).sqrt().max(0.000125);
    let scale = (0.00125 * 44_100.0 / sample_rate as f64 / rms) as f32;
    for s in ir.iter_mut().flatten() {
        *s *= scale;
    }
    ir
}

pub struct Convolver {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    filters: Vec<Vec<Complex<f32>>>,  // one spectrum per IR partition
    history: Vec<Vec<Complex<f32>>>,  // input spectra, ring indexed by `head`
    head: usize,
    input: Vec<f32>,
    output: Vec<StereoFrame>,
    overlap: Vec<Complex<f32>>,
    acc: Vec<Complex<f32>>,
    pos: usize,
}

impl Convolver {
    pub fn new(config: &ReverbConfig, sample_rate: u32) -> Self {
        let [left, right] = impulse_response(config, sample_rate);
        Self::from_ir(&left, &right)
    }

    pub fn from_ir(left: &[f32], right: &[f32]) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(FFT_LEN);
        let inverse = planner.plan_fft_inverse(FFT_LEN);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let len = left.len().max(right.len()).max(1);
        let partitions = len.div_ceil(BLOCK);
        let filters: Vec<Vec<Complex<f32>>> = (0..partitions)
            .map(|p| {
                let mut spectrum = vec![Complex::default(); FFT_LEN];
                for (i, slot) in spectrum.iter_mut().take(BLOCK).enumerate() {
                    let n = p * BLOCK + i;
                    let l = left.get(n).copied().unwrap_or(0.0);
                    let r = right.get(n).copied().unwrap_or(0.0);
                    *slot = Complex::new(l, r);
                }
                forward.process_with_scratch(&mut spectrum, &mut scratch);
                spectrum
            })
            .collect();

        Self {
            forward,
            inverse,
            scratch,
            history: vec![vec![Complex::default(); FFT_LEN]; partitions],
            filters,
            head: 0,
            input: vec![0.0; BLOCK],
            output: vec![StereoFrame::zero(); BLOCK],
            overlap: vec![Complex::default(); BLOCK],
            acc: vec![Complex::default(); FFT_LEN],
            pos: 0,
        }
    }

    /// Output lags the input by one block.
    pub fn latency_frames() -> usize {
        BLOCK
    }

    pub fn tick(&mut self, x: f32) -> StereoFrame {
        self.input[self.pos] = x;
        let y = self.output[self.pos];
        self.pos += 1;
        if self.pos == BLOCK {
            self.pos = 0;
            self.convolve_block();
        }
        y
    }

    fn convolve_block(&mut self) {
        let partitions = self.filters.len();
        self.head = (self.head + partitions - 1) % partitions;

        let spectrum = &mut self.history[self.head];
        for (i, slot) in spectrum.iter_mut().enumerate() {
            *slot = Complex::new(if i < BLOCK { self.input[i] } else { 0.0 }, 0.0);
        }
        self.forward.process_with_scratch(spectrum, &mut self.scratch);

        self.acc.fill(Complex::default());
        for (p, filter) in self.filters.iter().enumerate() {
            let x = &self.history[(self.head + p) % partitions];
            for ((a, xk), hk) in self.acc.iter_mut().zip(x).zip(filter) {
                *a += xk * hk;
            }
        }
        self.inverse.process_with_scratch(&mut self.acc, &mut self.scratch);

        let norm = 1.0 / FFT_LEN as f32;
        for i in 0..BLOCK {
            let y = self.acc[i] * norm + self.overlap[i];
            self.output[i] = StereoFrame {
                left: y.re,
                right: y.im,
            };
            self.overlap[i] = self.acc[BLOCK + i] * norm;
        }
    }
}

// Reads the left channel as the mono send and writes the stereo return.
impl Effect for Convolver {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            *f = self.tick(f.left);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_reproduces_the_response_after_one_block() {
        let left: Vec<f32> = (0..1500).map(|n| ((n * 7) % 13) as f32 / 13.0 - 0.5).collect();
        let right: Vec<f32> = (0..1500).map(|n| ((n * 5) % 11) as f32 / 11.0 - 0.5).collect();
        let mut conv = Convolver::from_ir(&left, &right);

        let total = Convolver::latency_frames() + 1500;
        let out: Vec<StereoFrame> = (0..total)
            .map(|i| conv.tick(if i == 0 { 1.0 } else { 0.0 }))
            .collect();

        assert!(out[..BLOCK].iter().all(|f| f.left == 0.0 && f.right == 0.0));
        for n in 0..1500 {
            let f = out[BLOCK + n];
            assert!((f.left - left[n]).abs() < 1e-4, "left {n}");
            assert!((f.right - right[n]).abs() < 1e-4, "right {n}");
        }
    }

    #[test]
    fn response_decays_and_channels_differ() {
        let cfg = ReverbConfig::default();
        let [l, r] = impulse_response(&cfg, 48_000);
        assert_eq!(l.len(), 96_000);
        let head: f32 = l[..4800].iter().map(|s| s.abs()).sum();
        let tail: f32 = l[l.len() - 4800..].iter().map(|s| s.abs()).sum();
        assert!(tail < head * 0.01);
        assert_ne!(l[..64], r[..64]);
    }

    #[test]
    fn silence_in_silence_out() {
        let mut conv = Convolver::new(&ReverbConfig::default(), 8_000);
        let mut buf = vec![StereoFrame::zero(); 4096];
        conv.process(&mut buf);
        assert!(buf.iter().all(|f| f.left == 0.0 && f.right == 0.0));
    }
}
