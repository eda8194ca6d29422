// Per-sample signal sources and filters. Everything is driven by absolute
// time `t` in seconds, so a node never needs to know when its voice started.

use std::f64::consts::TAU;

use super::param::Param;

pub const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

// filter coefficients are refreshed this often while the cutoff is automated
const COEFF_INTERVAL: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

#[derive(Clone, Debug)]
pub struct Vibrato {
    rate_hz: f64,
    depth_hz: f32,
    until: f64,
    phase: f64,
}

#[derive(Clone, Debug)]
pub struct Oscillator {
    wave: Waveform,
    frequency: Param,
    vibrato: Option<Vibrato>,
    phase: f64,
}

impl Oscillator {
    pub fn new(wave: Waveform, frequency: Param) -> Self {
        Self {
            wave,
            frequency,
            vibrato: None,
            phase: 0.0,
        }
    }

    pub fn fixed(wave: Waveform, hz: f32) -> Self {
        Self::new(wave, Param::new(hz))
    }

    /// Sine LFO added to the frequency until `until`, then the pitch is plain.
    pub fn with_vibrato(mut self, rate_hz: f64, depth_hz: f32, until: f64) -> Self {
        self.vibrato = Some(Vibrato {
            rate_hz,
            depth_hz,
            until,
            phase: 0.0,
        });
        self
    }

    pub fn next(&mut self, t: f64, sample_rate: f64) -> f32 {
        let mut hz = self.frequency.value_at(t) as f64;
        if let Some(v) = &mut self.vibrato {
            if t < v.until {
                hz += (v.depth_hz as f64) * (TAU * v.phase).sin();
                v.phase = (v.phase + v.rate_hz / sample_rate).fract();
            }
        }
        let dt = (hz / sample_rate).clamp(0.0, 0.5);
        let p = self.phase;
        let out = match self.wave {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0 - poly_blep(p, dt),
            Waveform::Square => {
                let naive = if p < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(p, dt) - poly_blep((p + 0.5).fract(), dt)
            }
        };
        self.phase = (p + dt).fract();
        out as f32
    }
}

// Polynomial band-limited step, smoothing the discontinuity at phase 0.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}

#[derive(Clone, Debug)]
pub struct Noise {
    rng: fastrand::Rng,
    ends_at: Option<f64>,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            ends_at: None,
        }
    }

    /// A noise buffer of finite length: silent from `ends_at` on.
    pub fn until(mut self, ends_at: f64) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    pub fn next(&mut self, t: f64) -> f32 {
        match self.ends_at {
            Some(end) if t >= end => 0.0,
            _ => self.rng.f32() * 2.0 - 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

#[derive(Clone, Copy, Debug, Default)]
struct Coeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coeffs {
    // Audio EQ Cookbook; bandpass is the constant 0 dB peak gain form.
    fn design(kind: FilterKind, cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let cutoff = cutoff.clamp(10.0, sample_rate * 0.45);
        let q = q.max(0.5);
        let omega = TAU * cutoff / sample_rate;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::Lowpass => ((1.0 - cos_w) / 2.0, 1.0 - cos_w, (1.0 - cos_w) / 2.0),
            FilterKind::Highpass => ((1.0 + cos_w) / 2.0, -(1.0 + cos_w), (1.0 + cos_w) / 2.0),
            FilterKind::Bandpass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Biquad {
    kind: FilterKind,
    cutoff: Param,
    q: f32,
    coeffs: Coeffs,
    countdown: u32,
    designed: bool,
    z1: f64,
    z2: f64,
}

impl Biquad {
    pub fn new(kind: FilterKind, cutoff: Param, q: f32) -> Self {
        Self {
            kind,
            cutoff,
            q,
            coeffs: Coeffs::default(),
            countdown: 0,
            designed: false,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn fixed(kind: FilterKind, hz: f32, q: f32) -> Self {
        Self::new(kind, Param::new(hz), q)
    }

    pub fn process(&mut self, x: f32, t: f64, sample_rate: f64) -> f32 {
        if !self.designed || (self.cutoff.is_automated() && self.countdown == 0) {
            let hz = self.cutoff.value_at(t) as f64;
            self.coeffs = Coeffs::design(self.kind, hz, self.q as f64, sample_rate);
            self.designed = true;
            self.countdown = COEFF_INTERVAL;
        }
        self.countdown = self.countdown.saturating_sub(1);

        // transposed direct form II
        let c = self.coeffs;
        let x = x as f64;
        let y = c.b0 * x + self.z1;
        self.z1 = c.b1 * x - c.a1 * y + self.z2;
        self.z2 = c.b2 * x - c.a2 * y;
        y as f32
    }
}
