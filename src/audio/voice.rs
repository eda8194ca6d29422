use super::nodes::{Biquad, Noise, Oscillator};
use super::param::Param;
use crate::audio_api::Bus;
use crate::pipeline::ThemeId;

#[derive(Clone, Debug)]
pub enum Source {
    Osc(Oscillator),
    Noise(Noise),
}

/// One source with its own optional filter and a fixed gain.
#[derive(Clone, Debug)]
pub struct Branch {
    source: Source,
    filter: Option<Biquad>,
    gain: f32,
}

impl Branch {
    pub fn osc(osc: Oscillator) -> Self {
        Self {
            source: Source::Osc(osc),
            filter: None,
            gain: 1.0,
        }
    }

    pub fn noise(noise: Noise) -> Self {
        Self {
            source: Source::Noise(noise),
            filter: None,
            gain: 1.0,
        }
    }

    pub fn filtered(mut self, filter: Biquad) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    fn next(&mut self, t: f64, sample_rate: f64) -> f32 {
        let raw = match &mut self.source {
            Source::Osc(o) => o.next(t, sample_rate),
            Source::Noise(n) => n.next(t),
        };
        let shaped = match &mut self.filter {
            Some(f) => f.process(raw, t, sample_rate),
            None => raw,
        };
        shaped * self.gain
    }
}

/// A scheduled note: silent before `start`, finished at `stop`.
#[derive(Clone, Debug)]
pub struct Voice {
    pub owner: Option<ThemeId>,
    pub bus: Bus,
    pub start: f64,
    pub stop: f64,
    pub active: bool,
    branches: Vec<Branch>,
    filter: Option<Biquad>,
    envelope: Param,
}

impl Voice {
    pub fn new(bus: Bus, start: f64, stop: f64, envelope: Param) -> Self {
        Self {
            owner: None,
            bus,
            start,
            stop,
            active: true,
            branches: Vec::new(),
            filter: None,
            envelope,
        }
    }

    pub fn branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    /// Filter applied to the sum of all branches, before the envelope.
    pub fn filtered(mut self, filter: Biquad) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn owned_by(mut self, theme: ThemeId) -> Self {
        self.owner = Some(theme);
        self
    }

    pub fn envelope_at(&self, t: f64) -> f32 {
        self.envelope.value_at(t)
    }

    /// Ramps the voice to silence over `fade` seconds from `at` and pulls the
    /// stop time in so it leaves the active set once the ramp is done.
    pub fn release(&mut self, at: f64, fade: f64) {
        self.envelope.fade_out(at, fade);
        self.stop = self.stop.min(at + fade);
    }

    /// Adds this voice into `out`, whose first sample sits at frame
    /// `first_frame` of the device clock.
    pub fn render_into(&mut self, out: &mut [f32], first_frame: u64, sample_rate: f64) {
        if !self.active {
            return;
        }
        let start = (self.start * sample_rate).round().max(0.0) as u64;
        let stop = (self.stop * sample_rate).round().max(0.0) as u64;
        if stop <= first_frame {
            self.active = false;
            return;
        }

        let skip = start.saturating_sub(first_frame) as usize;
        for (i, slot) in out.iter_mut().enumerate().skip(skip) {
            let frame = first_frame + i as u64;
            if frame >= stop {
                self.active = false;
                break;
            }
            let t = frame as f64 / sample_rate;
            let mut s = 0.0;
            for b in &mut self.branches {
                s += b.next(t, sample_rate);
            }
            if let Some(f) = &mut self.filter {
                s = f.process(s, t, sample_rate);
            }
            *slot += s * self.envelope.value_at(t);
        }
        if first_frame + out.len() as u64 >= stop {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::nodes::Waveform;

    const SR: f64 = 1000.0;

    fn tone(start: f64, stop: f64) -> Voice {
        Voice::new(Bus::Dry, start, stop, Param::new(1.0))
            .branch(Branch::osc(Oscillator::fixed(Waveform::Square, 10.0)))
    }

    #[test]
    fn silent_before_start_and_after_stop() {
        let mut v = tone(0.1, 0.2);
        let mut out = vec![0.0; 300];
        v.render_into(&mut out, 0, SR);
        assert!(out[..100].iter().all(|&s| s == 0.0));
        assert!(out[100..200].iter().any(|&s| s != 0.0));
        assert!(out[200..].iter().all(|&s| s == 0.0));
        assert!(!v.active);
    }

    #[test]
    fn rendering_spans_blocks() {
        let mut v = tone(0.05, 0.5);
        let mut a = vec![0.0; 100];
        let mut b = vec![0.0; 100];
        v.render_into(&mut a, 0, SR);
        v.render_into(&mut b, 100, SR);
        assert!(v.active);
        assert!(b.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn release_fades_and_shortens() {
        let mut v = tone(0.0, 10.0);
        v.release(0.1, 0.05);
        assert!((v.stop - 0.15).abs() < 1e-9);
        let mut out = vec![0.0; 300];
        v.render_into(&mut out, 0, SR);
        assert!(out[150..].iter().all(|&s| s == 0.0));
        assert!(out[140].abs() < out[120].abs());
        assert!(!v.active);
    }
}
