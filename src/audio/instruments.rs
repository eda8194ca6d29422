// The instrument bank. Each recipe turns one note into a self-contained voice
// whose whole lifetime (envelope, filter sweeps, stop time) is fixed up front.

use super::nodes::{Biquad, FilterKind, Noise, Oscillator, Waveform, BUTTERWORTH_Q};
use super::param::Param;
use super::voice::{Branch, Voice};
use crate::audio_api::Bus;
use crate::pipeline::compose::mtof;
use crate::pipeline::{Drum, Note};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instrument {
    Flute,
    Brass,
    Harp,
    Bass,
    Strings,
    Drums,
}

/// Builds the voice for `note` on `instrument`. A pitch sent to the drum kit,
/// or a drum tag sent to a pitched instrument, is silence.
pub fn synthesize(
    instrument: Instrument,
    note: Note,
    start: f64,
    duration: f64,
    bus: Bus,
    seed: u64,
) -> Option<Voice> {
    let duration = duration.max(0.0);
    let hz = |n: u8| mtof(n as f32);
    match (instrument, note) {
        (Instrument::Flute, Note::Pitch(n)) => Some(flute(hz(n), start, duration, bus, seed)),
        (Instrument::Brass, Note::Pitch(n)) => Some(brass(hz(n), start, duration, bus)),
        (Instrument::Harp, Note::Pitch(n)) => Some(harp(hz(n), start, bus)),
        (Instrument::Bass, Note::Pitch(n)) => Some(bass(n, start, duration, bus)),
        (Instrument::Strings, Note::Pitch(n)) => Some(strings(hz(n), start, duration, bus)),
        (Instrument::Drums, Note::Drum(drum)) => Some(drum_voice(drum, start, bus, seed)),
        _ => None,
    }
}

fn flute(hz: f32, t: f64, dur: f64, bus: Bus, seed: u64) -> Voice {
    let hold = t + (dur - 0.1).max(0.1);
    let mut env = Param::new(0.0);
    env.set_at(t, 0.0)
        .linear_to(t + 0.1, 0.3)
        .linear_to(hold, 0.3)
        .linear_to((t + dur + 0.1).max(hold), 0.0);

    let tone = Oscillator::fixed(Waveform::Triangle, hz).with_vibrato(6.0, 6.0, t + dur);
    let breath = Branch::noise(Noise::new(seed))
        .filtered(Biquad::fixed(FilterKind::Bandpass, 2000.0, 1.0))
        .gain(0.05);

    Voice::new(bus, t, t + dur + 0.2, env)
        .branch(Branch::osc(tone))
        .branch(breath)
}

fn brass(hz: f32, t: f64, dur: f64, bus: Bus) -> Voice {
    let release = t + dur + 0.1;
    let mut env = Param::new(0.0);
    env.set_at(t, 0.0).linear_to(t + 0.05, 0.3);
    // short stabs go straight from the attack into the release
    if t + 0.3 < release {
        env.exponential_to(t + 0.3, 0.15);
    }
    env.linear_to(release, 0.0);

    let mut cutoff = Param::new(600.0);
    cutoff
        .set_at(t, 600.0)
        .linear_to(t + 0.1, 3000.0)
        .exponential_to(t + dur.max(0.15), 800.0);

    Voice::new(bus, t, t + dur + 0.2, env)
        .branch(Branch::osc(Oscillator::fixed(Waveform::Sawtooth, hz)))
        .branch(Branch::osc(Oscillator::fixed(Waveform::Sawtooth, hz * 1.004)))
        .filtered(Biquad::new(FilterKind::Lowpass, cutoff, 2.0))
}

// Plucked: the note length is ignored, the string always rings for 2 s.
fn harp(hz: f32, t: f64, bus: Bus) -> Voice {
    let mut env = Param::new(0.0);
    env.set_at(t, 0.0).linear_to(t + 0.01, 0.3).exponential_to(t + 2.0, 0.001);
    Voice::new(bus, t, t + 2.0, env).branch(Branch::osc(Oscillator::fixed(Waveform::Triangle, hz)))
}

fn bass(note: u8, t: f64, dur: f64, bus: Bus) -> Voice {
    let hz = mtof(note as f32 - 12.0);
    let mut cutoff = Param::new(200.0);
    cutoff
        .set_at(t, 200.0)
        .exponential_to(t + 0.05, 1000.0)
        .exponential_to(t + 0.2, 300.0);

    let mut env = Param::new(0.0);
    env.set_at(t, 0.0)
        .linear_to(t + 0.02, 0.5)
        .linear_to((t + dur + 0.05).max(t + 0.03), 0.0);

    Voice::new(bus, t, t + dur + 0.1, env)
        .branch(Branch::osc(Oscillator::fixed(Waveform::Square, hz)))
        .filtered(Biquad::new(FilterKind::Lowpass, cutoff, BUTTERWORTH_Q))
}

fn strings(hz: f32, t: f64, dur: f64, bus: Bus) -> Voice {
    let hold = t + (dur - 0.2).max(0.4);
    let mut env = Param::new(0.0);
    env.set_at(t, 0.0)
        .linear_to(t + 0.4, 0.2)
        .linear_to(hold, 0.2)
        .linear_to((t + dur + 0.5).max(hold), 0.0);

    Voice::new(bus, t, t + dur + 0.6, env)
        .branch(Branch::osc(Oscillator::fixed(Waveform::Sawtooth, hz)))
        .branch(Branch::osc(Oscillator::fixed(Waveform::Sawtooth, hz * 1.01)))
        .filtered(Biquad::fixed(FilterKind::Lowpass, 2000.0, BUTTERWORTH_Q))
}

fn drum_voice(drum: Drum, t: f64, bus: Bus, seed: u64) -> Voice {
    match drum {
        Drum::Kick => {
            let mut pitch = Param::new(120.0);
            pitch.set_at(t, 120.0).exponential_to(t + 0.5, 0.01);
            let mut env = Param::new(0.8);
            env.set_at(t, 0.8).exponential_to(t + 0.5, 0.001);
            Voice::new(bus, t, t + 1.0, env).branch(Branch::osc(Oscillator::new(Waveform::Sine, pitch)))
        }
        Drum::Snare => {
            let mut env = Param::new(0.5);
            env.set_at(t, 0.5).exponential_to(t + 0.3, 0.001);
            let noise = Branch::noise(Noise::new(seed).until(t + 0.5))
                .filtered(Biquad::fixed(FilterKind::Highpass, 1000.0, BUTTERWORTH_Q));
            Voice::new(bus, t, t + 0.5, env).branch(noise)
        }
        Drum::Hat => {
            let mut env = Param::new(0.2);
            env.set_at(t, 0.2).exponential_to(t + 0.05, 0.001);
            let noise = Branch::noise(Noise::new(seed).until(t + 0.1))
                .filtered(Biquad::fixed(FilterKind::Highpass, 6000.0, BUTTERWORTH_Q));
            Voice::new(bus, t, t + 0.1, env).branch(noise)
        }
        Drum::Timpani => {
            let mut pitch = Param::new(80.0);
            pitch.set_at(t, 80.0).linear_to(t + 0.1, 60.0);
            let mut env = Param::new(0.8);
            env.set_at(t, 0.8).linear_to(t + 1.0, 0.0);
            Voice::new(bus, t, t + 1.0, env).branch(Branch::osc(Oscillator::new(Waveform::Sine, pitch)))
        }
    }
}
