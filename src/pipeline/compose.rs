// Small helpers for writing scores by hand. None of this runs on the audio
// path: the library is assembled once when the engine is built.

use super::theme::{Note, Step};
use crate::shared::STEPS_PER_BAR;

/// MIDI note number to frequency in Hz (A4 = 69 = 440 Hz).
pub fn mtof(note: f32) -> f32 {
    440.0 * 2f32.powf((note - 69.0) / 12.0)
}

/// One step slot: `_` is a rest, `K`/`S`/`H`/`T` are kick, snare, hat and
/// timpani, anything else is a MIDI note number.
macro_rules! step {
    (_) => {
        None
    };
    (K) => {
        Some($crate::pipeline::theme::Note::Drum($crate::pipeline::theme::Drum::Kick))
    };
    (S) => {
        Some($crate::pipeline::theme::Note::Drum($crate::pipeline::theme::Drum::Snare))
    };
    (H) => {
        Some($crate::pipeline::theme::Note::Drum($crate::pipeline::theme::Drum::Hat))
    };
    (T) => {
        Some($crate::pipeline::theme::Note::Drum($crate::pipeline::theme::Drum::Timpani))
    };
    ($n:literal) => {
        Some($crate::pipeline::theme::Note::Pitch($n))
    };
}

/// One bar. The result is a `[Step; 16]`, so a bar with the wrong number of
/// slots does not compile.
macro_rules! bar {
    ($($s:tt),* $(,)?) => {
        [$($crate::pipeline::compose::step!($s)),*]
    };
}

pub(crate) use bar;
pub(crate) use step;

/// Concatenates whole bars into one part.
pub fn seq(bars: &[[Step; STEPS_PER_BAR]]) -> Vec<Step> {
    bars.iter().flatten().copied().collect()
}

/// Concatenates arbitrary runs of steps.
pub fn cat(parts: &[&[Step]]) -> Vec<Step> {
    parts.iter().flat_map(|p| p.iter().copied()).collect()
}

pub fn rep(part: &[Step], times: usize) -> Vec<Step> {
    let mut out = Vec::with_capacity(part.len() * times);
    for _ in 0..times {
        out.extend_from_slice(part);
    }
    out
}

/// Shifts every pitched note by `semitones`, clamped to the MIDI range.
/// Drum hits and rests pass through.
pub fn trans(part: &[Step], semitones: i16) -> Vec<Step> {
    part.iter()
        .map(|step| match step {
            Some(Note::Pitch(n)) => Some(Note::Pitch((*n as i16 + semitones).clamp(0, 127) as u8)),
            other => *other,
        })
        .collect()
}

/// `steps` rests.
pub fn sil(steps: usize) -> Vec<Step> {
    vec![None; steps]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::theme::Drum;

    #[test]
    fn mtof_matches_reference_pitches() {
        assert!((mtof(69.0) - 440.0).abs() < 1e-3);
        assert!((mtof(57.0) - 220.0).abs() < 1e-3);
        assert!((mtof(60.0) - 261.6256).abs() < 1e-2);
    }

    #[test]
    fn bar_macro_reads_rests_drums_and_pitches() {
        let b: [Step; 16] = bar![K, _, S, _, H, _, T, _, 60, _, _, _, 72, _, _, _];
        assert_eq!(b[0], Some(Note::Drum(Drum::Kick)));
        assert_eq!(b[1], None);
        assert_eq!(b[6], Some(Note::Drum(Drum::Timpani)));
        assert_eq!(b[8], Some(Note::Pitch(60)));
    }

    #[test]
    fn seq_and_rep_lay_bars_end_to_end() {
        let a = bar![60, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _];
        let b = bar![62, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _];
        let part = rep(&seq(&[a, b]), 2);
        assert_eq!(part.len(), 64);
        assert_eq!(part[16], Some(Note::Pitch(62)));
        assert_eq!(part[32], Some(Note::Pitch(60)));
    }

    #[test]
    fn trans_moves_pitches_only() {
        let part = cat(&[&[Some(Note::Pitch(60)), None], &[Some(Note::Drum(Drum::Hat))]]);
        let up = trans(&part, 12);
        assert_eq!(up, vec![Some(Note::Pitch(72)), None, Some(Note::Drum(Drum::Hat))]);
        assert_eq!(trans(&[Some(Note::Pitch(120))], 12), vec![Some(Note::Pitch(127))]);
    }

    #[test]
    fn sil_is_all_rests() {
        assert!(sil(32).iter().all(Option::is_none));
        assert_eq!(cat(&[&sil(3), &sil(2)]).len(), 5);
    }
}
