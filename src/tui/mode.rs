use crate::shared::{DisplayState, LedState, STEPS_PER_BAR};
use crate::transport::EngineSnapshot;

// Builds what the screen shows from an engine snapshot. `audio_failed` is
// set by the caller once a play attempt came back without an output.
pub fn display_state(snap: &EngineSnapshot, audio_failed: bool) -> DisplayState {
    let mut lamps = [LedState::Off; STEPS_PER_BAR];
    if snap.running {
        for (i, lamp) in lamps.iter_mut().enumerate() {
            *lamp = if i == snap.step {
                LedState::OnHigh
            } else if i % 4 == 0 {
                LedState::OnMedium
            } else {
                LedState::Off
            };
        }
    }

    DisplayState {
        theme: snap.theme,
        playing: snap.running,
        bar: snap.bar,
        step: snap.step,
        muted: snap.muted,
        active_voices: snap.active_voices,
        audio_ok: !audio_failed,
        lamps,
    }
}
