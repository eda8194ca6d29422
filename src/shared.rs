// Types shared between the sequencer, the transport and the terminal front end.
//
// Key plan for the terminal front end:
//   1 .. 9, 0      //  SelectTheme(0 ..= 9), in ThemeId::ALL order
//   Space          //  Stop
//   m              //  ToggleMute
//   Esc            //  Quit
//
// The TUI never touches engine state directly: it renders the DisplayState
// built from MusicEngine::snapshot() and turns keys into InputEvents that
// main.rs forwards to play_music / stop_music / toggle_mute.

use crate::pipeline::theme::ThemeId;

pub const STEPS_PER_BAR: usize = 16;
pub const NUM_PARTS: usize = 4;

/// One of the four concurrent lines in a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Part {
    Lead,
    Harmony,
    Bass,
    Percussion,
}

impl Part {
    pub const ALL: [Part; NUM_PARTS] = [Part::Lead, Part::Harmony, Part::Bass, Part::Percussion];

    /// How many sixteenths a note on this part sounds for, before any
    /// per-theme scaling from the routing table.
    pub fn base_duration_steps(self) -> f64 {
        match self {
            Part::Lead => 2.0,
            Part::Harmony => 1.0,
            Part::Bass => 3.0,
            Part::Percussion => 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    SelectTheme(u8), // index into ThemeId::ALL
    Stop,
    ToggleMute,
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub theme: Option<ThemeId>,
    pub playing: bool,
    pub bar: usize,
    pub step: usize,
    pub muted: bool,
    pub active_voices: usize,
    pub audio_ok: bool, // false once the output device refused to open
    pub lamps: [LedState; STEPS_PER_BAR],
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            theme: None,
            playing: false,
            bar: 0,
            step: 0,
            muted: false,
            active_voices: 0,
            audio_ok: true,
            lamps: [LedState::Off; STEPS_PER_BAR],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedState {
    Off,
    OnMedium, // beat lamps
    OnHigh,   // the step being dispatched
}
