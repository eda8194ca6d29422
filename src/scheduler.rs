// Look-ahead step sequencer.
//
// Each pump commits every step whose time falls inside the look-ahead window
// and stamps it with its exact device-clock time, so how often pumping
// happens only needs to be finer than the window, never sample-accurate.

use crate::pipeline::{Note, ThemeId, ThemeLibrary};
use crate::shared::{Part, STEPS_PER_BAR};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackPosition {
    pub theme: ThemeId,
    pub bar: usize,
    pub step: usize,
    pub next_event_time: f64,
}

/// One note the sequencer wants played.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteRequest {
    pub theme: ThemeId,
    pub part: Part,
    pub note: Note,
    pub time: f64,
    pub duration: f64, // seconds, before any per-route scaling
}

#[derive(Debug, Default)]
pub struct Sequencer {
    position: Option<PlaybackPosition>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `theme` from its first bar, with the first step due at `first_event_time`.
    pub fn arm(&mut self, theme: ThemeId, first_event_time: f64) {
        self.position = Some(PlaybackPosition {
            theme,
            bar: 0,
            step: 0,
            next_event_time: first_event_time,
        });
    }

    pub fn disarm(&mut self) {
        self.position = None;
    }

    pub fn is_running(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<PlaybackPosition> {
        self.position
    }

    /// Dispatches every step due before `now + lookahead`. Steps already in
    /// the past are still dispatched, in order. Returns how many notes went out.
    pub fn pump(
        &mut self,
        library: &ThemeLibrary,
        now: f64,
        lookahead: f64,
        mut dispatch: impl FnMut(NoteRequest),
    ) -> usize {
        let Some(theme_id) = self.position.map(|p| p.theme) else {
            return 0;
        };
        let Some(theme) = library.get(theme_id) else {
            log::warn!("theme {theme_id} vanished from the library, stopping");
            self.position = None;
            return 0;
        };
        let Some(pos) = self.position.as_mut() else {
            return 0;
        };

        let total_bars = theme.total_bars();
        let seconds_per_step = theme.seconds_per_step();
        let horizon = now + lookahead;
        let mut sent = 0;

        while pos.next_event_time < horizon {
            if pos.bar >= total_bars {
                pos.bar = theme.loop_start_bar;
            }
            let Some((section, section_start)) = theme.locate(pos.bar) else {
                break; // empty theme; rejected at load time
            };
            let index = (pos.bar - section_start) * STEPS_PER_BAR + pos.step;

            for part in Part::ALL {
                if let Some(note) = section.note_at(part, index) {
                    dispatch(NoteRequest {
                        theme: theme_id,
                        part,
                        note,
                        time: pos.next_event_time,
                        duration: seconds_per_step * part.base_duration_steps(),
                    });
                    sent += 1;
                }
            }

            pos.next_event_time += seconds_per_step;
            pos.step += 1;
            if pos.step == STEPS_PER_BAR {
                pos.step = 0;
                pos.bar += 1;
                if pos.bar >= total_bars {
                    pos.bar = theme.loop_start_bar;
                }
            }
        }
        sent
    }
}
