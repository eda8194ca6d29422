// The score model: themes made of sections, sections made of per-part step
// sequences, one slot per sixteenth note.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::shared::{Part, STEPS_PER_BAR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    Menu,
    Battle,
    Victory,
    Defeat,
    Aethelgard,
    Veridian,
    Chronomach,
    Celestial,
    Weavers,
    Pantheon,
}

impl ThemeId {
    pub const ALL: [ThemeId; 10] = [
        ThemeId::Menu,
        ThemeId::Battle,
        ThemeId::Victory,
        ThemeId::Defeat,
        ThemeId::Aethelgard,
        ThemeId::Veridian,
        ThemeId::Chronomach,
        ThemeId::Celestial,
        ThemeId::Weavers,
        ThemeId::Pantheon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ThemeId::Menu => "menu",
            ThemeId::Battle => "battle",
            ThemeId::Victory => "victory",
            ThemeId::Defeat => "defeat",
            ThemeId::Aethelgard => "aethelgard",
            ThemeId::Veridian => "veridian",
            ThemeId::Chronomach => "chronomach",
            ThemeId::Celestial => "celestial",
            ThemeId::Weavers => "weavers",
            ThemeId::Pantheon => "pantheon",
        }
    }

    /// Case-insensitive lookup. Names without a theme (e.g. "tension") give None.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Drum {
    Kick,
    Snare,
    Hat,
    Timpani,
}

/// What a single step slot can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Note {
    Pitch(u8), // MIDI note number
    Drum(Drum),
}

/// `None` is a rest.
pub type Step = Option<Note>;

#[derive(Clone, Debug)]
pub struct Section {
    pub name: &'static str,
    pub bars: usize,
    pub lead: Option<Vec<Step>>,
    pub harmony: Option<Vec<Step>>,
    pub bass: Option<Vec<Step>>,
    pub percussion: Option<Vec<Step>>,
}

impl Section {
    pub fn new(name: &'static str, bars: usize) -> Self {
        Self {
            name,
            bars,
            lead: None,
            harmony: None,
            bass: None,
            percussion: None,
        }
    }

    pub fn with(mut self, part: Part, steps: Vec<Step>) -> Self {
        *self.part_slot(part) = Some(steps);
        self
    }

    fn part_slot(&mut self, part: Part) -> &mut Option<Vec<Step>> {
        match part {
            Part::Lead => &mut self.lead,
            Part::Harmony => &mut self.harmony,
            Part::Bass => &mut self.bass,
            Part::Percussion => &mut self.percussion,
        }
    }

    pub fn part(&self, part: Part) -> Option<&[Step]> {
        match part {
            Part::Lead => self.lead.as_deref(),
            Part::Harmony => self.harmony.as_deref(),
            Part::Bass => self.bass.as_deref(),
            Part::Percussion => self.percussion.as_deref(),
        }
    }

    /// The note at `index` on `part`. Missing parts, short parts and rests
    /// all read as silence.
    pub fn note_at(&self, part: Part, index: usize) -> Option<Note> {
        self.part(part)?.get(index).copied().flatten()
    }
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub bpm: f32,
    pub loop_start_bar: usize,
    pub sections: Arc<[Section]>,
}

impl Theme {
    pub fn new(bpm: f32, loop_start_bar: usize, sections: Vec<Section>) -> Self {
        Self {
            bpm,
            loop_start_bar,
            sections: sections.into(),
        }
    }

    /// Same sections, different tempo. The note data is shared, not copied.
    pub fn with_bpm(&self, bpm: f32) -> Self {
        Self {
            bpm,
            loop_start_bar: self.loop_start_bar,
            sections: Arc::clone(&self.sections),
        }
    }

    pub fn total_bars(&self) -> usize {
        self.sections.iter().map(|s| s.bars).sum()
    }

    pub fn seconds_per_step(&self) -> f64 {
        60.0 / self.bpm as f64 / 4.0
    }

    /// Finds the section containing global bar `bar` and the bar at which
    /// that section starts.
    pub fn locate(&self, bar: usize) -> Option<(&Section, usize)> {
        let mut start = 0;
        for section in self.sections.iter() {
            if bar < start + section.bars {
                return Some((section, start));
            }
            start += section.bars;
        }
        None
    }

    pub fn validate(&self, id: ThemeId) -> Result<(), ConfigError> {
        let theme = id.name();
        if self.sections.is_empty() {
            return Err(ConfigError::EmptyTheme { theme });
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(ConfigError::setting("bpm", format!("theme '{theme}' has bpm {}", self.bpm)));
        }
        for section in self.sections.iter() {
            if section.bars == 0 {
                return Err(ConfigError::EmptySection {
                    theme,
                    section: section.name,
                });
            }
            let expected = section.bars * STEPS_PER_BAR;
            for part in Part::ALL {
                if let Some(steps) = section.part(part) {
                    if steps.len() != expected {
                        return Err(ConfigError::PartLength {
                            theme,
                            section: section.name,
                            part,
                            len: steps.len(),
                            expected,
                        });
                    }
                }
            }
        }
        let total_bars = self.total_bars();
        if self.loop_start_bar >= total_bars {
            return Err(ConfigError::LoopStart {
                theme,
                loop_start: self.loop_start_bar,
                total_bars,
            });
        }
        Ok(())
    }
}

/// Every playable theme, keyed by id. Built once, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ThemeLibrary {
    themes: HashMap<ThemeId, Theme>,
}

impl ThemeLibrary {
    pub fn insert(&mut self, id: ThemeId, theme: Theme) {
        self.themes.insert(id, theme);
    }

    pub fn get(&self, id: ThemeId) -> Option<&Theme> {
        self.themes.get(&id)
    }

    pub fn contains(&self, id: ThemeId) -> bool {
        self.themes.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ThemeId> + '_ {
        ThemeId::ALL.into_iter().filter(|id| self.contains(*id))
    }

    /// Maps a requested name to a theme that exists, falling back to `default`.
    pub fn resolve(&self, name: &str, default: ThemeId) -> ThemeId {
        match ThemeId::parse(name) {
            Some(id) if self.contains(id) => id,
            _ => default,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for id in self.ids() {
            if let Some(theme) = self.get(id) {
                theme.validate(id)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_of(note: u8) -> Vec<Step> {
        let mut steps = vec![None; STEPS_PER_BAR];
        steps[0] = Some(Note::Pitch(note));
        steps
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown_names() {
        assert_eq!(ThemeId::parse("Veridian"), Some(ThemeId::Veridian));
        assert_eq!(ThemeId::parse(" menu "), Some(ThemeId::Menu));
        assert_eq!(ThemeId::parse("tension"), None);
        assert_eq!(ThemeId::parse("nonexistent"), None);
    }

    #[test]
    fn locate_walks_section_offsets() {
        let theme = Theme::new(
            120.0,
            1,
            vec![Section::new("a", 2), Section::new("b", 3)],
        );
        assert_eq!(theme.total_bars(), 5);
        assert_eq!(theme.locate(1).map(|(s, start)| (s.name, start)), Some(("a", 0)));
        assert_eq!(theme.locate(2).map(|(s, start)| (s.name, start)), Some(("b", 2)));
        assert_eq!(theme.locate(4).map(|(s, start)| (s.name, start)), Some(("b", 2)));
        assert!(theme.locate(5).is_none());
    }

    #[test]
    fn short_and_missing_parts_read_as_silence() {
        let section = Section::new("s", 2).with(Part::Bass, bar_of(40));
        assert_eq!(section.note_at(Part::Bass, 0), Some(Note::Pitch(40)));
        assert_eq!(section.note_at(Part::Bass, 1), None);
        assert_eq!(section.note_at(Part::Bass, 20), None);
        assert_eq!(section.note_at(Part::Lead, 0), None);
    }

    #[test]
    fn validation_flags_bad_part_length() {
        let theme = Theme::new(100.0, 0, vec![Section::new("s", 2).with(Part::Lead, bar_of(60))]);
        assert_eq!(
            theme.validate(ThemeId::Weavers),
            Err(ConfigError::PartLength {
                theme: "weavers",
                section: "s",
                part: Part::Lead,
                len: 16,
                expected: 32,
            })
        );
    }

    #[test]
    fn validation_flags_loop_start_past_the_end() {
        let theme = Theme::new(100.0, 2, vec![Section::new("s", 2)]);
        assert!(matches!(
            theme.validate(ThemeId::Menu),
            Err(ConfigError::LoopStart { loop_start: 2, total_bars: 2, .. })
        ));
        let empty = Theme::new(100.0, 0, vec![]);
        assert!(matches!(empty.validate(ThemeId::Menu), Err(ConfigError::EmptyTheme { .. })));
    }

    #[test]
    fn aliases_share_note_data() {
        let base = Theme::new(100.0, 0, vec![Section::new("s", 1).with(Part::Lead, bar_of(60))]);
        let alias = base.with_bpm(140.0);
        assert!(Arc::ptr_eq(&base.sections, &alias.sections));
        assert_eq!(alias.bpm, 140.0);
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let mut lib = ThemeLibrary::default();
        lib.insert(ThemeId::Menu, Theme::new(55.0, 0, vec![Section::new("s", 1)]));
        assert_eq!(lib.resolve("menu", ThemeId::Menu), ThemeId::Menu);
        assert_eq!(lib.resolve("pantheon", ThemeId::Menu), ThemeId::Menu); // not loaded
        assert_eq!(lib.resolve("nonexistent", ThemeId::Menu), ThemeId::Menu);
    }
}
