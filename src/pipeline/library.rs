// The compiled-in score. Four bars of sixteenths per line where possible;
// `_` is a rest, K/S/H/T are kick/snare/hat/timpani.

use super::compose::{bar, rep, seq};
use super::theme::{Section, Theme, ThemeId, ThemeLibrary};
use crate::shared::Part::{Bass, Harmony, Lead, Percussion};

/// Builds every theme plus the aliases the game layer asks for.
pub fn builtin() -> ThemeLibrary {
    let mut lib = ThemeLibrary::default();

    let veridian = veridian();
    let pantheon = pantheon();
    let aethelgard = aethelgard();
    let celestial = celestial();

    lib.insert(ThemeId::Menu, celestial.clone());
    lib.insert(ThemeId::Battle, aethelgard.with_bpm(140.0));
    lib.insert(ThemeId::Victory, pantheon.with_bpm(90.0));
    lib.insert(ThemeId::Defeat, veridian.with_bpm(60.0));

    lib.insert(ThemeId::Veridian, veridian);
    lib.insert(ThemeId::Pantheon, pantheon);
    lib.insert(ThemeId::Aethelgard, aethelgard);
    lib.insert(ThemeId::Chronomach, chronomach());
    lib.insert(ThemeId::Celestial, celestial);
    lib.insert(ThemeId::Weavers, weavers());
    lib
}

// "Whispers of the Old World": E dorian, harp and flute.
fn veridian() -> Theme {
    let intro = Section::new("Intro", 2)
        .with(Harmony, seq(&[
            bar![64, _, 67, 71, 64, _, 67, 71, 64, _, 67, 71, 64, _, 67, 71],
            bar![62, _, 66, 69, 62, _, 66, 69, 62, _, 66, 69, 62, _, 66, 69],
        ]))
        .with(Bass, seq(&[
            bar![40, _, _, _, _, _, _, _, 40, _, _, _, _, _, _, _],
            bar![38, _, _, _, _, _, _, _, 38, _, _, _, _, _, _, _],
        ]));

    let theme_a = Section::new("Theme A", 8)
        .with(Lead, seq(&[
            bar![76, _, _, 79, 76, _, _, 74, 71, _, _, _, _, _, _, _],
            bar![69, _, _, 71, 74, _, _, 76, 74, _, 71, _, 69, _, _, _],
            bar![76, _, _, 79, 81, _, _, 79, 76, _, _, 74, 71, _, _, _],
            bar![67, _, _, 69, 71, _, _, 74, 76, _, _, _, _, _, _, _],
            bar![76, _, _, 79, 76, _, _, 74, 71, _, _, _, _, _, _, _],
            bar![69, _, _, 71, 74, _, _, 76, 74, _, 71, _, 69, _, _, _],
            bar![67, _, _, _, 69, _, _, _, 71, _, _, _, 74, _, _, _],
            bar![76, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
        ]))
        .with(Harmony, rep(&seq(&[
            bar![64, _, 67, 71, 64, _, 67, 71, 64, _, 67, 71, 64, _, 67, 71],
            bar![62, _, 66, 69, 62, _, 66, 69, 62, _, 66, 69, 62, _, 66, 69],
            bar![60, _, 64, 67, 60, _, 64, 67, 60, _, 64, 67, 60, _, 64, 67],
            bar![59, _, 62, 66, 59, _, 62, 66, 59, _, 62, 66, 59, _, 62, 66],
        ]), 2))
        .with(Bass, rep(&seq(&[
            bar![40, _, _, _, 47, _, _, _, 40, _, _, _, 47, _, _, _],
            bar![38, _, _, _, 45, _, _, _, 38, _, _, _, 45, _, _, _],
            bar![36, _, _, _, 43, _, _, _, 36, _, _, _, 43, _, _, _],
            bar![35, _, _, _, 42, _, _, _, 35, _, _, _, 42, _, _, _],
        ]), 2));

    let bridge = Section::new("Bridge", 4)
        .with(Harmony, seq(&[
            bar![60, _, 64, 67, 72, _, 67, 64, 60, _, _, _, _, _, _, _],
            bar![57, _, 60, 64, 69, _, 64, 60, 57, _, _, _, _, _, _, _],
            bar![62, _, 66, 69, 74, _, 69, 66, 62, _, _, _, _, _, _, _],
            bar![59, _, 62, 66, 71, _, 66, 62, 59, _, _, _, _, _, _, _],
        ]))
        .with(Bass, seq(&[
            bar![48, _, _, _, _, _, _, _, 48, _, _, _, _, _, _, _],
            bar![45, _, _, _, _, _, _, _, 45, _, _, _, _, _, _, _],
            bar![50, _, _, _, _, _, _, _, 50, _, _, _, _, _, _, _],
            bar![47, _, _, _, _, _, _, _, 47, _, _, _, _, _, _, _],
        ]));

    Theme::new(90.0, 2, vec![intro, theme_a, bridge])
}

// "Glorious Ascent": heroic march in G major.
fn pantheon() -> Theme {
    let intro = Section::new("Intro", 2)
        .with(Percussion, seq(&[
            bar![S, _, S, _, S, _, S, _, S, _, S, _, S, _, S, _],
            bar![S, S, S, S, S, S, S, S, T, _, T, _, K, _, K, _],
        ]))
        .with(Bass, seq(&[
            bar![43, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![43, _, _, _, _, _, _, _, 55, _, 55, _, 43, _, _, _],
        ]));

    let fanfare = Section::new("Theme A (Fanfare)", 8)
        .with(Lead, seq(&[
            bar![67, _, _, 67, 67, _, 71, 72, 74, _, _, _, 67, _, _, _],
            bar![76, _, 74, 72, 74, _, 72, 71, 72, _, _, _, 67, _, _, _],
            bar![79, _, _, _, 74, _, _, _, 76, _, 74, 72, 71, _, _, _],
            bar![69, 67, 69, 71, 72, 71, 72, 74, 76, _, 74, _, 79, _, _, _],
            bar![67, _, _, 67, 67, _, 71, 72, 74, _, _, _, 67, _, _, _],
            bar![76, _, 74, 72, 74, _, 72, 71, 72, _, _, _, 67, _, _, _],
            bar![64, _, 66, _, 67, _, 69, _, 71, _, 72, _, 74, _, 76, _],
            bar![79, _, _, _, _, _, _, _, 79, _, _, _, 67, _, _, _],
        ]))
        .with(Bass, rep(&seq(&[
            bar![43, _, 43, _, 43, _, 43, _, 43, _, 43, _, 43, _, 43, _],
            bar![48, _, 48, _, 48, _, 48, _, 43, _, 43, _, 43, _, 43, _],
            bar![43, _, 43, _, 50, _, 50, _, 48, _, 48, _, 47, _, 47, _],
            bar![45, _, 45, _, 47, _, 47, _, 50, _, 50, _, 43, _, _, _],
        ]), 2))
        .with(Percussion, rep(&seq(&[
            bar![K, _, S, _, K, _, S, _, K, _, S, _, K, _, S, _],
            bar![K, _, S, _, K, _, S, _, K, _, S, _, K, _, S, _],
            bar![K, _, S, _, K, _, S, _, K, _, S, _, K, _, S, _],
            bar![K, _, S, _, K, _, S, _, S, S, S, S, K, S, K, S],
        ]), 2));

    let march = Section::new("Theme B (March)", 4)
        .with(Lead, seq(&[
            bar![60, _, _, _, 62, _, _, _, 64, _, _, _, 60, _, _, _],
            bar![59, _, _, _, 60, _, _, _, 62, _, _, _, 59, _, _, _],
            bar![57, _, 59, _, 60, _, 62, _, 64, _, 65, _, 67, _, 69, _],
            bar![72, _, _, _, 71, _, _, _, 72, _, _, _, _, _, _, _],
        ]))
        .with(Harmony, seq(&[
            bar![52, 55, 52, 55, 52, 55, 52, 55, 52, 55, 52, 55, 52, 55, 52, 55],
            bar![50, 54, 50, 54, 50, 54, 50, 54, 50, 54, 50, 54, 50, 54, 50, 54],
            bar![48, 52, 48, 52, 48, 52, 48, 52, 48, 52, 48, 52, 48, 52, 48, 52],
            bar![47, 50, 47, 50, 47, 50, 47, 50, 47, 50, 47, 50, 47, 50, 47, 50],
        ]))
        .with(Percussion, rep(&seq(&[
            bar![T, _, _, _, T, _, _, _, S, _, S, _, S, _, S, _],
        ]), 4));

    Theme::new(110.0, 2, vec![intro, fanfare, march])
}

// "Engines of War": industrial, C minor.
fn aethelgard() -> Theme {
    let intro = Section::new("Intro", 2)
        .with(Bass, seq(&[
            bar![36, _, 36, _, 36, _, 36, _, 36, _, 36, _, 39, 38, 36, _],
            bar![36, _, 36, _, 36, _, 36, _, 36, _, 36, _, 43, 41, 39, _],
        ]))
        .with(Percussion, seq(&[
            bar![K, _, _, _, K, _, _, _, K, _, _, _, S, _, S, _],
            bar![K, _, _, _, K, _, _, _, K, _, _, _, S, _, S, _],
        ]));

    let riff = Section::new("Main Riff", 8)
        .with(Lead, seq(&[
            bar![_, _, _, _, 60, _, _, _, _, _, _, _, 63, _, 62, _],
            bar![_, _, _, _, 60, _, _, _, _, _, _, _, 58, _, 55, _],
            bar![60, _, 60, _, 67, _, _, _, 60, _, 60, _, 65, _, _, _],
            bar![60, _, 60, _, 63, _, _, _, 62, 60, 58, 60, 62, _, _, _],
            bar![_, _, _, _, 60, _, _, _, _, _, _, _, 63, _, 62, _],
            bar![_, _, _, _, 60, _, _, _, _, _, _, _, 58, _, 55, _],
            bar![60, 60, 63, 63, 65, 65, 67, 67, 72, _, _, _, 70, _, _, _],
            bar![67, _, _, _, 65, _, _, _, 63, _, _, _, 62, _, _, _],
        ]))
        .with(Bass, rep(&seq(&[
            bar![36, _, 36, _, 36, _, 36, _, 36, _, 36, _, 39, _, 38, _],
            bar![36, _, 36, _, 36, _, 36, _, 36, _, 36, _, 34, _, 31, _],
            bar![36, 36, _, 36, _, 36, _, 36, 36, 36, _, 36, _, 36, _, 36],
            bar![36, 36, _, 36, _, 36, _, 36, 38, 38, _, 38, 43, 43, 43, _],
        ]), 2))
        .with(Percussion, rep(&seq(&[
            bar![K, _, S, _, K, _, S, _, K, _, S, _, K, K, S, _],
            bar![K, _, S, _, K, _, S, _, K, _, S, _, S, S, S, S],
            bar![K, _, H, _, K, _, H, _, K, _, H, _, K, _, H, _],
            bar![K, _, H, _, K, _, H, _, K, _, H, _, K, S, K, S],
        ]), 2));

    let breakdown = Section::new("Breakdown", 4)
        .with(Harmony, seq(&[
            bar![48, _, 51, _, 55, _, 51, _, 48, _, 51, _, 55, _, 51, _],
            bar![46, _, 50, _, 53, _, 50, _, 46, _, 50, _, 53, _, 50, _],
            bar![44, _, 48, _, 51, _, 48, _, 44, _, 48, _, 51, _, 48, _],
            bar![43, _, 46, _, 50, _, 46, _, 43, _, 46, _, 50, _, 46, _],
        ]))
        .with(Bass, seq(&[
            bar![36, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![34, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![32, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![31, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
        ]));

    Theme::new(125.0, 2, vec![intro, riff, breakdown])
}

// "Neon Grid": synthwave, F minor.
fn chronomach() -> Theme {
    let pattern_a = Section::new("Pattern A", 4)
        .with(Harmony, seq(&[
            bar![65, 68, 72, 77, 65, 68, 72, 77, 65, 68, 72, 77, 65, 68, 72, 77],
            bar![63, 66, 70, 75, 63, 66, 70, 75, 63, 66, 70, 75, 63, 66, 70, 75],
            bar![61, 65, 68, 73, 61, 65, 68, 73, 61, 65, 68, 73, 61, 65, 68, 73],
            bar![60, 63, 67, 72, 60, 63, 67, 72, 60, 63, 67, 72, 60, 63, 67, 72],
        ]))
        .with(Bass, seq(&[
            bar![41, _, _, _, 41, _, _, _, 41, _, _, _, 41, _, _, _],
            bar![39, _, _, _, 39, _, _, _, 39, _, _, _, 39, _, _, _],
            bar![37, _, _, _, 37, _, _, _, 37, _, _, _, 37, _, _, _],
            bar![36, _, _, _, 36, _, _, _, 36, _, _, _, 36, _, _, _],
        ]))
        .with(Percussion, rep(&seq(&[
            bar![K, _, H, _, S, _, H, _, K, _, H, _, S, _, H, _],
        ]), 4));

    let pattern_b = Section::new("Pattern B (Lead)", 8)
        .with(Lead, seq(&[
            bar![77, _, _, _, 72, _, _, _, 68, _, _, _, 65, _, _, _],
            bar![75, _, _, _, 70, _, _, _, 66, _, _, _, 63, _, _, _],
            bar![73, _, _, _, 68, _, _, _, 65, _, _, _, 61, _, _, _],
            bar![72, _, _, _, 67, _, _, _, 63, _, _, _, 60, _, _, _],
            bar![77, 77, _, 77, 80, 80, _, 80, 72, 72, _, 72, _, _, _, _],
            bar![75, 75, _, 75, 79, 79, _, 79, 70, 70, _, 70, _, _, _, _],
            bar![73, _, 72, _, 70, _, 68, _, 65, _, 68, _, 70, _, 72, _],
            bar![72, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
        ]))
        .with(Harmony, rep(&seq(&[
            bar![65, _, _, _, _, _, _, _, 65, _, _, _, _, _, _, _],
            bar![63, _, _, _, _, _, _, _, 63, _, _, _, _, _, _, _],
            bar![61, _, _, _, _, _, _, _, 61, _, _, _, _, _, _, _],
            bar![60, _, _, _, _, _, _, _, 60, _, _, _, _, _, _, _],
        ]), 2))
        .with(Bass, rep(&seq(&[
            bar![41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41, 41],
            bar![39, 39, 39, 39, 39, 39, 39, 39, 39, 39, 39, 39, 39, 39, 39, 39],
            bar![37, 37, 37, 37, 37, 37, 37, 37, 37, 37, 37, 37, 37, 37, 37, 37],
            bar![36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36, 36],
        ]), 2))
        .with(Percussion, rep(&seq(&[
            bar![K, _, H, _, S, _, H, _, K, _, H, _, S, _, H, _],
        ]), 8));

    Theme::new(135.0, 0, vec![pattern_a, pattern_b])
}

// "Sacred Silence": slow hymn, C lydian.
fn celestial() -> Theme {
    let hymn = Section::new("Hymn", 8)
        .with(Harmony, seq(&[
            bar![60, _, _, _, 64, _, _, _, 67, _, _, _, 72, _, _, _],
            bar![62, _, _, _, 66, _, _, _, 69, _, _, _, 74, _, _, _],
            bar![59, _, _, _, 62, _, _, _, 66, _, _, _, 71, _, _, _],
            bar![60, _, _, _, 64, _, _, _, 67, _, _, _, 72, _, _, _],
            bar![57, _, _, _, 60, _, _, _, 64, _, _, _, 69, _, _, _],
            bar![52, _, _, _, 55, _, _, _, 59, _, _, _, 64, _, _, _],
            bar![53, _, _, _, 57, _, _, _, 60, _, _, _, 65, _, _, _],
            bar![55, _, _, _, 59, _, _, _, 62, _, _, _, 67, _, _, _],
        ]))
        .with(Lead, seq(&[
            bar![72, _, _, _, _, _, _, _, 76, _, _, _, 79, _, _, _],
            bar![78, _, _, _, _, _, _, _, 74, _, _, _, _, _, _, _],
            bar![71, _, _, _, _, _, _, _, 74, _, _, _, _, _, _, _],
            bar![72, _, _, _, _, _, _, _, 67, _, _, _, _, _, _, _],
            bar![69, _, _, _, _, _, _, _, 72, _, _, _, 76, _, _, _],
            bar![71, _, _, _, _, _, _, _, 67, _, _, _, _, _, _, _],
            bar![65, _, _, _, 67, _, _, _, 69, _, _, _, 71, _, _, _],
            bar![72, _, _, _, 74, _, _, _, 76, _, _, _, 79, _, _, _],
        ]))
        .with(Bass, seq(&[
            bar![36, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![38, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![35, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![36, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![33, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![28, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![29, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![31, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
        ]));

    Theme::new(55.0, 0, vec![hymn])
}

// "Threads of Fate": whole-tone figures.
fn weavers() -> Theme {
    let lp = Section::new("Loop", 8)
        .with(Lead, seq(&[
            bar![64, _, _, _, 66, _, _, _, 68, _, _, _, 70, _, _, _],
            bar![72, _, _, _, 70, _, _, _, 76, _, _, _, _, _, _, _],
            bar![64, _, 66, _, 68, _, 70, _, 72, _, 76, _, 80, _, _, _],
            bar![_, _, _, _, _, _, _, _, 60, _, _, _, 56, _, _, _],
            bar![64, 66, 68, 70, 72, _, _, _, 64, 66, 68, 70, 72, _, _, _],
            bar![60, 62, 64, 66, 68, _, _, _, 56, 58, 60, 62, 64, _, _, _],
            bar![52, _, 56, _, 60, _, 64, _, 68, _, 72, _, 76, _, _, _],
            bar![80, _, _, _, 76, _, _, _, 72, _, _, _, 68, _, _, _],
        ]))
        .with(Harmony, seq(&[
            bar![_, _, 68, _, _, _, 72, _, _, _, 76, _, _, _, 80, _],
            bar![_, _, 68, _, _, _, 72, _, _, _, 76, _, _, _, 80, _],
            bar![60, _, _, _, 64, _, _, _, 68, _, _, _, 72, _, _, _],
            bar![52, _, _, _, 56, _, _, _, 60, _, _, _, 64, _, _, _],
            bar![_, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![_, _, _, _, _, _, _, _, _, _, _, _, _, _, _, _],
            bar![60, _, _, _, 60, _, _, _, 60, _, _, _, 60, _, _, _],
            bar![56, _, _, _, 56, _, _, _, 56, _, _, _, 56, _, _, _],
        ]));

    Theme::new(80.0, 0, vec![lp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::theme::{Drum, Note};
    use crate::shared::{Part, STEPS_PER_BAR};
    use std::sync::Arc;

    #[test]
    fn every_builtin_theme_validates() {
        builtin().validate().unwrap();
    }

    #[test]
    fn every_part_is_bars_times_sixteen_and_loop_start_in_range() {
        let lib = builtin();
        for id in ThemeId::ALL {
            let theme = lib.get(id).unwrap();
            for section in theme.sections.iter() {
                for part in Part::ALL {
                    if let Some(steps) = section.part(part) {
                        assert_eq!(steps.len(), section.bars * STEPS_PER_BAR, "{id} / {}", section.name);
                    }
                }
            }
            assert!(theme.loop_start_bar < theme.total_bars(), "{id}");
        }
    }

    #[test]
    fn aliases_reuse_their_base_sections() {
        let lib = builtin();
        let pairs = [
            (ThemeId::Menu, ThemeId::Celestial, 55.0),
            (ThemeId::Battle, ThemeId::Aethelgard, 140.0),
            (ThemeId::Victory, ThemeId::Pantheon, 90.0),
            (ThemeId::Defeat, ThemeId::Veridian, 60.0),
        ];
        for (alias, base, bpm) in pairs {
            let a = lib.get(alias).unwrap();
            let b = lib.get(base).unwrap();
            assert!(Arc::ptr_eq(&a.sections, &b.sections), "{alias}");
            assert_eq!(a.bpm, bpm);
            assert_eq!(a.loop_start_bar, b.loop_start_bar);
        }
    }

    #[test]
    fn spot_check_score_content() {
        let lib = builtin();
        let pantheon = lib.get(ThemeId::Pantheon).unwrap();
        assert_eq!(pantheon.total_bars(), 14);
        let (intro, _) = pantheon.locate(1).unwrap();
        assert_eq!(intro.note_at(Part::Percussion, 16 + 8), Some(Note::Drum(Drum::Timpani)));
        let weavers = lib.get(ThemeId::Weavers).unwrap();
        let (lp, _) = weavers.locate(4).unwrap();
        assert_eq!(lp.note_at(Part::Harmony, 4 * 16), None);
    }
}
