// Which instrument plays each part of each theme, and on which bus.
//
// Rows are keyed by the theme id that was *requested*, so aliases such as
// "battle" get the fallback row rather than their base theme's row.

use std::collections::HashMap;

use super::theme::ThemeId;
use crate::audio::Instrument;
use crate::audio_api::Bus;
use crate::shared::Part;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Route {
    pub instrument: Instrument,
    pub bus: Bus,
    pub duration_scale: f64, // multiplies the part's base duration
}

impl Route {
    fn new(instrument: Instrument, bus: Bus) -> Self {
        Self {
            instrument,
            bus,
            duration_scale: 1.0,
        }
    }

    fn scaled(mut self, duration_scale: f64) -> Self {
        self.duration_scale = duration_scale;
        self
    }
}

#[derive(Clone, Debug)]
pub struct RoutingTable {
    routes: HashMap<(ThemeId, Part), Route>,
}

impl RoutingTable {
    pub fn builtin() -> Self {
        use Bus::{Dry, Wet};
        use Instrument::{Brass, Flute, Harp, Strings};

        let rows = [
            (ThemeId::Veridian, Part::Lead, Route::new(Flute, Wet)),
            (ThemeId::Veridian, Part::Harmony, Route::new(Harp, Dry)),
            (ThemeId::Pantheon, Part::Lead, Route::new(Brass, Wet)),
            (ThemeId::Aethelgard, Part::Lead, Route::new(Brass, Dry).scaled(0.5)), // stabs
            (ThemeId::Aethelgard, Part::Harmony, Route::new(Strings, Wet).scaled(2.0)),
            (ThemeId::Celestial, Part::Lead, Route::new(Flute, Wet)),
            (ThemeId::Celestial, Part::Harmony, Route::new(Strings, Wet).scaled(4.0)),
            (ThemeId::Weavers, Part::Lead, Route::new(Flute, Wet)),
            (ThemeId::Chronomach, Part::Lead, Route::new(Harp, Dry)),
            (ThemeId::Chronomach, Part::Harmony, Route::new(Harp, Dry).scaled(0.5)),
        ];

        Self {
            routes: rows
                .into_iter()
                .map(|(theme, part, route)| ((theme, part), route))
                .collect(),
        }
    }

    pub fn route(&self, theme: ThemeId, part: Part) -> Route {
        self.routes
            .get(&(theme, part))
            .copied()
            .unwrap_or_else(|| Self::fallback(part))
    }

    fn fallback(part: Part) -> Route {
        match part {
            Part::Lead => Route::new(Instrument::Harp, Bus::Dry),
            Part::Harmony => Route::new(Instrument::Strings, Bus::Wet),
            Part::Bass => Route::new(Instrument::Bass, Bus::Dry),
            Part::Percussion => Route::new(Instrument::Drums, Bus::Dry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faction_rows_override_the_fallback() {
        let table = RoutingTable::builtin();
        assert_eq!(table.route(ThemeId::Veridian, Part::Lead), Route::new(Instrument::Flute, Bus::Wet));
        let stab = table.route(ThemeId::Aethelgard, Part::Lead);
        assert_eq!((stab.instrument, stab.bus, stab.duration_scale), (Instrument::Brass, Bus::Dry, 0.5));
        assert_eq!(table.route(ThemeId::Celestial, Part::Harmony).duration_scale, 4.0);
    }

    #[test]
    fn aliases_use_the_fallback_row() {
        let table = RoutingTable::builtin();
        assert_eq!(table.route(ThemeId::Menu, Part::Lead), Route::new(Instrument::Harp, Bus::Dry));
        assert_eq!(table.route(ThemeId::Battle, Part::Harmony), Route::new(Instrument::Strings, Bus::Wet));
    }

    #[test]
    fn bass_and_percussion_are_always_dry() {
        let table = RoutingTable::builtin();
        for theme in ThemeId::ALL {
            assert_eq!(table.route(theme, Part::Bass), Route::new(Instrument::Bass, Bus::Dry));
            assert_eq!(table.route(theme, Part::Percussion), Route::new(Instrument::Drums, Bus::Dry));
        }
    }
}
