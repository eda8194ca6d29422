use std::sync::{Arc, Mutex};

use overture::audio::{block_peak, OfflineBackend};
use overture::audio_api::AudioBackend;
use overture::pipeline::{library, EngineConfig, RoutingTable, ThemeId};
use overture::{BackendFactory, MusicEngine};

const SR: u32 = 8_000;

// An engine wired to an offline backend. Time only moves in `advance`, which
// renders in small blocks and pumps the scheduler after each, like the
// polling thread would against a real device.
struct Rig {
    backend: OfflineBackend,
    engine: MusicEngine,
}

impl Rig {
    fn new() -> Self {
        let config = EngineConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let backend = OfflineBackend::new(&config, SR);
        let shared = backend.clone();
        let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> {
            Ok(Box::new(shared.clone()))
        });
        let engine = MusicEngine::new(config, library::builtin(), RoutingTable::builtin(), factory).unwrap();
        Self { backend, engine }
    }

    fn advance(&self, secs: f64) -> f32 {
        let frames = self.backend.render_for(secs, 256, || {
            self.engine.pump();
        });
        assert!(frames.iter().all(|f| f.left.is_finite() && f.right.is_finite()));
        block_peak(&frames)
    }
}

#[test]
fn playing_the_current_theme_again_changes_nothing() {
    let rig = Rig::new();
    rig.engine.play_music("veridian");
    rig.advance(1.0);
    let before = rig.engine.snapshot();
    let voices_before = (rig.backend.status().active_voices, rig.backend.voices_for(ThemeId::Veridian));
    assert!(voices_before.1 > 0);

    rig.engine.play_music("veridian");
    rig.engine.play_music(" VERIDIAN ");
    let after = rig.engine.snapshot();
    let voices_after = (rig.backend.status().active_voices, rig.backend.voices_for(ThemeId::Veridian));
    assert_eq!(before.next_event_time, after.next_event_time);
    assert_eq!((before.bar, before.step), (after.bar, after.step));
    assert_eq!(voices_before, voices_after);
    assert!(after.running);
}

#[test]
fn switching_themes_leaves_no_voices_from_the_old_one() {
    let rig = Rig::new();
    rig.engine.play_music("aethelgard");
    rig.advance(1.5);
    assert!(rig.backend.voices_for(ThemeId::Aethelgard) > 0);

    rig.engine.play_music("pantheon");
    let snap = rig.engine.snapshot();
    assert_eq!(snap.theme, Some(ThemeId::Pantheon));
    assert_eq!((snap.bar, snap.step), (0, 0));

    rig.advance(0.25);
    assert_eq!(rig.backend.voices_for(ThemeId::Aethelgard), 0);
    assert!(rig.backend.voices_for(ThemeId::Pantheon) > 0);
}

#[test]
fn stop_silences_everything_within_the_fade() {
    let rig = Rig::new();
    rig.engine.play_music("battle");
    assert!(rig.advance(1.0) > 0.0);

    rig.engine.stop_music();
    assert!(!rig.engine.snapshot().running);
    rig.advance(0.15);
    assert_eq!(rig.backend.status().active_voices, 0);

    // second stop is harmless
    rig.engine.stop_music();
    rig.advance(0.1);
    assert_eq!(rig.backend.status().active_voices, 0);
    assert!(!rig.engine.snapshot().running);
}

#[test]
fn stop_then_play_restarts_from_the_top() {
    let rig = Rig::new();
    rig.engine.play_music("weavers");
    rig.advance(4.0);
    assert!(rig.engine.snapshot().bar > 0);

    rig.engine.stop_music();
    rig.engine.play_music("weavers");
    let snap = rig.engine.snapshot();
    assert_eq!((snap.bar, snap.step), (0, 0));
    assert!(snap.running);
}

#[test]
fn mute_twice_restores_flag_and_level() {
    let rig = Rig::new();
    rig.engine.play_music("chronomach");
    rig.advance(0.5);
    let volume = EngineConfig::default().volume;
    assert!((rig.backend.status().master_gain - volume).abs() < 1e-6);

    assert!(rig.engine.toggle_mute());
    rig.advance(2.0);
    assert!(rig.backend.status().master_gain < 1e-3);
    assert!(rig.engine.snapshot().running);

    assert!(!rig.engine.toggle_mute());
    rig.advance(2.0);
    assert!((rig.backend.status().master_gain - volume).abs() < 1e-3);
    assert!(!rig.engine.is_muted());
}

#[test]
fn unknown_names_play_the_default_theme() {
    let unknown = Rig::new();
    let menu = Rig::new();
    unknown.engine.play_music("nonexistent");
    menu.engine.play_music("menu");

    let a = unknown.engine.snapshot();
    let b = menu.engine.snapshot();
    assert_eq!(a.theme, Some(ThemeId::Menu));
    assert_eq!((a.theme, a.bar, a.step, a.next_event_time), (b.theme, b.bar, b.step, b.next_event_time));

    // "tension" was never written, so it falls back too
    let tension = Rig::new();
    tension.engine.play_music("tension");
    assert_eq!(tension.engine.snapshot().theme, Some(ThemeId::Menu));
}

#[test]
fn output_that_fails_once_is_retried_on_the_next_play() {
    let config = EngineConfig {
        poll_interval_ms: 0,
        ..Default::default()
    };
    let backend = OfflineBackend::new(&config, SR);
    let shared = backend.clone();
    let attempts = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&attempts);
    let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> {
        let mut n = counter.lock().unwrap();
        *n += 1;
        if *n == 1 {
            anyhow::bail!("device busy");
        }
        Ok(Box::new(shared.clone()))
    });
    let engine = MusicEngine::new(config, library::builtin(), RoutingTable::builtin(), factory).unwrap();

    engine.play_music("veridian");
    let snap = engine.snapshot();
    assert!(!snap.running);
    assert!(snap.audio.is_none());

    engine.play_music("veridian");
    assert!(engine.snapshot().running);
    assert_eq!(*attempts.lock().unwrap(), 2);
}

#[test]
fn every_theme_renders_audible_music() {
    for id in ThemeId::ALL {
        let rig = Rig::new();
        rig.engine.play_music(id.name());
        let peak = rig.advance(2.0);
        assert!(peak > 1e-3, "{id} peak {peak}");
        assert!(peak < 1.5, "{id} peak {peak}");
    }
}
