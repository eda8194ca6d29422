// The public face of the engine: play, stop and mute, callable from any
// thread. All state sits behind one mutex shared with the polling thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{select, Sender};

use crate::audio::{synthesize, CpalBackend};
use crate::audio_api::{AudioBackend, AudioCommand, BackendStatus};
use crate::error::ConfigError;
use crate::pipeline::{library, EngineConfig, RoutingTable, ThemeId, ThemeLibrary};
use crate::scheduler::Sequencer;

/// Opens the audio output. Called lazily on the first play, and again on
/// later plays for as long as it keeps failing.
pub type BackendFactory = Box<dyn FnMut() -> anyhow::Result<Box<dyn AudioBackend>> + Send>;

// time constant for gain changes that should land before anything is heard
const IMMEDIATE_SECS: f64 = 0.001;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineSnapshot {
    pub theme: Option<ThemeId>,
    pub running: bool,
    pub bar: usize,
    pub step: usize,
    pub next_event_time: Option<f64>,
    pub muted: bool,
    pub active_voices: usize,
    pub audio: Option<BackendStatus>, // None until the output has been opened
}

struct EngineState {
    config: EngineConfig,
    library: ThemeLibrary,
    routing: RoutingTable,
    factory: BackendFactory,
    backend: Option<Box<dyn AudioBackend>>,
    sequencer: Sequencer,
    muted: bool,
    generation: u64,
    voice_seed: u64,
}

impl EngineState {
    fn clock(&self) -> f64 {
        self.backend.as_ref().map_or(0.0, |b| b.status().clock)
    }

    fn ensure_backend(&mut self) -> bool {
        if self.backend.is_none() {
            match (self.factory)() {
                Ok(backend) => {
                    log::info!("audio output opened at {} Hz", backend.sample_rate());
                    if self.muted {
                        let at = backend.status().clock;
                        backend.send(AudioCommand::SetMasterGain {
                            target: 0.0,
                            at,
                            time_constant: IMMEDIATE_SECS,
                        });
                    }
                    self.backend = Some(backend);
                }
                Err(e) => {
                    log::warn!("audio output unavailable, music disabled: {e:#}");
                    return false;
                }
            }
        }
        if let Some(backend) = &self.backend {
            if let Err(e) = backend.resume() {
                log::warn!("could not resume audio output: {e:#}");
            }
        }
        true
    }

    /// Returns the new generation when playback (re)started.
    fn play(&mut self, name: &str) -> Option<u64> {
        if !self.ensure_backend() {
            return None;
        }
        let theme = self.library.resolve(name, self.config.default_theme);
        if !theme.name().eq_ignore_ascii_case(name.trim()) {
            log::debug!("no theme called {name:?}, playing {theme}");
        }
        if self.sequencer.position().map(|p| p.theme) == Some(theme) {
            return None;
        }
        if self.sequencer.is_running() {
            self.halt();
        }

        let first = self.clock() + self.config.start_offset_secs;
        self.sequencer.arm(theme, first);
        self.generation += 1;
        self.pump();
        log::info!("playing {theme}");
        Some(self.generation)
    }

    fn halt(&mut self) {
        self.sequencer.disarm();
        self.generation += 1;
        if let Some(backend) = &self.backend {
            let at = backend.status().clock;
            backend.send(AudioCommand::StopAll {
                at,
                fade: self.config.stop_fade_secs,
            });
        }
    }

    fn pump(&mut self) -> usize {
        let Some(backend) = self.backend.as_deref() else {
            return 0;
        };
        let now = backend.status().clock;
        let routing = &self.routing;
        let seed = &mut self.voice_seed;

        self.sequencer
            .pump(&self.library, now, self.config.lookahead_secs, |req| {
                let route = routing.route(req.theme, req.part);
                *seed = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
                let duration = req.duration * route.duration_scale;
                if let Some(voice) = synthesize(route.instrument, req.note, req.time, duration, route.bus, *seed) {
                    backend.send(AudioCommand::SpawnVoice(Box::new(voice.owned_by(req.theme))));
                }
            })
    }

    fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        // a freshly opened output already starts at the right level
        let was_open = self.backend.is_some();
        if self.ensure_backend() && was_open {
            if let Some(backend) = &self.backend {
                let target = if self.muted { 0.0 } else { self.config.volume };
                backend.send(AudioCommand::SetMasterGain {
                    target,
                    at: backend.status().clock,
                    time_constant: self.config.mute_time_constant_secs,
                });
            }
        }
        log::info!("music {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }

    fn snapshot(&self) -> EngineSnapshot {
        let pos = self.sequencer.position();
        let audio = self.backend.as_ref().map(|b| b.status());
        EngineSnapshot {
            theme: pos.map(|p| p.theme),
            running: pos.is_some(),
            bar: pos.map_or(0, |p| p.bar),
            step: pos.map_or(0, |p| p.step),
            next_event_time: pos.map(|p| p.next_event_time),
            muted: self.muted,
            active_voices: audio.map_or(0, |a| a.active_voices),
            audio,
        }
    }
}

fn lock(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// Background thread pumping the sequencer on a fixed cadence until cancelled
// or until the playback it was started for has been replaced.
struct Poller {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

impl Poller {
    fn spawn(state: Arc<Mutex<EngineState>>, generation: u64, every: Duration) -> Option<Self> {
        let (cancel, cancelled) = crossbeam_channel::bounded::<()>(1);
        let spawned = std::thread::Builder::new()
            .name("overture-scheduler".into())
            .spawn(move || {
                let ticker = crossbeam_channel::tick(every);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let mut s = lock(&state);
                            if s.generation != generation {
                                break;
                            }
                            s.pump();
                        }
                        recv(cancelled) -> _ => break,
                    }
                }
            });
        match spawned {
            Ok(handle) => Some(Self { cancel, handle }),
            Err(e) => {
                log::error!("could not start scheduler thread: {e}");
                None
            }
        }
    }

    fn stop(self) {
        drop(self.cancel);
        let _ = self.handle.join();
    }
}

pub struct MusicEngine {
    state: Arc<Mutex<EngineState>>,
    poller: Mutex<Option<Poller>>, // always locked before `state`
    poll_interval: Duration,
}

impl MusicEngine {
    pub fn new(
        config: EngineConfig,
        library: ThemeLibrary,
        routing: RoutingTable,
        factory: BackendFactory,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        library.validate()?;
        if !library.contains(config.default_theme) {
            return Err(ConfigError::setting(
                "default_theme",
                format!("'{}' is not in the theme library", config.default_theme),
            ));
        }
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        Ok(Self {
            state: Arc::new(Mutex::new(EngineState {
                config,
                library,
                routing,
                factory,
                backend: None,
                sequencer: Sequencer::new(),
                muted: false,
                generation: 0,
                voice_seed: 0,
            })),
            poller: Mutex::new(None),
            poll_interval,
        })
    }

    /// Built-in themes and routing, playing through the default output device.
    pub fn with_device(config: EngineConfig) -> Result<Self, ConfigError> {
        let device_config = config.clone();
        let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> {
            let backend = CpalBackend::start(&device_config)?;
            Ok(Box::new(backend) as Box<dyn AudioBackend>)
        });
        Self::new(config, library::builtin(), RoutingTable::builtin(), factory)
    }

    /// Starts the named theme from its first bar. Unknown names play the
    /// default theme; asking for the theme already playing changes nothing.
    pub fn play_music(&self, name: &str) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = lock(&self.state);
        let Some(generation) = state.play(name) else {
            return;
        };
        drop(state);

        if let Some(old) = poller.take() {
            old.stop();
        }
        if !self.poll_interval.is_zero() {
            *poller = Poller::spawn(Arc::clone(&self.state), generation, self.poll_interval);
        }
    }

    /// Stops scheduling and fades out everything that is sounding.
    /// Harmless when nothing is playing.
    pub fn stop_music(&self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut state = lock(&self.state);
            if state.sequencer.is_running() {
                log::info!("stopping music");
            }
            state.halt();
        }
        if let Some(old) = poller.take() {
            old.stop();
        }
    }

    /// Flips the mute flag and returns the new value. Works whether or not
    /// music is playing. Opens (or resumes) the output like `play_music`;
    /// the flag still flips when the output cannot be opened.
    pub fn toggle_mute(&self) -> bool {
        lock(&self.state).toggle_mute()
    }

    pub fn is_muted(&self) -> bool {
        lock(&self.state).muted
    }

    /// Runs one scheduling pass by hand. This is how time moves forward when
    /// `poll_interval_ms` is 0.
    pub fn pump(&self) -> usize {
        lock(&self.state).pump()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        lock(&self.state).snapshot()
    }
}

impl Drop for MusicEngine {
    fn drop(&mut self) {
        let poller = self.poller.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(p) = poller {
            p.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineBackend;

    fn manual_config() -> EngineConfig {
        EngineConfig {
            poll_interval_ms: 0,
            ..Default::default()
        }
    }

    fn engine_with(backend: &OfflineBackend) -> MusicEngine {
        let shared = backend.clone();
        let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> { Ok(Box::new(shared.clone())) });
        MusicEngine::new(manual_config(), library::builtin(), RoutingTable::builtin(), factory).unwrap()
    }

    #[test]
    fn first_play_arms_slightly_ahead_of_the_clock() {
        let backend = OfflineBackend::new(&manual_config(), 8_000);
        let engine = engine_with(&backend);
        engine.play_music("veridian");
        let snap = engine.snapshot();
        assert_eq!(snap.theme, Some(ThemeId::Veridian));
        assert!(snap.running);
        assert_eq!((snap.bar, snap.step), (0, 0));
        assert_eq!(snap.next_event_time, Some(0.1));
    }

    #[test]
    fn unknown_default_theme_is_rejected() {
        let mut lib = ThemeLibrary::default();
        let veridian = library::builtin().get(ThemeId::Veridian).cloned().unwrap();
        lib.insert(ThemeId::Veridian, veridian);
        let factory: BackendFactory = Box::new(|| -> anyhow::Result<Box<dyn AudioBackend>> { anyhow::bail!("unused") });
        let err = MusicEngine::new(manual_config(), lib, RoutingTable::builtin(), factory).err();
        assert!(matches!(err, Some(ConfigError::InvalidSetting { name: "default_theme", .. })));
    }

    #[test]
    fn failing_output_leaves_engine_stopped_and_retries() {
        let attempts = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&attempts);
        let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> {
            *counter.lock().unwrap() += 1;
            anyhow::bail!("no device")
        });
        let engine = MusicEngine::new(manual_config(), library::builtin(), RoutingTable::builtin(), factory).unwrap();
        engine.play_music("battle");
        engine.play_music("battle");
        assert_eq!(*attempts.lock().unwrap(), 2);
        let snap = engine.snapshot();
        assert!(!snap.running);
        assert!(snap.audio.is_none());
    }

    #[test]
    fn mute_before_output_exists_still_flips() {
        let backend = OfflineBackend::new(&manual_config(), 8_000);
        let engine = engine_with(&backend);
        assert!(engine.toggle_mute());
        engine.play_music("menu");
        backend.render(800);
        assert!(backend.status().master_gain < 1e-6);
    }

    #[test]
    fn mute_opens_the_output_once() {
        let backend = OfflineBackend::new(&manual_config(), 8_000);
        let shared = backend.clone();
        let attempts = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&attempts);
        let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> {
            *counter.lock().unwrap() += 1;
            Ok(Box::new(shared.clone()))
        });
        let engine = MusicEngine::new(manual_config(), library::builtin(), RoutingTable::builtin(), factory).unwrap();

        assert!(engine.toggle_mute());
        assert_eq!(*attempts.lock().unwrap(), 1);
        assert!(engine.snapshot().audio.is_some());
        assert!(!engine.snapshot().running);

        assert!(!engine.toggle_mute());
        engine.play_music("menu");
        assert_eq!(*attempts.lock().unwrap(), 1);
        backend.render(8_000);
        let volume = EngineConfig::default().volume;
        assert!((backend.status().master_gain - volume).abs() < 1e-3);
    }

    #[test]
    fn mute_flips_even_when_the_output_fails() {
        let factory: BackendFactory = Box::new(|| -> anyhow::Result<Box<dyn AudioBackend>> { anyhow::bail!("no device") });
        let engine = MusicEngine::new(manual_config(), library::builtin(), RoutingTable::builtin(), factory).unwrap();
        assert!(engine.toggle_mute());
        assert!(engine.is_muted());
        assert!(engine.snapshot().audio.is_none());
    }

    #[test]
    fn threaded_poller_keeps_the_sequence_moving() {
        let backend = OfflineBackend::new(&manual_config(), 8_000);
        let shared = backend.clone();
        let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> { Ok(Box::new(shared.clone())) });
        let config = EngineConfig {
            poll_interval_ms: 5,
            ..Default::default()
        };
        let engine = MusicEngine::new(config, library::builtin(), RoutingTable::builtin(), factory).unwrap();
        engine.play_music("pantheon");
        let before = engine.snapshot().next_event_time.unwrap();
        backend.render(8_000);
        std::thread::sleep(Duration::from_millis(100));
        let after = engine.snapshot().next_event_time.unwrap();
        assert!(after > before + 0.5);
        engine.stop_music();
        assert!(!engine.snapshot().running);
    }
}
