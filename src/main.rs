use std::path::{Path, PathBuf};

use anyhow::Context;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use overture::audio::{block_peak, write_wav, OfflineBackend};
use overture::audio_api::AudioBackend;
use overture::pipeline::{library, persistence, EngineConfig, RoutingTable, ThemeId};
use overture::shared::InputEvent;
use overture::transport::{BackendFactory, MusicEngine};
use overture::tui;

const USAGE: &str = "usage: overture [--config FILE] [render THEME SECONDS OUT.wav | save-config OUT.json]";
const RENDER_SAMPLE_RATE: u32 = 44_100;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = take_flag(&mut args, "--config")?;
    let config = match config_path {
        Some(path) => persistence::load_config(&path)?,
        None => EngineConfig::default(),
    };

    match args.first().map(String::as_str) {
        None => run_tui(config),
        Some("render") => match &args[1..] {
            [theme, secs, out] => {
                let secs: f64 = secs.parse().with_context(|| format!("bad duration {secs:?}"))?;
                render_to_file(config, theme, secs, Path::new(out))
            }
            _ => anyhow::bail!(USAGE),
        },
        // writes the effective settings, a starting point for --config
        Some("save-config") => match &args[1..] {
            [out] => {
                persistence::save_config(Path::new(out), &config)?;
                println!("wrote {out}");
                Ok(())
            }
            _ => anyhow::bail!(USAGE),
        },
        Some(other) => anyhow::bail!("unknown command {other:?}\n{USAGE}"),
    }
}

// removes `--flag VALUE` from the argument list
fn take_flag(args: &mut Vec<String>, flag: &str) -> anyhow::Result<Option<PathBuf>> {
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if i + 1 >= args.len() {
        anyhow::bail!("{flag} needs a value\n{USAGE}");
    }
    let value = args.remove(i + 1);
    args.remove(i);
    Ok(Some(PathBuf::from(value)))
}

fn render_to_file(config: EngineConfig, theme: &str, secs: f64, out: &Path) -> anyhow::Result<()> {
    if !(secs.is_finite() && secs > 0.0) {
        anyhow::bail!("duration must be positive, got {secs}");
    }
    let config = EngineConfig {
        poll_interval_ms: 0,
        ..config
    };
    let backend = OfflineBackend::new(&config, RENDER_SAMPLE_RATE);
    let shared = backend.clone();
    let factory: BackendFactory = Box::new(move || -> anyhow::Result<Box<dyn AudioBackend>> {
        Ok(Box::new(shared.clone()))
    });
    let engine = MusicEngine::new(config, library::builtin(), RoutingTable::builtin(), factory)?;

    engine.play_music(theme);
    let frames = backend.render_for(secs, 512, || {
        engine.pump();
    });
    write_wav(out, &frames, RENDER_SAMPLE_RATE)?;

    let snap = engine.snapshot();
    println!(
        "wrote {} ({secs} s of {}, peak {:.3})",
        out.display(),
        snap.theme.map_or("-", ThemeId::name),
        block_peak(&frames)
    );
    Ok(())
}

fn run_tui(config: EngineConfig) -> anyhow::Result<()> {
    let engine = MusicEngine::with_device(config)?;

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let mut audio_failed = false;

    loop {
        let ds = tui::mode::display_state(&engine.snapshot(), audio_failed);
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds);
        })?;

        for event in tui::input::poll_input(tick_rate)? {
            match event {
                InputEvent::SelectTheme(i) => {
                    if let Some(id) = ThemeId::ALL.get(i as usize) {
                        engine.play_music(id.name());
                        audio_failed = engine.snapshot().audio.is_none();
                    }
                }
                InputEvent::Stop => engine.stop_music(),
                InputEvent::ToggleMute => {
                    engine.toggle_mute();
                }
                InputEvent::Quit => {
                    engine.stop_music();
                    drop(term);
                    return Ok(());
                }
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
