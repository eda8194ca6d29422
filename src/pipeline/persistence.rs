// Reads and writes the engine config as JSON. The engine itself never does
// file I/O; the binary calls this once at startup.
use std::path::Path;

use anyhow::Context;

use super::config::EngineConfig;

/// Missing file means defaults; a file that exists but does not parse or
/// validate is an error.
pub fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    if !path.exists() {
        log::info!("no config at {}, using defaults", path.display());
        return Ok(EngineConfig::default());
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Pretty-printed, so the file doubles as a template for hand edits.
pub fn save_config(path: &Path, config: &EngineConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create the directory if needed
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("overture-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = scratch_dir("missing");
        let cfg = load_config(&dir.join("engine.json")).unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = scratch_dir("saved");
        let path = dir.join("nested").join("engine.json");
        let cfg = EngineConfig { volume: 0.6, poll_interval_ms: 10, ..Default::default() };
        save_config(&path, &cfg).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn saved_defaults_name_the_theme_and_reload() {
        let dir = scratch_dir("template");
        let path = dir.join("engine.json");
        save_config(&path, &EngineConfig::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(r#""default_theme": "menu""#));
        assert_eq!(load_config(&path).unwrap(), EngineConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let dir = scratch_dir("invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.json");
        std::fs::write(&path, r#"{ "volume": 7.0 }"#).unwrap();
        assert!(load_config(&path).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
