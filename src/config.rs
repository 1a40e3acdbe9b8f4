use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::comments::GISCUS_ORIGIN;
use crate::selector::{SpinSettings, SPIN_INTERVAL_MS, SPIN_STEPS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory for progress slots. `None` means the state directory.
    pub store_path: Option<PathBuf>,
    pub animate_selection: bool,
    pub spin_steps: u32,
    pub spin_interval_ms: u64,
    pub tick_rate_ms: u64,
    pub comment_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            animate_selection: true,
            spin_steps: SPIN_STEPS,
            spin_interval_ms: SPIN_INTERVAL_MS,
            tick_rate_ms: 100,
            comment_origin: GISCUS_ORIGIN.to_string(),
        }
    }
}

impl Config {
    pub fn spin_settings(&self) -> SpinSettings {
        SpinSettings {
            animate: self.animate_selection,
            steps: self.spin_steps,
            interval: Duration::from_millis(self.spin_interval_ms.max(1)),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "practic") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("practic_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
                tracing::warn!(path = %self.path.display(), error = %err, "invalid config, using defaults");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            store_path: Some(dir.path().join("progress")),
            animate_selection: false,
            spin_steps: 4,
            spin_interval_ms: 50,
            tick_rate_ms: 250,
            comment_origin: "https://comments.example.org".into(),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"animate_selection": false}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();

        assert!(!cfg.animate_selection);
        assert_eq!(cfg.spin_steps, SPIN_STEPS);
        assert_eq!(cfg.comment_origin, GISCUS_ORIGIN);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json").unwrap();

        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn spin_settings_follow_config() {
        let cfg = Config {
            animate_selection: false,
            spin_steps: 3,
            spin_interval_ms: 20,
            ..Config::default()
        };
        let spin = cfg.spin_settings();
        assert!(!spin.animate);
        assert_eq!(spin.steps, 3);
        assert_eq!(spin.interval, Duration::from_millis(20));
        assert_eq!(Config { tick_rate_ms: 0, ..cfg }.tick_rate(), Duration::from_millis(1));
    }

    #[test]
    fn zero_spin_interval_is_clamped() {
        let cfg = Config {
            spin_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(cfg.spin_settings().interval, Duration::from_millis(1));
    }
}
