use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(Self::state_dir_under(home))
        } else {
            ProjectDirs::from("", "", "practic").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn progress_dir() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("progress"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("practic.log"))
    }

    fn state_dir_under<P: AsRef<Path>>(home: P) -> PathBuf {
        home.as_ref().join(".local").join("state").join("practic")
    }
}
