use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Score-history database under $HOME/.local/state/quizbuzz,
    /// falling back to the platform data dir.
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("quizbuzz");
            Some(state_dir.join("history.db"))
        } else {
            ProjectDirs::from("", "", "quizbuzz")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("history.db"))
        }
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "quizbuzz") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("quizbuzz_config.json")
        }
    }
}
