// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the FLOWCAST_HOME environment variable for isolation.
// When FLOWCAST_HOME is set, config and data live under that directory.
// When unset, config uses ~/.flowcast/ and data uses XDG_DATA_HOME/flowcast.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<Option<ProjectDirs>> = OnceLock::new();

fn project_dirs() -> Option<&'static ProjectDirs> {
    PROJECT_DIRS
        .get_or_init(|| ProjectDirs::from("", "", "flowcast"))
        .as_ref()
}

/// Returns the FLOWCAST_HOME override, if set.
fn flowcast_home() -> Option<PathBuf> {
    std::env::var_os("FLOWCAST_HOME").map(PathBuf::from)
}

/// Home directory, or the current directory when no home can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $FLOWCAST_HOME/ or ~/.flowcast/
pub fn config_dir() -> PathBuf {
    if let Some(home) = flowcast_home() {
        return home;
    }
    dirs_home().join(".flowcast")
}

/// Data directory: $FLOWCAST_HOME/data/ or ~/.local/share/flowcast/
pub fn data_dir() -> PathBuf {
    if let Some(home) = flowcast_home() {
        return home.join("data");
    }
    match project_dirs() {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Database path
pub fn db_path() -> PathBuf {
    data_dir().join("flowcast.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure the data directory exists before opening the database.
pub fn ensure_data_dir() -> std::io::Result<()> {
    std::fs::create_dir_all(data_dir())
}
