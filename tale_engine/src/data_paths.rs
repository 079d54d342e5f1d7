use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable that overrides data directory detection.
pub const DATA_DIR_ENV: &str = "TALE_DATA_DIR";

/// Cached path to the directory containing the session's content files.
static DATA_ROOT: LazyLock<PathBuf> = LazyLock::new(|| detect_data_root(env::var_os(DATA_DIR_ENV).map(PathBuf::from)));

/// The resolved content directory.
pub fn data_root() -> &'static Path {
    &DATA_ROOT
}

/// Construct a data path relative to the resolved data root.
pub fn data_path(relative: impl AsRef<Path>) -> PathBuf {
    DATA_ROOT.join(relative)
}

/// Resolve the most likely location of the content directory.
fn detect_data_root(env_override: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_override {
        return dir;
    }

    // Common layouts: workspace root and flattened `data/`.
    let mut candidates = vec![PathBuf::from("tale_engine/data"), PathBuf::from("data")];

    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        candidates.push(dir.join("tale_engine/data"));
        candidates.push(dir.join("data"));

        if let Some(parent) = dir.parent() {
            candidates.push(parent.join("tale_engine/data"));
            candidates.push(parent.join("data"));
        }
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| PathBuf::from("tale_engine/data"))
}
