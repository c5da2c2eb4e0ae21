use std::path::{Path, PathBuf};

pub const INTERSECTION_DIR: &str = ".intersection";
pub const CONFIG_FILE: &str = ".intersection/config.yaml";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn intersection_dir(root: &Path) -> PathBuf {
    root.join(INTERSECTION_DIR)
}
