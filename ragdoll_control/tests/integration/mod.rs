//! Integration test modules.

mod config_loading;
mod load_aggregation;
mod mode_toggle;
mod pose_hold;

use std::path::PathBuf;

/// The humanoid figure shipped in the workspace `config/` directory.
pub fn humanoid_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../config/humanoid.toml")
}
