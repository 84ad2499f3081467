//! Project directory layout

use std::path::PathBuf;

/// Environment variable overriding the project root
pub const PROJECT_ROOT_ENV: &str = "XRAY_PROJECT_ROOT";

/// Archive directory, relative to the project root
pub const XRAY_DATA_DIR: &str = "data/xrays";

/// Root of the project: `XRAY_PROJECT_ROOT` if set, else the working directory.
pub fn project_root() -> PathBuf {
    std::env::var_os(PROJECT_ROOT_ENV)
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory the X-ray archives are downloaded into
pub fn data_dir() -> PathBuf {
    project_root().join(XRAY_DATA_DIR)
}
