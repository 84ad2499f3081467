//! Utility functions and types

pub mod data_loader;
pub mod paths;

pub use data_loader::{DataLoader, DataSaver};
pub use paths::{data_dir, project_root};
