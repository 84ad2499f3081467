//! Chest X-ray diagnosis tooling
//!
//! This crate provides the data side of a chest X-ray classification workflow:
//! - Multi-label SMOTE for imbalanced indicator label matrices
//! - Bulk download of the NIH chest X-ray image archives
//! - A minimal demo HTTP service and a CLI
//!
//! # Modules
//!
//! - [`synthetic`] - Multi-label oversampling over array or table datasets
//! - [`download`] - Sequential archive download
//! - [`server`] - Demo HTTP endpoints
//! - [`cli`] - Command-line interface
//! - [`utils`] - CSV IO and project paths

// Core error handling
pub mod error;

// Data processing
pub mod synthetic;

// Services
pub mod download;
pub mod server;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{Result, XrayError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, XrayError};

    pub use crate::synthetic::{
        class_sums, num_classes, BalanceReport, BalanceResult, ClassBins, ContainerFamily, Dataset,
        MultiSmote, MultiSmoteConfig, RoundStatus, SkipReason,
    };

    pub use crate::download::{BulkDownloader, DownloadConfig};
    pub use crate::server::{create_router, ServerConfig};
}
