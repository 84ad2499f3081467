//! Command-line interface for dataset balancing, archive download and the demo server.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::download::{BulkDownloader, DownloadConfig};
use crate::server::{run_server, ServerConfig};
use crate::synthetic::{class_sums, Dataset, MultiSmote, MultiSmoteConfig, RoundStatus, SkipReason};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 180, 80) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_skip(msg: &str) {
    println!("  {} {}", warn("!"), msg);
}

fn step_run(msg: &str) {
    println!("  {} {}...", accent("›"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "xray")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chest X-ray dataset tooling: multi-label SMOTE, archive download, demo API")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Oversample minority classes of a multi-label dataset
    Balance {
        /// Feature CSV file (one row per sample)
        #[arg(short, long)]
        features: PathBuf,

        /// Label CSV file (0/1 indicator per class)
        #[arg(short, long)]
        labels: PathBuf,

        /// Output feature CSV
        #[arg(long)]
        out_features: PathBuf,

        /// Output label CSV
        #[arg(long)]
        out_labels: PathBuf,

        /// Number of nearest neighbors, the sample itself included
        #[arg(short = 'k', long)]
        neighbors: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show class balance of a label file
    Info {
        /// Label CSV file
        #[arg(short, long)]
        labels: PathBuf,
    },

    /// Download the chest X-ray image archives
    Download {
        /// Target directory (defaults to <project root>/data/xrays)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Start the demo HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Resolve the balancing configuration: file first, then flags.
pub fn resolve_config(
    config: Option<&Path>,
    neighbors: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<MultiSmoteConfig> {
    let mut resolved = match config {
        Some(path) => MultiSmoteConfig::from_json_file(path)?,
        None => MultiSmoteConfig::default(),
    };
    if let Some(k) = neighbors {
        resolved = resolved.with_k_neighbors(k);
    }
    if let Some(seed) = seed {
        resolved = resolved.with_seed(seed);
    }
    resolved.validate()?;
    Ok(resolved)
}

pub fn cmd_balance(
    features: &Path,
    labels: &Path,
    out_features: &Path,
    out_labels: &Path,
    config: MultiSmoteConfig,
) -> anyhow::Result<()> {
    section("Multi-label SMOTE");
    let loader = DataLoader::new();
    let x = Dataset::from(loader.load_csv(features)?);
    let y = Dataset::from(loader.load_csv(labels)?);
    println!("  {}", kv("samples", &x.n_rows().to_string()));
    println!("  {}", kv("features", &x.n_cols().to_string()));
    println!("  {}", kv("classes", &y.n_cols().to_string()));

    let smote = MultiSmote::with_config(config);
    step_run(&smote.to_string());
    let start = Instant::now();
    let result = smote
        .multi_smote(&x, &y)?
        .ok_or_else(|| anyhow::anyhow!("feature file must contain only numeric columns"))?;

    for round in &result.report.rounds {
        match round.status {
            RoundStatus::Generated { n_synthetic, k } => step_ok(&format!(
                "class {}: {} synthetic rows (k={})",
                round.class_index, n_synthetic, k
            )),
            RoundStatus::Skipped(SkipReason::InsufficientSamples { found }) => step_skip(&format!(
                "class {}: skipped, {} pure sample(s)",
                round.class_index, found
            )),
            RoundStatus::Skipped(SkipReason::InsufficientNeighbors { k }) => step_skip(&format!(
                "class {}: skipped, k={} leaves no neighbor",
                round.class_index, k
            )),
        }
    }

    let (Dataset::Table(mut x_out), Dataset::Table(mut y_out)) = (result.x, result.y) else {
        anyhow::bail!("balanced output is not tabular");
    };
    DataSaver::save_csv(&mut x_out, out_features)?;
    DataSaver::save_csv(&mut y_out, out_labels)?;

    println!();
    println!("  {}", kv("rows", &format!("{} → {}", x.n_rows(), x_out.height())));
    println!("  {}", kv("time", &format!("{:.2?}", start.elapsed())));
    println!("  {}", kv("written", &format!("{}, {}", out_features.display(), out_labels.display())));
    Ok(())
}

pub fn cmd_info(labels: &Path) -> anyhow::Result<()> {
    let df = DataLoader::new().load_csv(labels)?;
    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    let bins = class_sums(&Dataset::from(df))?;

    section("Class balance");
    for (name, count) in names.iter().zip(bins.as_slice()) {
        println!("  {}", kv(&format!("{:<24}", name), &count.to_string()));
    }
    if let (Some(maj), Some(min)) = (bins.majority_index(), bins.minority_index()) {
        println!();
        println!("  {}", kv("majority", &format!("{} ({})", names[maj], bins.majority_count())));
        println!("  {}", kv("minority", &format!("{} ({})", names[min], bins.minority_count())));
    }
    Ok(())
}

pub async fn cmd_download(dir: Option<&Path>) -> anyhow::Result<()> {
    let mut config = DownloadConfig::default();
    if let Some(dir) = dir {
        config = config.with_target_dir(dir);
    }
    section("Downloading chest X-ray archives");
    println!("  {}", kv("target", &config.target_dir.display().to_string()));
    let written = BulkDownloader::new(config)?.download_all().await?;
    step_ok(&format!("{} archives downloaded, please check the checksums", written.len()));
    Ok(())
}

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    println!("  {} http://{}:{}", accent("serving"), config.host, config.port);
    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_balance() {
        let cli = Cli::parse_from([
            "xray", "balance", "-f", "x.csv", "-l", "y.csv",
            "--out-features", "xo.csv", "--out-labels", "yo.csv", "-k", "3",
        ]);
        match cli.command {
            Commands::Balance { neighbors, seed, .. } => {
                assert_eq!(neighbors, Some(3));
                assert_eq!(seed, None);
            }
            _ => panic!("expected balance command"),
        }
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"k_neighbors": 7, "seed": 1}"#).unwrap();

        let config = resolve_config(Some(&path), Some(3), None).unwrap();
        assert_eq!(config.k_neighbors, 3);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_resolve_config_rejects_zero_k() {
        assert!(resolve_config(None, Some(0), None).is_err());
    }
}
