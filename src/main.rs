//! Chest X-ray tooling - main entry point

use clap::Parser;
use chest_xray_diagnosis::cli::{cmd_balance, cmd_download, cmd_info, cmd_serve, resolve_config, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chest_xray_diagnosis=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Balance { features, labels, out_features, out_labels, neighbors, seed, config } => {
            let config = resolve_config(config.as_deref(), neighbors, seed)?;
            cmd_balance(&features, &labels, &out_features, &out_labels, config)?;
        }
        Commands::Info { labels } => {
            cmd_info(&labels)?;
        }
        Commands::Download { dir } => {
            cmd_download(dir.as_deref()).await?;
        }
        Commands::Serve { host, port } => {
            cmd_serve(host, port).await?;
        }
    }

    Ok(())
}
