//! Bulk download of the NIH ChestX-ray14 image archives
//!
//! Archives are fetched one after another into a single directory and named
//! `images_01.tar.gz`, `images_02.tar.gz`, ... by their position in the list.
//! There is no retry or resume: the first failed transfer aborts the batch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{Result, XrayError};
use crate::utils::paths;

/// The twelve `images_XX.tar.gz` archives of the NIH chest X-ray dataset
pub const NIH_ARCHIVE_URLS: [&str; 12] = [
    "https://nihcc.box.com/shared/static/vfk49d74nhbxq3nqjg0900w5nvkorp5c.gz",
    "https://nihcc.box.com/shared/static/i28rlmbvmfjbl8p2n3ril0pptcmcu9d1.gz",
    "https://nihcc.box.com/shared/static/f1t00wrtdk94satdfb9olcolqx20z2jp.gz",
    "https://nihcc.box.com/shared/static/0aowwzs5lhjrceb3qp67ahp0rd1l1etg.gz",
    "https://nihcc.box.com/shared/static/v5e3goj22zr6h8tzualxfsqlqaygfbsn.gz",
    "https://nihcc.box.com/shared/static/asi7ikud9jwnkrnkj99jnpfkjdes7l6l.gz",
    "https://nihcc.box.com/shared/static/jn1b4mw4n6lnh74ovmcjb8y48h8xj07n.gz",
    "https://nihcc.box.com/shared/static/tvpxmn7qyrgl0w8wfh9kqfjskv6nmm1j.gz",
    "https://nihcc.box.com/shared/static/upyy3ml7qdumlgk2rfcvlb9k6gvqq2pj.gz",
    "https://nihcc.box.com/shared/static/l6nilvfa9cg3s28tqv1qc1olm3gnz54p.gz",
    "https://nihcc.box.com/shared/static/hhq8fkdgvcari67vfhs7ppg2w6ni4jze.gz",
    "https://nihcc.box.com/shared/static/ioqwiy20ihqwyr8pf4c24eazhh281pbu.gz",
];

/// File name of the archive at zero-based position `index`
pub fn archive_file_name(index: usize) -> String {
    format!("images_{:02}.tar.gz", index + 1)
}

/// Downloader configuration
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub target_dir: PathBuf,
    pub urls: Vec<String>,
    /// Per-archive request timeout
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            target_dir: paths::data_dir(),
            urls: NIH_ARCHIVE_URLS.iter().map(|u| u.to_string()).collect(),
            timeout_secs: std::env::var("XRAY_DOWNLOAD_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
        }
    }
}

impl DownloadConfig {
    pub fn with_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = dir.into();
        self
    }

    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }
}

/// Sequential archive downloader
pub struct BulkDownloader {
    config: DownloadConfig,
    client: reqwest::Client,
}

impl BulkDownloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download every archive in order, returning the written paths.
    pub async fn download_all(&self) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.config.target_dir).await?;

        let total = self.config.urls.len();
        let mut written = Vec::with_capacity(total);
        for (idx, url) in self.config.urls.iter().enumerate() {
            let file_name = archive_file_name(idx);
            let path = self.config.target_dir.join(&file_name);
            info!("Downloading {}/{}, filename: {}", idx + 1, total, file_name);

            match self.download_one(url, &path).await {
                Ok(bytes) => {
                    info!(file = %file_name, bytes, "Archive saved");
                    written.push(path);
                }
                Err(e) => {
                    return Err(XrayError::DownloadError(format!("{} ({}): {}", file_name, url, e)));
                }
            }
        }

        info!("Download complete. Please check the checksums");
        Ok(written)
    }

    /// Fetch one archive into `path`.
    ///
    /// An existing file is only replaced once the server has answered with a
    /// success status. A transfer that fails midway removes what it wrote.
    async fn download_one(&self, url: &str, path: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let file = tokio::fs::File::create(path).await?;

        match Self::stream_to_file(response, file).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                if tokio::fs::remove_file(path).await.is_ok() {
                    warn!(path = %path.display(), "Removed partial archive");
                }
                Err(e)
            }
        }
    }

    async fn stream_to_file(mut response: reqwest::Response, mut file: tokio::fs::File) -> Result<u64> {
        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(bytes)
    }
}
