//! Cloud SDK release channel
//!
//! Resolves the current version from the channel manifest and downloads and
//! unpacks release archives.

use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;
use reqwest::Client;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Default rapid release channel
pub const DEFAULT_RELEASE_CHANNEL_URL: &str = "https://dl.google.com/dl/cloudsdk/channels/rapid";

/// Subset of `components-2.json` needed to resolve the channel version
#[derive(Debug, Deserialize)]
struct ComponentsManifest {
    version: String,
}

/// Host platform as named in release archive file names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    pub fn current() -> Result<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map Rust's `OS`/`ARCH` constants to archive names
    pub fn from_parts(os: &str, arch: &str) -> Result<Self> {
        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            other => bail!("unsupported platform: {}", other),
        };
        let arch = match arch {
            "x86_64" => "x86_64",
            "aarch64" => "arm",
            "x86" => "x86",
            other => bail!("unsupported architecture: {}", other),
        };
        Ok(Self { os, arch })
    }
}

#[derive(Debug, Clone)]
pub struct ReleaseChannel {
    client: Client,
    base_url: String,
}

impl ReleaseChannel {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/components-2.json", self.base_url)
    }

    pub fn archive_url(&self, version: &str, platform: Platform) -> String {
        format!(
            "{}/downloads/google-cloud-sdk-{}-{}-{}.tar.gz",
            self.base_url, version, platform.os, platform.arch
        )
    }

    /// Current version published on the channel
    pub async fn latest_version(&self) -> Result<String> {
        let url = self.manifest_url();
        debug!("GET {}", url);

        let manifest: ComponentsManifest = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to query {}", url))?
            .error_for_status()
            .with_context(|| format!("Release manifest request failed: {}", url))?
            .json()
            .await
            .context("Failed to parse release manifest")?;

        parse_version(manifest)
    }

    /// Stream a release archive to `dest`
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!("GET {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .with_context(|| format!("Download failed: {}", url))?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(operation = "download", size_bytes = written, "downloaded {}", url);
        Ok(written)
    }
}

fn parse_version(manifest: ComponentsManifest) -> Result<String> {
    let version = manifest.version.trim().to_string();
    if version.is_empty() {
        return Err(anyhow!("Release manifest did not contain a version"));
    }
    Ok(version)
}

/// Unpack a `.tar.gz` archive into `dest`
pub fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let file =
        File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    tar::Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .with_context(|| format!("Failed to extract {} into {}", archive.display(), dest.display()))
}

/// Extract on the blocking pool
pub async fn extract_tar_gz_blocking(archive: PathBuf, dest: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || extract_tar_gz(&archive, &dest))
        .await
        .context("Extraction task panicked")?
}
