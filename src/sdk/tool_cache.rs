use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Tool name used as the first path segment inside the cache
pub const TOOL_NAME: &str = "gcloud";

/// Top-level directory inside the release archive
pub const SDK_ROOT: &str = "google-cloud-sdk";

/// Get default tool cache directory when the runner does not provide one
///
/// - Linux/Unix: $XDG_CACHE_HOME/invalidate-cdn/tool-cache or ~/.cache/invalidate-cdn/tool-cache
/// - macOS: ~/Library/Caches/invalidate-cdn/tool-cache
pub fn default_tool_cache_dir() -> PathBuf {
    if let Some(cache_dir) = dirs::cache_dir() {
        cache_dir.join("invalidate-cdn").join("tool-cache")
    } else {
        PathBuf::from(".invalidate-cdn/tool-cache")
    }
}

/// Architecture label used for cache entries (`x64`, `arm64`, ...)
pub fn cache_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        other => other,
    }
}

/// Versioned tool cache laid out as `<root>/gcloud/<version>/<arch>`
///
/// `<arch>` holds the contents of the archive's `google-cloud-sdk` directory,
/// the same layout setup-gcloud leaves behind, so `bin/gcloud` sits directly
/// under it. An entry only counts as installed once its `<arch>.complete`
/// marker exists, so a half-extracted archive is never picked up.
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
}

impl ToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(TOOL_NAME).join(version).join(cache_arch())
    }

    fn marker(&self, version: &str) -> PathBuf {
        self.root
            .join(TOOL_NAME)
            .join(version)
            .join(format!("{}.complete", cache_arch()))
    }

    pub fn is_installed(&self, version: &str) -> bool {
        self.version_dir(version).is_dir() && self.marker(version).is_file()
    }

    pub fn mark_complete(&self, version: &str) -> Result<()> {
        let marker = self.marker(version);
        fs::write(&marker, b"")
            .with_context(|| format!("Failed to write cache marker {}", marker.display()))
    }

    /// Location of the cached SDK's `bin` directory
    pub fn bin_dir(&self, version: &str) -> PathBuf {
        self.version_dir(version).join("bin")
    }

    /// Scratch directory on the same filesystem as the cache entries
    ///
    /// Extracted trees are renamed into place from here, so staging must not
    /// live on a different mount than `version_dir`.
    pub fn staging_dir(&self) -> Result<TempDir> {
        let parent = self.root.join(TOOL_NAME);
        fs::create_dir_all(&parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
        tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&parent)
            .with_context(|| format!("Failed to create staging directory in {}", parent.display()))
    }
}
