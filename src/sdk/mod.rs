pub mod release;
pub mod tool_cache;

pub use release::{Platform, ReleaseChannel, DEFAULT_RELEASE_CHANNEL_URL};
pub use tool_cache::{default_tool_cache_dir, ToolCache, SDK_ROOT};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::actions;
use crate::exec::{CommandExecutor, ExecOptions, ExecutionResult};
use crate::inputs::Component;

/// Executable name inside the SDK's `bin` directory
#[cfg(not(windows))]
pub const TOOL_COMMAND: &str = "gcloud";
#[cfg(windows)]
pub const TOOL_COMMAND: &str = "gcloud.cmd";

/// Provisioning and credential handoff for the gcloud SDK
#[async_trait]
pub trait CloudSdk: Send + Sync {
    /// Current version on the release channel
    async fn latest_version(&self) -> Result<String>;

    /// Whether `version` is already in the tool cache
    fn is_installed(&self, version: &str) -> bool;

    /// Download and cache `version`, put it on PATH and return its `bin` dir
    async fn install(&self, version: &str) -> Result<PathBuf>;

    /// Put an already cached `version` on PATH and return its `bin` dir
    fn activate(&self, version: &str) -> Result<PathBuf>;

    async fn install_component(&self, version: &str, component: Component) -> Result<()>;

    /// `gcloud auth login --cred-file` with the upstream credential file
    async fn authenticate(&self, version: &str, credentials: &Path) -> Result<()>;

    /// Full path of the gcloud executable for `version`
    fn tool_command(&self, version: &str) -> PathBuf;
}

/// [`CloudSdk`] backed by the real release channel and tool cache
pub struct GcloudSdk {
    tool_cache: ToolCache,
    channel: ReleaseChannel,
    executor: Arc<dyn CommandExecutor>,
    options: ExecOptions,
    github_path: Option<PathBuf>,
}

impl GcloudSdk {
    pub fn new(
        tool_cache: ToolCache,
        channel: ReleaseChannel,
        executor: Arc<dyn CommandExecutor>,
        options: ExecOptions,
        github_path: Option<PathBuf>,
    ) -> Self {
        Self {
            tool_cache,
            channel,
            executor,
            options,
            github_path,
        }
    }

    /// Unpack a downloaded release archive into the cache entry for `version`
    ///
    /// The archive's `google-cloud-sdk` directory becomes the `<arch>` entry
    /// itself. Any unmarked leftover at that location is replaced, and the
    /// marker is only written once the tree is in place.
    pub async fn install_from_archive(&self, version: &str, archive: &Path) -> Result<PathBuf> {
        let staging = self.tool_cache.staging_dir()?;
        release::extract_tar_gz_blocking(archive.to_path_buf(), staging.path().to_path_buf())
            .await?;

        let extracted = staging.path().join(SDK_ROOT);
        if !extracted.is_dir() {
            bail!("Archive {} has no {} directory", archive.display(), SDK_ROOT);
        }

        let dest = self.tool_cache.version_dir(version);
        if dest.exists() {
            // Leftover from an interrupted install; it never got its marker.
            std::fs::remove_dir_all(&dest)
                .with_context(|| format!("Failed to clear {}", dest.display()))?;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::rename(&extracted, &dest).with_context(|| {
            format!("Failed to move {} to {}", extracted.display(), dest.display())
        })?;
        self.tool_cache.mark_complete(version)?;

        info!(operation = "install", status = "success", version, "cached at {}", dest.display());
        self.put_on_path(version)
    }

    fn put_on_path(&self, version: &str) -> Result<PathBuf> {
        let bin = self.tool_cache.bin_dir(version);
        actions::add_path(&bin, self.github_path.as_deref())?;
        Ok(bin)
    }

    async fn gcloud(&self, version: &str, args: &[String]) -> Result<ExecutionResult> {
        self.executor
            .exec(&self.tool_command(version), args, self.options)
            .await
    }
}

/// Turn a failed helper invocation into an error carrying its stderr
fn check(what: &str, result: ExecutionResult) -> Result<()> {
    if result.success() {
        return Ok(());
    }
    let stderr = result.stderr.trim();
    if stderr.is_empty() {
        bail!("{} exited {}", what, result.exit_code);
    }
    bail!("{} exited {}: {}", what, result.exit_code, stderr)
}

#[async_trait]
impl CloudSdk for GcloudSdk {
    async fn latest_version(&self) -> Result<String> {
        self.channel.latest_version().await
    }

    fn is_installed(&self, version: &str) -> bool {
        self.tool_cache.is_installed(version)
    }

    async fn install(&self, version: &str) -> Result<PathBuf> {
        let platform = Platform::current()?;
        let url = self.channel.archive_url(version, platform);
        info!(operation = "install", version, "installing gcloud from {}", url);

        let staging = self.tool_cache.staging_dir()?;
        let archive = staging.path().join("google-cloud-sdk.tar.gz");
        self.channel.download(&url, &archive).await?;

        self.install_from_archive(version, &archive).await
    }

    fn activate(&self, version: &str) -> Result<PathBuf> {
        let bin = self.put_on_path(version)?;
        info!(operation = "activate", version, "using cached gcloud at {}", bin.display());
        Ok(bin)
    }

    async fn install_component(&self, version: &str, component: Component) -> Result<()> {
        let args = vec![
            "components".to_string(),
            "install".to_string(),
            component.to_string(),
            "--quiet".to_string(),
        ];
        let result = self.gcloud(version, &args).await?;
        check(&format!("gcloud components install {}", component), result)
    }

    async fn authenticate(&self, version: &str, credentials: &Path) -> Result<()> {
        let args = vec![
            "--quiet".to_string(),
            "auth".to_string(),
            "login".to_string(),
            "--cred-file".to_string(),
            credentials.display().to_string(),
        ];
        let result = self.gcloud(version, &args).await?;
        check("gcloud auth login", result)
    }

    fn tool_command(&self, version: &str) -> PathBuf {
        self.tool_cache.bin_dir(version).join(TOOL_COMMAND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serial_test::serial;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records invocations and answers with a fixed result
    struct RecordingExecutor {
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
        result: ExecutionResult,
    }

    impl RecordingExecutor {
        fn new(result: ExecutionResult) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                result,
            })
        }
    }

    #[async_trait]
    impl CommandExecutor for RecordingExecutor {
        async fn exec(
            &self,
            program: &Path,
            args: &[String],
            _options: ExecOptions,
        ) -> Result<ExecutionResult> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_path_buf(), args.to_vec()));
            Ok(self.result.clone())
        }
    }

    fn sdk(temp: &TempDir, executor: Arc<RecordingExecutor>) -> GcloudSdk {
        GcloudSdk::new(
            ToolCache::new(temp.path()),
            ReleaseChannel::new(DEFAULT_RELEASE_CHANNEL_URL),
            executor,
            ExecOptions { silent: true },
            None,
        )
    }

    /// Write a `.tar.gz` holding `entries` as `(path, contents)`
    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[tokio::test]
    async fn test_install_component_command() {
        let temp = TempDir::new().unwrap();
        let executor = RecordingExecutor::new(ExecutionResult::default());
        let sdk = sdk(&temp, executor.clone());

        sdk.install_component("450.0.0", Component::Alpha)
            .await
            .unwrap();

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, sdk.tool_command("450.0.0"));
        assert_eq!(calls[0].1, vec!["components", "install", "alpha", "--quiet"]);
    }

    #[tokio::test]
    async fn test_authenticate_command() {
        let temp = TempDir::new().unwrap();
        let executor = RecordingExecutor::new(ExecutionResult::default());
        let sdk = sdk(&temp, executor.clone());

        sdk.authenticate("450.0.0", Path::new("/tmp/creds.json"))
            .await
            .unwrap();

        let calls = executor.calls.lock().unwrap();
        assert_eq!(
            calls[0].1,
            vec!["--quiet", "auth", "login", "--cred-file", "/tmp/creds.json"]
        );
    }

    #[tokio::test]
    async fn test_authenticate_failure_carries_stderr() {
        let temp = TempDir::new().unwrap();
        let executor = RecordingExecutor::new(ExecutionResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: "invalid credential file\n".to_string(),
        });
        let sdk = sdk(&temp, executor);

        let err = sdk
            .authenticate("450.0.0", Path::new("/tmp/creds.json"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "gcloud auth login exited 1: invalid credential file"
        );
    }

    #[test]
    fn test_tool_command_inside_cache() {
        let temp = TempDir::new().unwrap();
        let sdk = sdk(&temp, RecordingExecutor::new(ExecutionResult::default()));

        let cmd = sdk.tool_command("450.0.0");
        assert!(cmd.starts_with(temp.path()));
        assert_eq!(
            cmd,
            ToolCache::new(temp.path())
                .version_dir("450.0.0")
                .join("bin")
                .join(TOOL_COMMAND)
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_install_from_archive_populates_cache() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("sdk.tar.gz");
        let gcloud = format!("{}/bin/{}", SDK_ROOT, TOOL_COMMAND);
        write_archive(&archive, &[(gcloud.as_str(), &b"#!/bin/sh\necho gcloud\n"[..])]);

        let cache_root = temp.path().join("toolcache");
        let sdk = GcloudSdk::new(
            ToolCache::new(&cache_root),
            ReleaseChannel::new(DEFAULT_RELEASE_CHANNEL_URL),
            RecordingExecutor::new(ExecutionResult::default()),
            ExecOptions { silent: true },
            None,
        );

        // An interrupted earlier install left an unmarked entry behind
        let dest = ToolCache::new(&cache_root).version_dir("450.0.0");
        std::fs::create_dir_all(dest.join("lib")).unwrap();
        std::fs::write(dest.join("lib").join("partial"), b"").unwrap();
        assert!(!sdk.is_installed("450.0.0"));

        let original_path = std::env::var_os("PATH");
        let bin = sdk.install_from_archive("450.0.0", &archive).await.unwrap();
        let path_after = std::env::var_os("PATH");
        match original_path {
            Some(p) => std::env::set_var("PATH", p),
            None => std::env::remove_var("PATH"),
        }

        assert!(sdk.is_installed("450.0.0"));
        assert_eq!(bin, dest.join("bin"));
        assert!(sdk.tool_command("450.0.0").is_file());
        assert!(!dest.join(SDK_ROOT).exists());
        assert!(!dest.join("lib").join("partial").exists());

        let path_after = path_after.unwrap();
        assert_eq!(std::env::split_paths(&path_after).next(), Some(bin));

        let leftovers = std::fs::read_dir(cache_root.join(tool_cache::TOOL_NAME))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".staging-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_install_from_archive_without_sdk_root() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("other.tar.gz");
        write_archive(&archive, &[("README", &b""[..])]);
        let sdk = sdk(&temp, RecordingExecutor::new(ExecutionResult::default()));

        let err = sdk
            .install_from_archive("450.0.0", &archive)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("has no google-cloud-sdk directory"));
        assert!(!sdk.is_installed("450.0.0"));
    }
}
