//! Invalidation runner
//!
//! Drives one run end to end: resolve the gcloud version, make sure it is
//! installed (plus the optional component), hand over credentials and issue
//! the invalidation. Every step finishes before the next starts and any
//! failure ends the run.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::actions;
use crate::command::CommandArgs;
use crate::error::{InvalidateError, Result};
use crate::exec::{CommandExecutor, ExecOptions, ProcessExecutor};
use crate::inputs::InvocationInputs;
use crate::merger::MergedConfig;
use crate::sdk::{CloudSdk, GcloudSdk, ReleaseChannel, ToolCache, TOOL_COMMAND};

/// Validate inputs and run one invalidation with the real collaborators
pub async fn invalidate(config: &MergedConfig) -> Result<()> {
    let inputs = InvocationInputs::from_raw(config.inputs.clone())?;
    InvalidationRunner::from_config(config).run(&inputs).await
}

pub struct InvalidationRunner {
    sdk: Arc<dyn CloudSdk>,
    executor: Arc<dyn CommandExecutor>,
    options: ExecOptions,
    credentials: Option<PathBuf>,
}

impl InvalidationRunner {
    pub fn new(
        sdk: Arc<dyn CloudSdk>,
        executor: Arc<dyn CommandExecutor>,
        options: ExecOptions,
        credentials: Option<PathBuf>,
    ) -> Self {
        Self {
            sdk,
            executor,
            options,
            credentials,
        }
    }

    pub fn from_config(config: &MergedConfig) -> Self {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessExecutor);
        let sdk = GcloudSdk::new(
            ToolCache::new(&config.tool_cache_dir),
            ReleaseChannel::new(&config.release_channel_url),
            executor.clone(),
            config.exec_options(),
            config.github_path.clone(),
        );

        Self::new(
            Arc::new(sdk),
            executor,
            config.exec_options(),
            config.credentials_path.clone(),
        )
    }

    pub async fn run(&self, inputs: &InvocationInputs) -> Result<()> {
        let version = self.resolve_version(inputs).await?;
        let mut args = CommandArgs::invalidate_cdn_cache(inputs);

        if self.sdk.is_installed(&version) {
            self.sdk
                .activate(&version)
                .map_err(InvalidateError::Provisioning)?;
        } else {
            self.sdk
                .install(&version)
                .await
                .map_err(InvalidateError::Provisioning)?;
        }

        if let Some(component) = inputs.gcloud_component {
            self.sdk
                .install_component(&version, component)
                .await
                .map_err(InvalidateError::Provisioning)?;
            info!(operation = "install_component", component = %component, "component ready");
            args.prepend_component(component);
        }

        match &self.credentials {
            Some(path) => {
                self.sdk
                    .authenticate(&version, path)
                    .await
                    .map_err(InvalidateError::Authentication)?;
                info!(operation = "authenticate", status = "success", "authenticated gcloud");
            }
            None => {
                let msg = "No authentication found for gcloud, authenticate with `google-github-actions/auth`.";
                warn!(operation = "authenticate", status = "skipped", "{}", msg);
                actions::warning(msg);
            }
        }

        self.execute(&version, &args).await
    }

    async fn resolve_version(&self, inputs: &InvocationInputs) -> Result<String> {
        match inputs.pinned_version() {
            Some(v) => Ok(v.to_string()),
            None => {
                let v = self
                    .sdk
                    .latest_version()
                    .await
                    .map_err(InvalidateError::Provisioning)?;
                info!(operation = "resolve_version", version = %v, "resolved latest gcloud");
                Ok(v)
            }
        }
    }

    async fn execute(&self, version: &str, args: &CommandArgs) -> Result<()> {
        let command = format!("{} {}", TOOL_COMMAND, args);
        debug!("running: {}", command);
        actions::debug(&format!("Running: {}", command));

        let result = self
            .executor
            .exec(&self.sdk.tool_command(version), args.as_slice(), self.options)
            .await
            .map_err(|e| InvalidateError::Execution {
                command: command.clone(),
                detail: format!("{:#}", e),
            })?;

        if result.success() {
            return Ok(());
        }

        let stderr = result.stderr.trim();
        let detail = if stderr.is_empty() {
            format!(
                "command exited {}, but stderr had no output",
                result.exit_code
            )
        } else {
            stderr.to_string()
        };
        Err(InvalidateError::Execution { command, detail })
    }
}
