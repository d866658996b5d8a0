/// Configuration merger: CLI args > Env vars > Config file > Defaults
///
/// Inputs come from CLI flags or the runner's `INPUT_*` variables (clap handles
/// both). Runner-provided environment (debug flags, credentials, tool cache)
/// is read through an injectable lookup so it can be tested without touching
/// the process environment.
use std::path::PathBuf;

use crate::actions;
use crate::cli::Cli;
use crate::config::InvalidateConfig;
use crate::exec::ExecOptions;
use crate::inputs::RawInputs;
use crate::sdk::default_tool_cache_dir;

pub const ACTIONS_RUNNER_DEBUG: &str = "ACTIONS_RUNNER_DEBUG";
pub const ACTIONS_STEP_DEBUG: &str = "ACTIONS_STEP_DEBUG";
pub const GOOGLE_GHA_CREDS_PATH: &str = "GOOGLE_GHA_CREDS_PATH";
pub const RUNNER_TOOL_CACHE: &str = "RUNNER_TOOL_CACHE";
pub const GITHUB_PATH: &str = "GITHUB_PATH";

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub inputs: RawInputs,
    pub release_channel_url: String,
    pub tool_cache_dir: PathBuf,
    pub github_path: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
    pub debug: bool,
    pub log_level: String,
    pub log_format: Option<String>,
}

impl MergedConfig {
    pub fn merge<F>(cli: &Cli, file_config: Option<InvalidateConfig>, env_lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file_config.unwrap_or_default();
        let env = |name: &str| env_lookup(name).filter(|v| !v.trim().is_empty());

        let debug = [ACTIONS_RUNNER_DEBUG, ACTIONS_STEP_DEBUG]
            .iter()
            .any(|name| env(*name).is_some_and(|v| actions::is_truthy(&v)));

        let gcloud_version = cli
            .gcloud_version
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or(file.sdk.default_version.clone());

        Self {
            inputs: RawInputs {
                load_balancer_name: cli.load_balancer_name.clone(),
                path: cli.path.clone(),
                host: cli.host.clone(),
                gcloud_version,
                gcloud_component: cli.gcloud_component.clone(),
            },
            release_channel_url: file.sdk.release_channel_url.clone(),
            tool_cache_dir: env(RUNNER_TOOL_CACHE)
                .or(file.sdk.tool_cache_dir.clone())
                .map(PathBuf::from)
                .unwrap_or_else(default_tool_cache_dir),
            github_path: env(GITHUB_PATH).map(PathBuf::from),
            credentials_path: env(GOOGLE_GHA_CREDS_PATH).map(PathBuf::from),
            debug,
            log_level: if debug {
                "debug".to_string()
            } else {
                file.observability.log_level.clone()
            },
            log_format: file.observability.log_format.clone(),
        }
    }

    /// Output of gcloud is only streamed to the step log in debug mode
    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions { silent: !self.debug }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let merged = MergedConfig::merge(&Cli::default(), None, lookup(&[]));

        assert!(!merged.debug);
        assert!(merged.exec_options().silent);
        assert_eq!(merged.credentials_path, None);
        assert_eq!(merged.github_path, None);
        assert_eq!(merged.tool_cache_dir, default_tool_cache_dir());
        assert_eq!(merged.log_level, "info");
        assert_eq!(merged.inputs.gcloud_version, None);
    }

    #[test]
    fn test_runner_environment() {
        let merged = MergedConfig::merge(
            &Cli::default(),
            None,
            lookup(&[
                (RUNNER_TOOL_CACHE, "/opt/hostedtoolcache"),
                (GOOGLE_GHA_CREDS_PATH, "/home/runner/work/gha-creds-1.json"),
                (GITHUB_PATH, "/home/runner/_temp/path"),
            ]),
        );

        assert_eq!(merged.tool_cache_dir, PathBuf::from("/opt/hostedtoolcache"));
        assert_eq!(
            merged.credentials_path,
            Some(PathBuf::from("/home/runner/work/gha-creds-1.json"))
        );
        assert_eq!(merged.github_path, Some(PathBuf::from("/home/runner/_temp/path")));
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let merged = MergedConfig::merge(
            &Cli::default(),
            None,
            lookup(&[(GOOGLE_GHA_CREDS_PATH, "  ")]),
        );
        assert_eq!(merged.credentials_path, None);
    }

    #[test]
    fn test_debug_flags() {
        for var in [ACTIONS_RUNNER_DEBUG, ACTIONS_STEP_DEBUG] {
            let merged = MergedConfig::merge(&Cli::default(), None, lookup(&[(var, "true")]));
            assert!(merged.debug);
            assert!(!merged.exec_options().silent);
            assert_eq!(merged.log_level, "debug");
        }

        let merged = MergedConfig::merge(
            &Cli::default(),
            None,
            lookup(&[(ACTIONS_STEP_DEBUG, "false")]),
        );
        assert!(!merged.debug);
    }

    #[test]
    fn test_file_config_precedence() {
        let mut file = InvalidateConfig::default();
        file.sdk.tool_cache_dir = Some("/from/file".to_string());
        file.sdk.default_version = Some("440.0.0".to_string());

        let merged = MergedConfig::merge(&Cli::default(), Some(file.clone()), lookup(&[]));
        assert_eq!(merged.tool_cache_dir, PathBuf::from("/from/file"));
        assert_eq!(merged.inputs.gcloud_version.as_deref(), Some("440.0.0"));

        let cli = Cli {
            gcloud_version: Some("450.0.0".to_string()),
            ..Default::default()
        };
        let merged = MergedConfig::merge(
            &cli,
            Some(file),
            lookup(&[(RUNNER_TOOL_CACHE, "/from/env")]),
        );
        assert_eq!(merged.tool_cache_dir, PathBuf::from("/from/env"));
        assert_eq!(merged.inputs.gcloud_version.as_deref(), Some("450.0.0"));
    }
}
