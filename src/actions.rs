//! GitHub Actions runner integration
//!
//! Annotations are emitted as workflow commands on stdout
//! (`::warning::message`), separate from the tracing logs on stderr.
//! See <https://docs.github.com/actions/reference/workflow-commands-for-github-actions>.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Escape a workflow command message
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format a workflow command line, e.g. `::error::boom`
pub fn format_command(command: &str, message: &str) -> String {
    format!("::{}::{}", command, escape_data(message))
}

pub fn warning(message: &str) {
    println!("{}", format_command("warning", message));
}

pub fn error(message: &str) {
    println!("{}", format_command("error", message));
}

pub fn debug(message: &str) {
    println!("{}", format_command("debug", message));
}

/// Boolean parsing used for runner-provided flags such as `ACTIONS_STEP_DEBUG`
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "t" | "true" | "y" | "yes" | "on"
    )
}

/// Make `dir` visible on the executable search path
///
/// Prepends to this process's `PATH` and, when the runner provides a
/// `GITHUB_PATH` file, appends the directory there for later steps.
pub fn add_path(dir: &Path, github_path: Option<&Path>) -> Result<()> {
    if let Some(file) = github_path {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .with_context(|| format!("Failed to open GITHUB_PATH file {}", file.display()))?;
        writeln!(f, "{}", dir.display())
            .with_context(|| format!("Failed to write GITHUB_PATH file {}", file.display()))?;
    }

    let mut paths: Vec<PathBuf> = vec![dir.to_path_buf()];
    if let Some(current) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&current).filter(|p| p != dir));
    }
    let joined = std::env::join_paths(paths).context("Failed to build PATH")?;
    std::env::set_var("PATH", joined);

    Ok(())
}
