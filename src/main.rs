use clap::Parser;
use std::process::ExitCode;

use invalidate_cdn::actions;
use invalidate_cdn::cli::Cli;
use invalidate_cdn::config::InvalidateConfig;
use invalidate_cdn::error::InvalidateError;
use invalidate_cdn::logging;
use invalidate_cdn::merger::MergedConfig;

fn load_config(cli: &Cli) -> Result<Option<InvalidateConfig>, InvalidateError> {
    cli.config
        .as_deref()
        .map(InvalidateConfig::from_file)
        .transpose()
        .map_err(|e| InvalidateError::Configuration(format!("{:#}", e)))
}

fn fail(err: InvalidateError) -> ExitCode {
    tracing::error!(status = "error", "{}", err);
    actions::error(&err.report());
    ExitCode::FAILURE
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments (inputs fall back to the runner's INPUT_* variables)
    let cli = Cli::parse();

    let file_config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            logging::init("info", None);
            return fail(err);
        }
    };

    let config = MergedConfig::merge(&cli, file_config, |name| std::env::var(name).ok());

    // Initialize structured logging
    logging::init(&config.log_level, config.log_format.as_deref());

    match invalidate_cdn::invalidate(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}
