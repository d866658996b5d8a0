use clap::Parser;

/// invalidate-cdn - Invalidate a load balancer's Cloud CDN cache
///
/// Runs as a GitHub Actions step: inputs are read from the runner's
/// `INPUT_*` variables, or can be passed as flags when run by hand.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "invalidate-cdn")]
#[command(author = "Tuist Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Invalidate a load balancer's Cloud CDN cache through gcloud", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short = 'c', long, env = "INVALIDATE_CDN_CONFIG")]
    pub config: Option<String>,

    /// Name of the load balancer's URL map
    #[arg(long, env = "INPUT_LOAD_BALANCER_NAME")]
    pub load_balancer_name: Option<String>,

    /// Path pattern to invalidate (e.g. "/images/*")
    #[arg(long, env = "INPUT_PATH")]
    pub path: Option<String>,

    /// Only invalidate requests for this host
    #[arg(long, env = "INPUT_HOST")]
    pub host: Option<String>,

    /// gcloud version to use ("latest" or empty resolves the current release)
    #[arg(long, env = "INPUT_GCLOUD_VERSION")]
    pub gcloud_version: Option<String>,

    /// gcloud component to run the command with (alpha|beta)
    #[arg(long, env = "INPUT_GCLOUD_COMPONENT")]
    pub gcloud_component: Option<String>,
}
