use std::fmt;

use crate::inputs::{Component, InvocationInputs};

/// Subcommand path for Cloud CDN invalidation
const INVALIDATE_CDN_CACHE: [&str; 3] = ["compute", "url-maps", "invalidate-cdn-cache"];

/// Ordered argument tokens passed to gcloud
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs(Vec<String>);

impl CommandArgs {
    /// `compute url-maps invalidate-cdn-cache <lb> --path <path> [--host <host>]`
    pub fn invalidate_cdn_cache(inputs: &InvocationInputs) -> Self {
        let mut args: Vec<String> = INVALIDATE_CDN_CACHE.iter().map(|s| s.to_string()).collect();
        args.push(inputs.load_balancer_name.clone());
        args.push("--path".to_string());
        args.push(inputs.path.clone());

        if let Some(host) = &inputs.host {
            args.push("--host".to_string());
            args.push(host.clone());
        }

        Self(args)
    }

    /// Components are exposed as a leading subcommand (`alpha compute ...`)
    pub fn prepend_component(&mut self, component: Component) {
        self.0.insert(0, component.as_str().to_string());
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CommandArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}
