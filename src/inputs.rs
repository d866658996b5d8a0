//! Step inputs
//!
//! Inputs arrive as loose strings (runner `INPUT_*` variables or CLI flags) and
//! are validated once into [`InvocationInputs`], which stays immutable for the
//! rest of the run.

use std::fmt;
use std::str::FromStr;

use crate::error::{InvalidateError, Result};

pub const LOAD_BALANCER_NAME: &str = "load_balancer_name";
pub const PATH: &str = "path";
pub const GCLOUD_COMPONENT: &str = "gcloud_component";

/// Version keyword that asks the release channel for its current version
pub const LATEST: &str = "latest";

/// Optional gcloud release-channel component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Alpha,
    Beta,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = InvalidateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            other => Err(InvalidateError::Configuration(format!(
                "invalid input received for {}: {}",
                GCLOUD_COMPONENT, other
            ))),
        }
    }
}

/// Raw, unvalidated input values
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub load_balancer_name: Option<String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub gcloud_version: Option<String>,
    pub gcloud_component: Option<String>,
}

/// Validated inputs for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationInputs {
    pub load_balancer_name: String,
    pub path: String,
    pub host: Option<String>,
    pub gcloud_version: Option<String>,
    pub gcloud_component: Option<Component>,
}

impl InvocationInputs {
    /// Validate raw inputs
    ///
    /// Values are trimmed and blank values count as absent. Fails on a missing
    /// required input or an unknown component.
    pub fn from_raw(raw: RawInputs) -> Result<Self> {
        let load_balancer_name = required(LOAD_BALANCER_NAME, raw.load_balancer_name)?;
        let path = required(PATH, raw.path)?;

        let gcloud_component = optional(raw.gcloud_component)
            .map(|c| c.parse::<Component>())
            .transpose()?;

        Ok(Self {
            load_balancer_name,
            path,
            host: optional(raw.host),
            gcloud_version: optional(raw.gcloud_version),
            gcloud_component,
        })
    }

    /// Explicitly pinned version, or `None` when the latest should be resolved
    pub fn pinned_version(&self) -> Option<&str> {
        match self.gcloud_version.as_deref() {
            None | Some(LATEST) => None,
            Some(v) => Some(v),
        }
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(name: &str, value: Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| {
        InvalidateError::Configuration(format!("Input required and not supplied: {}", name))
    })
}
