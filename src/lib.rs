// Library interface for invalidate-cdn
// This allows integration tests and external code to use the modules

pub mod actions;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod exec;
pub mod inputs;
pub mod logging;
pub mod merger;
pub mod runner;
pub mod sdk;

// Re-export commonly used types
pub use error::{InvalidateError, ACTION_NAME};
pub use inputs::{Component, InvocationInputs};
pub use merger::MergedConfig;
pub use runner::{invalidate, InvalidationRunner};
