//! Proxy Vet - Proxy list gatherer and validator
//!
//! Downloads candidate proxies from per-protocol sources, probes each one
//! through every target URL concurrently, and keeps the proxies that pass
//! all of them.

pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod run;

pub use config::Config;
pub use error::CheckError;
pub use logging::Logger;
pub use proxy::*;
pub use run::{Gathered, Pipeline, RunReport};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
