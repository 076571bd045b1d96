//! Proxy module for gathering and validating proxies
//!
//! This module provides functionality for:
//! - Downloading raw candidate lists from per-protocol sources
//! - Probing each candidate through one or more target URLs with retries
//! - Running probes concurrently under a worker budget
//! - Saving the good proxies and summarizing a run

pub mod aggregator;
pub mod filter;
pub mod models;
pub mod scheduler;
pub mod sink;
pub mod transport;
pub mod validator;

pub use aggregator::{SourceAggregator, SourceMap, SourceReport};
pub use filter::is_well_formed;
pub use models::{
    Candidate, CandidateVerdict, ProbeOutcome, ProbeStatus, ProtocolKind, RunResult, Summary,
    TargetEndpoint,
};
pub use scheduler::ValidationScheduler;
pub use sink::ResultSink;
pub use transport::{HttpFetcher, HttpProbeTransport, ProbeTransport, SourceFetcher, TransportError};
pub use validator::{ProbePolicy, ProxyValidator};
