//! Source aggregator for fetching raw proxy lists
//!
//! This module provides functionality for:
//! - Downloading the configured proxy-list sources of one protocol
//! - Splitting each body into raw candidates, one per line
//! - Containing per-source failures so one bad source never stops the others

use crate::error::CheckError;
use crate::logging::Logger;
use crate::proxy::models::{Candidate, ProtocolKind};
use crate::proxy::transport::{HttpFetcher, SourceFetcher};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Default pause after each source request in seconds
const DEFAULT_COURTESY_DELAY_SECS: u64 = 1;

/// Source URLs keyed by protocol
pub type SourceMap = BTreeMap<ProtocolKind, Vec<String>>;

/// Result of downloading a single source
#[derive(Debug, Clone)]
pub struct SourceReport {
    /// The source URL
    pub source: String,
    /// Raw candidates read from the source
    pub candidates: Vec<Candidate>,
    /// Error message if the download failed
    pub error: Option<String>,
}

impl SourceReport {
    pub fn success(source: String, candidates: Vec<Candidate>) -> Self {
        Self {
            source,
            candidates,
            error: None,
        }
    }

    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            candidates: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Gathers raw candidates from the sources configured for a protocol
pub struct SourceAggregator {
    fetcher: Arc<dyn SourceFetcher>,
    sources: SourceMap,
    courtesy_delay: Duration,
    logger: Logger,
}

impl SourceAggregator {
    /// Aggregator over real HTTP downloads
    pub fn new(sources: SourceMap, logger: Logger) -> crate::Result<Self> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::new()?), sources, logger))
    }

    pub fn with_fetcher(fetcher: Arc<dyn SourceFetcher>, sources: SourceMap, logger: Logger) -> Self {
        Self {
            fetcher,
            sources,
            courtesy_delay: Duration::from_secs(DEFAULT_COURTESY_DELAY_SECS),
            logger,
        }
    }

    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.courtesy_delay = delay;
        self
    }

    /// Source URLs configured for `protocol`
    pub fn sources_for(&self, protocol: ProtocolKind) -> &[String] {
        self.sources
            .get(&protocol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All raw candidates for `protocol`, in source order.
    ///
    /// Failing sources contribute nothing. A protocol without sources yields
    /// an empty list.
    pub async fn gather(&self, protocol: ProtocolKind) -> Vec<Candidate> {
        self.gather_with_reports(protocol)
            .await
            .into_iter()
            .flat_map(|report| report.candidates)
            .collect()
    }

    /// Download every source for `protocol` sequentially, one report each
    pub async fn gather_with_reports(&self, protocol: ProtocolKind) -> Vec<SourceReport> {
        let mut reports = Vec::new();

        for url in self.sources_for(protocol) {
            let report = match self.download(url).await {
                Ok(candidates) => SourceReport::success(url.clone(), candidates),
                Err(e) => {
                    self.logger.warn(&e);
                    SourceReport::failure(url.clone(), e.to_string())
                }
            };
            reports.push(report);

            if !self.courtesy_delay.is_zero() {
                tokio::time::sleep(self.courtesy_delay).await;
            }
        }

        reports
    }

    async fn download(&self, url: &str) -> Result<Vec<Candidate>, CheckError> {
        let body = self
            .fetcher
            .fetch_text(url)
            .await
            .map_err(|e| CheckError::SourceUnavailable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(split_candidates(&body))
    }
}

/// One raw candidate per line, kept verbatim
pub fn split_candidates(body: &str) -> Vec<Candidate> {
    body.lines().map(Candidate::from).collect()
}
