//! Proxy validator: probes one candidate against one target

use crate::logging::Logger;
use crate::proxy::models::{Candidate, ProbeOutcome, ProtocolKind, TargetEndpoint};
use crate::proxy::transport::{HttpProbeTransport, ProbeTransport, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default number of attempts per probe. One attempt means no retries.
const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Default delay before the first retry in seconds
const DEFAULT_BACKOFF_SECS: u64 = 1;

/// Default timeout for each request in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Retry and timeout policy for a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Sleep before the second attempt; doubled after each retry
    pub initial_backoff: Duration,
    /// Bound on each request
    pub request_timeout: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs(DEFAULT_BACKOFF_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ProbePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Probes candidates through a [`ProbeTransport`]
pub struct ProxyValidator {
    transport: Arc<dyn ProbeTransport>,
    policy: ProbePolicy,
    logger: Logger,
}

impl ProxyValidator {
    /// Validator over real HTTP with the default policy
    pub fn new(logger: Logger) -> Self {
        Self::with_transport(Arc::new(HttpProbeTransport::new()), ProbePolicy::default(), logger)
    }

    pub fn with_transport(
        transport: Arc<dyn ProbeTransport>,
        policy: ProbePolicy,
        logger: Logger,
    ) -> Self {
        Self {
            transport,
            policy,
            logger,
        }
    }

    pub fn with_policy(mut self, policy: ProbePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }

    /// Probe `candidate` against `target` with this validator's policy
    pub async fn probe(
        &self,
        candidate: &Candidate,
        target: &TargetEndpoint,
        protocol: ProtocolKind,
    ) -> ProbeOutcome {
        self.probe_with_policy(candidate, target, protocol, &self.policy)
            .await
    }

    /// Probe with an explicit policy. Never fails: every exit is an outcome.
    pub async fn probe_with_policy(
        &self,
        candidate: &Candidate,
        target: &TargetEndpoint,
        protocol: ProtocolKind,
        policy: &ProbePolicy,
    ) -> ProbeOutcome {
        let url = match target.parse() {
            Ok(url) => url,
            Err(e) => {
                self.logger.error(&e);
                return ProbeOutcome::invalid_target();
            }
        };

        let max_attempts = policy.max_attempts.max(1);
        let mut backoff = policy.initial_backoff;
        let mut attempt = 1;

        loop {
            let start = Instant::now();
            let result = self
                .transport
                .get_status(&url, candidate, protocol, policy.request_timeout)
                .await;

            match result {
                Ok(code) => return ProbeOutcome::completed(code, start.elapsed()),
                Err(TransportError::Timeout) if attempt < max_attempts => {
                    self.logger.debug(format!(
                        "Timeout checking proxy {} against {} (attempt {}/{}), retrying in {:?}",
                        candidate, target, attempt, max_attempts, backoff
                    ));
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(TransportError::Timeout) => {
                    self.logger
                        .error(format!("Timeout occurred while checking proxy {}", candidate));
                    return ProbeOutcome::timeout();
                }
                Err(TransportError::Other(reason)) => {
                    self.logger.error(format!(
                        "Error occurred while checking proxy {}: {}",
                        candidate, reason
                    ));
                    return ProbeOutcome::network(reason);
                }
            }
        }
    }
}

impl Clone for ProxyValidator {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            logger: self.logger.clone(),
        }
    }
}
