//! Proxy data models

use crate::error::CheckError;
use crate::proxy::filter::is_well_formed;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Protocol a candidate proxy is expected to speak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ProtocolKind {
    #[default]
    Http,
    Socks4,
    Socks5,
}

impl ProtocolKind {
    /// URL scheme used when wiring a candidate into an outbound request
    pub fn scheme(&self) -> &'static str {
        match self {
            ProtocolKind::Http => "http",
            ProtocolKind::Socks4 => "socks4",
            ProtocolKind::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolKind::Http => write!(f, "HTTP"),
            ProtocolKind::Socks4 => write!(f, "SOCKS4"),
            ProtocolKind::Socks5 => write!(f, "SOCKS5"),
        }
    }
}

impl FromStr for ProtocolKind {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" | "https" => Ok(ProtocolKind::Http),
            "socks4" => Ok(ProtocolKind::Socks4),
            "socks5" => Ok(ProtocolKind::Socks5),
            _ => Err(CheckError::UnknownProtocol(s.to_string())),
        }
    }
}

/// Raw proxy token as it came out of a source list, usually `host:port`.
///
/// No formatting guarantee: it may be empty, malformed or duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Proxy URL for `protocol`, e.g. `socks5://1.2.3.4:1080`
    pub fn proxy_url(&self, protocol: ProtocolKind) -> String {
        format!("{}://{}", protocol.scheme(), self.0.trim())
    }

    pub fn is_well_formed(&self) -> bool {
        is_well_formed(&self.0)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Candidate {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// URL probed through a candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetEndpoint(String);

impl TargetEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the endpoint, requiring both a scheme and a host.
    pub fn parse(&self) -> Result<reqwest::Url, CheckError> {
        let url = reqwest::Url::parse(&self.0)
            .map_err(|_| CheckError::InvalidTarget(self.0.clone()))?;
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(url),
            _ => Err(CheckError::InvalidTarget(self.0.clone())),
        }
    }
}

impl fmt::Display for TargetEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetEndpoint {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Either the HTTP status of a completed request or the reason none completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    Code(u16),
    InvalidTarget,
    Timeout,
    Network(String),
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Code(code) => write!(f, "{}", code),
            ProbeStatus::InvalidTarget => write!(f, "InvalidTarget"),
            ProbeStatus::Timeout => write!(f, "Timeout"),
            ProbeStatus::Network(reason) => write!(f, "{}", reason),
        }
    }
}

/// Result of probing one candidate against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub success: bool,
    pub status: ProbeStatus,
    /// Present only when a request round-trip completed
    pub elapsed: Option<Duration>,
}

impl ProbeOutcome {
    pub fn completed(code: u16, elapsed: Duration) -> Self {
        Self {
            success: code == 200,
            status: ProbeStatus::Code(code),
            elapsed: Some(elapsed),
        }
    }

    pub fn invalid_target() -> Self {
        Self::failed(ProbeStatus::InvalidTarget)
    }

    pub fn timeout() -> Self {
        Self::failed(ProbeStatus::Timeout)
    }

    pub fn network(reason: String) -> Self {
        Self::failed(ProbeStatus::Network(reason))
    }

    fn failed(status: ProbeStatus) -> Self {
        Self {
            success: false,
            status,
            elapsed: None,
        }
    }

    /// The failure class of this outcome, if it failed
    pub fn error(&self, target: &TargetEndpoint) -> Option<CheckError> {
        if self.success {
            return None;
        }
        Some(match &self.status {
            ProbeStatus::Code(code) => CheckError::NonSuccessStatus(*code),
            ProbeStatus::InvalidTarget => CheckError::InvalidTarget(target.to_string()),
            ProbeStatus::Timeout => CheckError::Timeout,
            ProbeStatus::Network(reason) => CheckError::Network(reason.clone()),
        })
    }
}

/// All outcomes for one candidate, in target order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateVerdict {
    pub candidate: Candidate,
    pub outcomes: Vec<ProbeOutcome>,
    pub is_good: bool,
}

impl CandidateVerdict {
    pub fn new(candidate: Candidate, outcomes: Vec<ProbeOutcome>) -> Self {
        let is_good = outcomes.iter().all(|o| o.success);
        Self {
            candidate,
            outcomes,
            is_good,
        }
    }
}

/// Good/bad partition of a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub good: Vec<Candidate>,
    pub bad: Vec<Candidate>,
}

impl RunResult {
    pub fn from_verdicts(verdicts: &[CandidateVerdict]) -> Self {
        let (good, bad): (Vec<_>, Vec<_>) = verdicts.iter().partition(|v| v.is_good);

        Self {
            good: good.into_iter().map(|v| v.candidate.clone()).collect(),
            bad: bad.into_iter().map(|v| v.candidate.clone()).collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.good.len() + self.bad.len()
    }
}

/// Display counts, restricted to well-formed candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub good: usize,
    pub bad: usize,
}
