//! Run configuration loaded from JSON

use crate::error::CheckError;
use crate::logging::Logger;
use crate::proxy::aggregator::SourceMap;
use crate::proxy::models::{ProtocolKind, TargetEndpoint};
use crate::proxy::validator::ProbePolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const HTTP_SOURCES: &[&str] = &[
    "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=500&country=all",
    "https://proxy.webshare.io/proxy/list",
    "https://www.proxyscan.io/download?type=http",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
    "https://www.proxy-list.download/api/v1/get?type=http",
    "https://www.proxy-list.download/api/v1/get?type=http&anon=elite",
    "https://www.proxyscan.io/download?type=http&anon=elite",
];

const SOCKS4_SOURCES: &[&str] = &[
    "https://api.proxyscrape.com/v2/?request=getproxies&protocol=socks4&timeout=500&country=all",
    "https://www.proxyscan.io/download?type=socks4",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
    "https://www.proxy-list.download/api/v1/get?type=socks4",
    "https://www.proxy-list.download/api/v1/get?type=socks4&anon=elite",
    "https://www.proxyscan.io/download?type=socks4&anon=elite",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/socks4.txt",
    "https://www.proxynova.com/proxy-server-list/",
    "https://www.socks-proxy.net/",
    "https://proxy-daily.com/",
    "https://openproxy.space/list",
];

const SOCKS5_SOURCES: &[&str] = &[
    "https://api.proxyscrape.com/v2/?request=getproxies&protocol=socks5&timeout=500&country=all",
    "https://www.proxyscan.io/download?type=socks5",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
    "https://www.proxy-list.download/api/v1/get?type=socks5",
    "https://www.proxy-list.download/api/v1/get?type=socks5&anon=elite",
    "https://www.proxyscan.io/download?type=socks5&anon=elite",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/socks5.txt",
    "https://www.proxynova.com/proxy-server-list/",
    "https://www.socks-proxy.net/",
    "https://proxy-daily.com/",
];

const DEFAULT_TARGETS: &[&str] = &["http://icanhazip.com/", "http://ipv4.icanhazip.com/"];

/// Negative or non-finite values collapse to zero; `validate` rejects them first.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attempts per probe (1 disables retries)
    pub retries: u32,
    /// Initial backoff between retries, in seconds
    pub delay: f64,
    /// Per-request timeout, in seconds
    pub timeout: f64,
    /// Concurrently checked candidates
    pub threads: usize,
    /// Source URLs keyed by protocol name
    pub proxy_sources: BTreeMap<String, Vec<String>>,
    /// Menu key to protocol name
    pub protocols: BTreeMap<String, String>,
    /// URLs every good proxy must reach
    pub target_urls: Vec<String>,
    /// Where good proxies are written
    pub output_filename: PathBuf,
    /// Append-only run log
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let proxy_sources = [
            ("HTTPS", HTTP_SOURCES),
            ("SOCKS4", SOCKS4_SOURCES),
            ("SOCKS5", SOCKS5_SOURCES),
        ]
        .into_iter()
        .map(|(name, urls)| (name.to_string(), to_strings(urls)))
        .collect();

        let protocols = [("1", "HTTPS"), ("2", "SOCKS4"), ("3", "SOCKS5")]
            .into_iter()
            .map(|(key, name)| (key.to_string(), name.to_string()))
            .collect();

        Self {
            retries: 1,
            delay: 1.0,
            timeout: 5.0,
            threads: 10,
            proxy_sources,
            protocols,
            target_urls: to_strings(DEFAULT_TARGETS),
            output_filename: PathBuf::from("proxylist.txt"),
            log_file: PathBuf::from("proxy_checker.log"),
        }
    }
}

impl Config {
    /// Read and parse a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(content: &str) -> crate::Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CheckError> {
        if self.threads == 0 {
            return Err(CheckError::Config("threads must be at least 1".to_string()));
        }
        for (name, value) in [("delay", self.delay), ("timeout", self.timeout)] {
            if !value.is_finite() || value < 0.0 {
                return Err(CheckError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                )));
            }
        }
        if self.target_urls.is_empty() {
            return Err(CheckError::Config("target_urls must not be empty".to_string()));
        }
        Ok(())
    }

    /// Map an interactive selection key to its protocol
    pub fn resolve_protocol(&self, selection: &str) -> Result<ProtocolKind, CheckError> {
        self.protocols
            .get(selection.trim())
            .ok_or_else(|| CheckError::UnknownProtocol(selection.trim().to_string()))?
            .parse()
    }

    /// Menu entries in key order
    pub fn protocol_menu(&self) -> impl Iterator<Item = (&str, &str)> {
        self.protocols.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn policy(&self) -> ProbePolicy {
        ProbePolicy::new()
            .with_max_attempts(self.retries)
            .with_initial_backoff(seconds(self.delay))
            .with_request_timeout(seconds(self.timeout))
    }

    /// Source URLs by protocol. Unrecognized protocol keys are skipped with a
    /// warning; keys naming the same protocol are merged.
    pub fn sources(&self, logger: &Logger) -> SourceMap {
        let mut map = SourceMap::new();
        for (name, urls) in &self.proxy_sources {
            match name.parse::<ProtocolKind>() {
                Ok(protocol) => map.entry(protocol).or_default().extend(urls.iter().cloned()),
                Err(_) => logger.warn(format!("Ignoring sources for unknown protocol {}", name)),
            }
        }
        map
    }

    pub fn targets(&self) -> Vec<TargetEndpoint> {
        self.target_urls.iter().map(TargetEndpoint::new).collect()
    }
}
