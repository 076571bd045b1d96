//! Network seams used by the aggregator and the validator
//!
//! Both traits have a reqwest-backed implementation; tests substitute fakes.

use crate::proxy::models::{Candidate, ProtocolKind};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy, Url};
use std::time::Duration;

/// Default timeout for source downloads in seconds
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Downloads the body of a proxy-list source
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Body of a 2xx response; anything else is an error
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String>;
}

/// Failure of a single proxied request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response within the request timeout
    Timeout,
    /// Any other transport failure
    Other(String),
}

/// Issues one GET to `target` routed through `candidate`
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// HTTP status code of the completed response
    async fn get_status(
        &self,
        target: &Url,
        candidate: &Candidate,
        protocol: ProtocolKind,
        timeout: Duration,
    ) -> Result<u16, TransportError>;
}

/// reqwest client for plain source downloads
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> crate::Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP status: {}", status));
        }
        Ok(response.text().await?)
    }
}

/// Builds a fresh proxied reqwest client per request
#[derive(Debug, Clone, Default)]
pub struct HttpProbeTransport;

impl HttpProbeTransport {
    pub fn new() -> Self {
        Self
    }

    fn create_client(
        candidate: &Candidate,
        protocol: ProtocolKind,
        timeout: Duration,
    ) -> Result<Client, reqwest::Error> {
        let proxy = ReqwestProxy::all(candidate.proxy_url(protocol))?;

        Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
    }
}

#[async_trait]
impl ProbeTransport for HttpProbeTransport {
    async fn get_status(
        &self,
        target: &Url,
        candidate: &Candidate,
        protocol: ProtocolKind,
        timeout: Duration,
    ) -> Result<u16, TransportError> {
        let client = Self::create_client(candidate, protocol, timeout)
            .map_err(|e| TransportError::Other(e.to_string()))?;

        match tokio::time::timeout(timeout, client.get(target.clone()).send()).await {
            Ok(Ok(response)) => Ok(response.status().as_u16()),
            Ok(Err(e)) if e.is_timeout() => Err(TransportError::Timeout),
            Ok(Err(e)) => Err(TransportError::Other(e.to_string())),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_create_client_for_each_protocol() {
        let candidate = Candidate::new("127.0.0.1:8080");
        for protocol in [ProtocolKind::Http, ProtocolKind::Socks5] {
            assert!(
                HttpProbeTransport::create_client(&candidate, protocol, Duration::from_secs(1))
                    .is_ok()
            );
        }
    }

    #[test]
    fn test_fetcher_creation() {
        assert!(HttpFetcher::new().is_ok());
        assert!(HttpFetcher::with_timeout(Duration::from_secs(5)).is_ok());
    }

    /// Accepts connections and never answers
    async fn silent_proxy() -> Candidate {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Candidate::new(addr.to_string())
    }

    /// An address with nothing listening on it
    async fn closed_port() -> Candidate {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Candidate::new(addr.to_string())
    }

    // numeric host so socks proxies skip local name resolution
    fn target() -> Url {
        Url::parse("http://10.255.255.1/").unwrap()
    }

    #[tokio::test]
    async fn test_silent_proxy_times_out() {
        let transport = HttpProbeTransport::new();
        let candidate = silent_proxy().await;

        for protocol in [ProtocolKind::Http, ProtocolKind::Socks4, ProtocolKind::Socks5] {
            let result = transport
                .get_status(&target(), &candidate, protocol, Duration::from_millis(300))
                .await;
            assert_eq!(result, Err(TransportError::Timeout), "{}", protocol);
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_not_a_timeout() {
        let transport = HttpProbeTransport::new();
        let candidate = closed_port().await;

        for protocol in [ProtocolKind::Http, ProtocolKind::Socks5] {
            let result = transport
                .get_status(&target(), &candidate, protocol, Duration::from_secs(5))
                .await;
            assert!(
                matches!(result, Err(TransportError::Other(_))),
                "{}: {:?}",
                protocol,
                result
            );
        }
    }
}
