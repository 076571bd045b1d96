//! End-to-end runs over fake sources and a fake proxy transport.

use anyhow::anyhow;
use async_trait::async_trait;
use proxy_vet::{
    Candidate, CheckError, Logger, Pipeline, ProbePolicy, ProbeStatus, ProbeTransport,
    ProtocolKind, ProxyValidator, ResultSink, SourceAggregator, SourceFetcher, SourceMap, Summary,
    TargetEndpoint, TransportError,
};
use reqwest::Url;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const SOURCE: &str = "http://lists.test/http.txt";
const TARGET: &str = "http://example.test/";

struct StaticSources(HashMap<String, String>);

#[async_trait]
impl SourceFetcher for StaticSources {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP status: 503 Service Unavailable"))
    }
}

/// `1.2.3.4:8080` answers 200; everything else fails to connect
#[derive(Default)]
struct OneGoodProxy {
    calls: AtomicUsize,
}

#[async_trait]
impl ProbeTransport for OneGoodProxy {
    async fn get_status(
        &self,
        _target: &Url,
        candidate: &Candidate,
        _protocol: ProtocolKind,
        _timeout: Duration,
    ) -> Result<u16, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match candidate.as_str() {
            "1.2.3.4:8080" => Ok(200),
            other => Err(TransportError::Other(format!("error trying to connect: {}", other))),
        }
    }
}

fn pipeline(
    bodies: &[(&str, &str)],
    sources: SourceMap,
    transport: Arc<OneGoodProxy>,
    output: &Path,
    logger: Logger,
) -> Pipeline {
    let fetcher = StaticSources(
        bodies
            .iter()
            .map(|(url, body)| (url.to_string(), body.to_string()))
            .collect(),
    );
    let aggregator = SourceAggregator::with_fetcher(Arc::new(fetcher), sources, logger.clone())
        .with_courtesy_delay(Duration::ZERO);
    let validator = ProxyValidator::with_transport(transport, ProbePolicy::default(), logger.clone());

    Pipeline::new(
        aggregator,
        validator,
        ResultSink::new(logger),
        vec![TargetEndpoint::new(TARGET)],
        output.to_path_buf(),
    )
}

fn http_sources(urls: &[&str]) -> SourceMap {
    let mut map = SourceMap::new();
    map.insert(ProtocolKind::Http, urls.iter().map(|u| u.to_string()).collect());
    map
}

#[tokio::test]
async fn test_end_to_end_good_and_bad() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("proxylist.txt");
    let transport = Arc::new(OneGoodProxy::default());

    let report = pipeline(
        &[(SOURCE, "1.2.3.4:8080\nnot-a-proxy\n")],
        http_sources(&[SOURCE]),
        transport.clone(),
        &output,
        Logger::disabled(),
    )
    .execute(ProtocolKind::Http, 4)
    .await
    .unwrap();

    assert_eq!(report.result.good, vec![Candidate::new("1.2.3.4:8080")]);
    assert_eq!(report.result.bad, vec![Candidate::new("not-a-proxy")]);
    assert_eq!(fs::read_to_string(&output).unwrap(), "1.2.3.4:8080");
    assert_eq!(report.written, 1);
    // not-a-proxy stays in the bad partition but is not counted
    assert_eq!(report.summary, Summary { good: 1, bad: 0 });

    let bad = &report.verdicts[1];
    assert!(matches!(bad.outcomes[0].status, ProbeStatus::Network(_)));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_partition_covers_every_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let body = "1.2.3.4:8080\n\n5.6.7.8:80\n1.2.3.4:8080\ngarbage\n";

    for workers in [1, 2, 16] {
        let report = pipeline(
            &[(SOURCE, body)],
            http_sources(&[SOURCE]),
            Arc::new(OneGoodProxy::default()),
            &dir.path().join("out.txt"),
            Logger::disabled(),
        )
        .execute(ProtocolKind::Http, workers)
        .await
        .unwrap();

        assert_eq!(report.result.total(), 5);
        assert_eq!(report.result.good.len(), 2);
        assert_eq!(report.verdicts.len(), 5);
    }
}

#[tokio::test]
async fn test_unavailable_source_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("proxylist.txt");
    let log_path = dir.path().join("run.log");
    let logger = Logger::to_file(&log_path, tracing::Level::WARN).unwrap();

    let report = pipeline(
        &[(SOURCE, "1.2.3.4:8080")],
        http_sources(&["http://down.test/list", SOURCE]),
        Arc::new(OneGoodProxy::default()),
        &output,
        logger,
    )
    .execute(ProtocolKind::Http, 2)
    .await
    .unwrap();

    assert_eq!(report.result.good, vec![Candidate::new("1.2.3.4:8080")]);
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("http://down.test/list"));
}

#[tokio::test]
async fn test_no_candidates_aborts_before_probing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("proxylist.txt");
    let transport = Arc::new(OneGoodProxy::default());

    let err = pipeline(
        &[],
        http_sources(&["http://down.test/list"]),
        transport.clone(),
        &output,
        Logger::disabled(),
    )
    .execute(ProtocolKind::Http, 4)
    .await
    .unwrap_err();

    assert!(matches!(err, CheckError::NoCandidates(ProtocolKind::Http)));
    assert!(err.is_abort());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_protocol_without_sources_aborts() {
    let dir = tempfile::tempdir().unwrap();

    let err = pipeline(
        &[(SOURCE, "1.2.3.4:8080")],
        http_sources(&[SOURCE]),
        Arc::new(OneGoodProxy::default()),
        &dir.path().join("out.txt"),
        Logger::disabled(),
    )
    .execute(ProtocolKind::Socks5, 4)
    .await
    .unwrap_err();

    assert!(matches!(err, CheckError::NoCandidates(ProtocolKind::Socks5)));
}

#[tokio::test]
async fn test_progress_sees_every_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let mut seen = Vec::new();

    pipeline(
        &[(SOURCE, "1.2.3.4:8080\nnot-a-proxy")],
        http_sources(&[SOURCE]),
        Arc::new(OneGoodProxy::default()),
        &dir.path().join("out.txt"),
        Logger::disabled(),
    )
    .execute_with_progress(ProtocolKind::Http, 1, |v| seen.push((v.candidate.clone(), v.is_good)))
    .await
    .unwrap();

    assert_eq!(
        seen,
        vec![
            (Candidate::new("1.2.3.4:8080"), true),
            (Candidate::new("not-a-proxy"), false),
        ]
    );
}

#[tokio::test]
async fn test_report_lists_every_source() {
    let dir = tempfile::tempdir().unwrap();

    let report = pipeline(
        &[(SOURCE, "1.2.3.4:8080\n5.6.7.8:80")],
        http_sources(&["http://down.test/list", SOURCE]),
        Arc::new(OneGoodProxy::default()),
        &dir.path().join("out.txt"),
        Logger::disabled(),
    )
    .execute(ProtocolKind::Http, 2)
    .await
    .unwrap();

    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].source, "http://down.test/list");
    assert!(!report.sources[0].is_success());
    assert!(report.sources[0].error.as_ref().unwrap().contains("503"));
    assert!(report.sources[1].is_success());
    assert_eq!(report.sources[1].candidates.len(), 2);
}

#[tokio::test]
async fn test_gather_then_check() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("proxylist.txt");
    let transport = Arc::new(OneGoodProxy::default());
    let pipeline = pipeline(
        &[(SOURCE, "1.2.3.4:8080\nnot-a-proxy")],
        http_sources(&[SOURCE]),
        transport.clone(),
        &output,
        Logger::disabled(),
    );

    let gathered = pipeline.gather(ProtocolKind::Http).await;
    assert!(!gathered.is_empty());
    assert_eq!(gathered.candidate_count(), 2);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

    let report = pipeline.check(gathered, 2, |_| {}).await;
    assert_eq!(report.protocol, ProtocolKind::Http);
    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.written, 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "1.2.3.4:8080");
}

#[tokio::test]
async fn test_gather_from_failed_sources_is_empty() {
    let dir = tempfile::tempdir().unwrap();

    let gathered = pipeline(
        &[],
        http_sources(&["http://down.test/a", "http://down.test/b"]),
        Arc::new(OneGoodProxy::default()),
        &dir.path().join("out.txt"),
        Logger::disabled(),
    )
    .gather(ProtocolKind::Http)
    .await;

    assert!(gathered.is_empty());
    assert_eq!(gathered.sources.len(), 2);
    assert!(gathered.sources.iter().all(|s| !s.is_success()));
}
