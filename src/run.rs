//! End-to-end run: gather, validate, persist, summarize

use crate::config::Config;
use crate::error::CheckError;
use crate::logging::Logger;
use crate::proxy::aggregator::{SourceAggregator, SourceReport};
use crate::proxy::models::{Candidate, CandidateVerdict, ProtocolKind, RunResult, Summary, TargetEndpoint};
use crate::proxy::scheduler::ValidationScheduler;
use crate::proxy::sink::ResultSink;
use crate::proxy::validator::ProxyValidator;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Candidates downloaded for one protocol, with a report per source
#[derive(Debug, Clone)]
pub struct Gathered {
    pub protocol: ProtocolKind,
    pub sources: Vec<SourceReport>,
    started: Instant,
}

impl Gathered {
    /// Raw candidates in source order
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.sources.iter().flat_map(|report| report.candidates.iter())
    }

    pub fn candidate_count(&self) -> usize {
        self.sources.iter().map(|report| report.candidates.len()).sum()
    }

    /// No source produced a candidate; the run cannot continue
    pub fn is_empty(&self) -> bool {
        self.candidate_count() == 0
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub protocol: ProtocolKind,
    pub sources: Vec<SourceReport>,
    pub verdicts: Vec<CandidateVerdict>,
    pub result: RunResult,
    /// Lines written to the output file
    pub written: usize,
    pub summary: Summary,
    pub elapsed: Duration,
}

/// The wired-up components of one run
pub struct Pipeline {
    aggregator: SourceAggregator,
    scheduler: ValidationScheduler,
    sink: ResultSink,
    targets: Vec<TargetEndpoint>,
    output: PathBuf,
}

impl Pipeline {
    pub fn new(
        aggregator: SourceAggregator,
        validator: ProxyValidator,
        sink: ResultSink,
        targets: Vec<TargetEndpoint>,
        output: PathBuf,
    ) -> Self {
        Self {
            aggregator,
            scheduler: ValidationScheduler::new(validator),
            sink,
            targets,
            output,
        }
    }

    /// Pipeline over real HTTP, configured from `config`
    pub fn from_config(config: &Config, logger: Logger) -> crate::Result<Self> {
        let aggregator = SourceAggregator::new(config.sources(&logger), logger.clone())?;
        let validator = ProxyValidator::new(logger.clone()).with_policy(config.policy());

        Ok(Self::new(
            aggregator,
            validator,
            ResultSink::new(logger),
            config.targets(),
            config.output_filename.clone(),
        ))
    }

    /// Pause between source downloads
    pub fn with_courtesy_delay(mut self, delay: Duration) -> Self {
        self.aggregator = self.aggregator.with_courtesy_delay(delay);
        self
    }

    /// Run without progress reporting
    pub async fn execute(
        &self,
        protocol: ProtocolKind,
        worker_count: usize,
    ) -> Result<RunReport, CheckError> {
        self.execute_with_progress(protocol, worker_count, |_| {})
            .await
    }

    /// Gather candidates, validate them and persist the good ones.
    ///
    /// Fails only with [`CheckError::NoCandidates`]; every other failure is
    /// logged and folded into the report.
    pub async fn execute_with_progress<F>(
        &self,
        protocol: ProtocolKind,
        worker_count: usize,
        on_verdict: F,
    ) -> Result<RunReport, CheckError>
    where
        F: FnMut(&CandidateVerdict),
    {
        let gathered = self.gather(protocol).await;
        if gathered.is_empty() {
            return Err(CheckError::NoCandidates(protocol));
        }
        Ok(self.check(gathered, worker_count, on_verdict).await)
    }

    /// Download every source for `protocol`, one report per source
    pub async fn gather(&self, protocol: ProtocolKind) -> Gathered {
        let started = Instant::now();
        Gathered {
            protocol,
            sources: self.aggregator.gather_with_reports(protocol).await,
            started,
        }
    }

    /// Validate gathered candidates, persist the good ones and summarize.
    /// Elapsed time counts from the start of the gather.
    pub async fn check<F>(&self, gathered: Gathered, worker_count: usize, on_verdict: F) -> RunReport
    where
        F: FnMut(&CandidateVerdict),
    {
        let protocol = gathered.protocol;
        let candidates = gathered.candidates().cloned().collect();

        let verdicts = self
            .scheduler
            .run_with_progress(candidates, &self.targets, protocol, worker_count, on_verdict)
            .await;
        let result = RunResult::from_verdicts(&verdicts);

        let written = self.sink.persist(&result.good, &self.output);
        let summary = self.sink.summarize(&result.good, &result.bad);

        RunReport {
            protocol,
            sources: gathered.sources,
            verdicts,
            result,
            written,
            summary,
            elapsed: gathered.started.elapsed(),
        }
    }
}
