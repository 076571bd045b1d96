//! Validation scheduler: runs the validator over every candidate and target

use crate::proxy::models::{Candidate, CandidateVerdict, ProtocolKind, TargetEndpoint};
use crate::proxy::validator::ProxyValidator;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs one task per candidate under a fixed worker budget
#[derive(Clone)]
pub struct ValidationScheduler {
    validator: ProxyValidator,
}

impl ValidationScheduler {
    pub fn new(validator: ProxyValidator) -> Self {
        Self { validator }
    }

    /// Verdicts for every candidate, in submission order
    pub async fn run(
        &self,
        candidates: Vec<Candidate>,
        targets: &[TargetEndpoint],
        protocol: ProtocolKind,
        worker_count: usize,
    ) -> Vec<CandidateVerdict> {
        self.run_with_progress(candidates, targets, protocol, worker_count, |_| {})
            .await
    }

    /// Like [`run`](Self::run), calling `on_verdict` as each verdict is
    /// collected. Collection follows submission order.
    pub async fn run_with_progress<F>(
        &self,
        candidates: Vec<Candidate>,
        targets: &[TargetEndpoint],
        protocol: ProtocolKind,
        worker_count: usize,
        mut on_verdict: F,
    ) -> Vec<CandidateVerdict>
    where
        F: FnMut(&CandidateVerdict),
    {
        let workers = worker_count.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut verdicts = Vec::with_capacity(candidates.len());

        let mut tasks = stream::iter(candidates)
            .map(|candidate| {
                let sem = Arc::clone(&semaphore);
                async move {
                    // the semaphore is never closed, so acquire cannot fail
                    let _permit = sem.acquire().await.ok();
                    self.check_candidate(candidate, targets, protocol).await
                }
            })
            .buffered(workers);

        while let Some(verdict) = tasks.next().await {
            on_verdict(&verdict);
            verdicts.push(verdict);
        }

        verdicts
    }

    /// Probe one candidate against every target, in target order. All
    /// targets are probed even after a failure.
    async fn check_candidate(
        &self,
        candidate: Candidate,
        targets: &[TargetEndpoint],
        protocol: ProtocolKind,
    ) -> CandidateVerdict {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            outcomes.push(self.validator.probe(&candidate, target, protocol).await);
        }
        CandidateVerdict::new(candidate, outcomes)
    }
}
