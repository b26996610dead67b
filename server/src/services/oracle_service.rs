//! Oracle response coordinator
//!
//! Every delivered `OracleRequest` starts a round: each roster account looks
//! up its indexes and answers once per index with a simulated status. Rounds
//! are not deduplicated, a redelivered event is answered again.
//!
//! All lookups and submissions, across every concurrent round, share one
//! semaphore so the number of outstanding RPC operations stays bounded.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use super::oracle_registration::AccountRoster;
use crate::chain::{Address, OracleContract, OracleRequest};
use crate::models::oracle::{FlightStatus, LookupFailure, RoundReport, Submission, SubmissionOutcome};

/// Totals over everything `OracleCoordinator::run` handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub rounds: usize,
    pub submissions: usize,
    pub failed_submissions: usize,
    pub lookup_failures: usize,
    pub aborted: usize,
}

impl CoordinatorStats {
    fn record(&mut self, report: &RoundReport) {
        self.rounds += 1;
        self.submissions += report.submitted();
        self.failed_submissions += report.failed_submissions();
        self.lookup_failures += report.lookup_failures.len();
        self.aborted += report.aborted;
    }
}

pub struct OracleCoordinator {
    contract: Arc<dyn OracleContract>,
    roster: AccountRoster,
    permits: Arc<Semaphore>,
}

impl OracleCoordinator {
    pub fn new(contract: Arc<dyn OracleContract>, roster: AccountRoster, max_in_flight: usize) -> Self {
        Self {
            contract,
            roster,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn roster(&self) -> &[Address] {
        &self.roster
    }

    /// Run one full round for `request` and wait for every account to finish.
    pub async fn handle_request(&self, request: OracleRequest) -> RoundReport {
        let shared = Arc::new(request.clone());
        let mut accounts = JoinSet::new();

        for &oracle in self.roster.iter() {
            accounts.spawn(respond_as(
                Arc::clone(&self.contract),
                Arc::clone(&self.permits),
                oracle,
                Arc::clone(&shared),
            ));
        }

        let mut report = RoundReport::new(request);
        while let Some(joined) = accounts.join_next().await {
            match joined {
                Ok(Ok(outcomes)) => report.outcomes.extend(outcomes),
                Ok(Err(failure)) => report.lookup_failures.push(failure),
                Err(join_error) => {
                    log_join_error("oracle account task", &join_error);
                    report.aborted += 1;
                }
            }
        }

        info!(
            flight = %report.request.flight,
            airline = %report.request.airline,
            timestamp = report.request.timestamp,
            submitted = report.submitted(),
            failed = report.failed_submissions(),
            lookup_failures = report.lookup_failures.len(),
            "oracle round complete"
        );
        report
    }

    /// Answer requests until every sender is dropped.
    pub async fn run(self: Arc<Self>, mut requests: mpsc::Receiver<OracleRequest>) -> CoordinatorStats {
        let mut stats = CoordinatorStats::default();
        let mut rounds = JoinSet::new();

        loop {
            tokio::select! {
                received = requests.recv() => match received {
                    Some(request) => {
                        info!(
                            index = request.index,
                            flight = %request.flight,
                            airline = %request.airline,
                            timestamp = request.timestamp,
                            "oracle request received"
                        );
                        let coordinator = Arc::clone(&self);
                        rounds.spawn(async move { coordinator.handle_request(request).await });
                    }
                    None => break,
                },
                Some(joined) = rounds.join_next(), if !rounds.is_empty() => {
                    record_round(&mut stats, joined);
                }
            }
        }

        while let Some(joined) = rounds.join_next().await {
            record_round(&mut stats, joined);
        }

        info!(rounds = stats.rounds, submissions = stats.submissions, "oracle coordinator stopped");
        stats
    }
}

fn record_round(stats: &mut CoordinatorStats, joined: Result<RoundReport, JoinError>) {
    match joined {
        Ok(report) => stats.record(&report),
        Err(join_error) => log_join_error("oracle round", &join_error),
    }
}

fn log_join_error(task: &str, join_error: &JoinError) {
    if join_error.is_panic() {
        error!(task, "task panicked");
    } else {
        error!(task, error = %join_error, "task failed");
    }
}

/// One account's share of a round: look up its indexes, then answer under
/// each of them concurrently.
async fn respond_as(
    contract: Arc<dyn OracleContract>,
    permits: Arc<Semaphore>,
    oracle: Address,
    request: Arc<OracleRequest>,
) -> Result<Vec<SubmissionOutcome>, LookupFailure> {
    let indexes = {
        // the semaphore is never closed, so acquire cannot fail
        let _permit = permits.acquire().await.ok();
        contract.get_my_indexes(oracle).await
    };

    let indexes = match indexes {
        Ok(indexes) => indexes,
        Err(error) => {
            warn!(%oracle, error = %error, "index lookup failed");
            return Err(LookupFailure { oracle, error });
        }
    };
    debug!(%oracle, ?indexes, "oracle indexes");

    let submissions: Vec<Submission> = {
        let mut rng = rand::thread_rng();
        indexes
            .iter()
            .map(|&index| Submission::answering(&request, oracle, index, FlightStatus::draw(&mut rng)))
            .collect()
    };

    Ok(join_all(
        submissions
            .into_iter()
            .map(|submission| submit(contract.as_ref(), &permits, submission)),
    )
    .await)
}

async fn submit(
    contract: &dyn OracleContract,
    permits: &Semaphore,
    submission: Submission,
) -> SubmissionOutcome {
    let _permit = permits.acquire().await.ok();
    let result = contract
        .submit_oracle_response(&submission)
        .await
        .map(|receipt| receipt.transaction_hash);

    match &result {
        Ok(tx) => info!(
            oracle = %submission.oracle,
            index = submission.index,
            flight = %submission.flight,
            status = submission.status.code(),
            %tx,
            "oracle response submitted"
        ),
        Err(err) => warn!(
            oracle = %submission.oracle,
            index = submission.index,
            flight = %submission.flight,
            error = %err,
            "oracle response rejected"
        ),
    }

    SubmissionOutcome { submission, result }
}
