//! Bounded, resumable ingestion run over the catalog.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use qazlaw_client::Transport;
use qazlaw_core::ActTypeCode;
use qazlaw_store::DuckStore;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{ActOutcome, CatalogWalker, IngestConfig, IngestError, WorkerContext};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStatus {
    #[default]
    Completed,
    /// Stopped by the operator; in-flight acts were drained.
    Interrupted,
    /// Stopped by an unrecoverable act or catalog failure.
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::Interrupted => 130,
            RunStatus::Failed => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Catalog page of the last act submitted.
    pub last_page: Option<u32>,
    /// Earliest page that still holds an act this run did not finish. Starting
    /// a new run here retries every failed act; stored acts are skipped.
    pub resume_page: Option<u32>,
    pub acts_persisted: usize,
    pub acts_skipped: usize,
    pub acts_failed: usize,
    pub versions_persisted: usize,
    /// Codes of acts whose language editions could not be reconciled.
    pub conflicts: Vec<String>,
}

type TaskOutput = (WorkerContext, Result<ActOutcome, IngestError>);

/// What the coordinator remembers about a spawned act until it is joined.
struct InFlight {
    code: String,
    page: u32,
}

/// Drives the catalog walker and a fixed pool of worker contexts.
///
/// A new act is pulled from the catalog only when a worker is idle. Each act
/// is committed in its own transaction, so stopping early never leaves a
/// partially written act behind.
pub struct Coordinator {
    transport: Arc<dyn Transport>,
    config: Arc<IngestConfig>,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(transport: Arc<dyn Transport>, config: IngestConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop submitting new acts once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, store: &DuckStore) -> Result<RunReport, IngestError> {
        let started = Instant::now();
        store.seed_act_types(ActTypeCode::ALL)?;

        let concurrency = self.config.concurrency.max(1);
        let mut idle = (0..concurrency)
            .map(|id| WorkerContext::new(id, store.session()?))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            start_page = self.config.start_page,
            concurrency,
            act_types = self.config.act_types.len(),
            "ingestion started"
        );

        let mut walker = CatalogWalker::from_config(self.transport.clone(), &self.config);
        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
        let mut in_flight: HashMap<task::Id, InFlight> = HashMap::new();
        let mut submitted = HashSet::new();
        let mut report = RunReport::default();
        let mut stop: Option<RunStatus> = None;
        let mut exhausted = false;

        loop {
            while stop.is_none() && !exhausted && !idle.is_empty() {
                if self.cancel.is_cancelled() {
                    stop = Some(RunStatus::Interrupted);
                    break;
                }
                let next = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        stop = Some(RunStatus::Interrupted);
                        break;
                    }
                    next = walker.next() => next,
                };
                let entry = match next {
                    Ok(Some(entry)) => entry,
                    Ok(None) => {
                        exhausted = true;
                        break;
                    }
                    Err(err) => {
                        error!(error = %err, "catalog walk failed");
                        stop = Some(RunStatus::Failed);
                        break;
                    }
                };

                let code = entry.summary.code.clone();
                let page = entry.page;
                if !submitted.insert(code.clone()) {
                    debug!(code = %code, "listed twice in catalog; skipped");
                    report.acts_skipped += 1;
                    continue;
                }
                let Some(mut ctx) = idle.pop() else { break };
                let transport = self.transport.clone();
                let config = self.config.clone();
                debug!(code = %code, page, worker = ctx.id(), "act submitted");
                let handle = tasks.spawn(async move {
                    let outcome = ctx
                        .process(transport.as_ref(), &entry.summary, &config)
                        .await;
                    (ctx, outcome)
                });
                in_flight.insert(handle.id(), InFlight { code, page });
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };
            match joined {
                Ok((id, (ctx, outcome))) => {
                    idle.push(ctx);
                    let Some(act) = in_flight.remove(&id) else {
                        continue;
                    };
                    if let Some(status) = self.record(&mut report, &act, outcome) {
                        stop.get_or_insert(status);
                    }
                }
                Err(err) => {
                    // The worker's context went down with the task.
                    let act = in_flight.remove(&err.id());
                    let code = act.as_ref().map_or("?", |act| act.code.as_str());
                    error!(code, error = %err, "worker task panicked");
                    report.acts_failed += 1;
                    if let Some(act) = act {
                        retry_from(&mut report, act.page);
                    }
                    stop.get_or_insert(RunStatus::Failed);
                }
            }
        }

        report.status = stop.unwrap_or_default();
        report.last_page = walker.last_page();
        if report.status != RunStatus::Completed {
            // Acts never submitted sit on the last walked page or after it.
            let frontier = report.last_page.unwrap_or(self.config.start_page.max(1));
            retry_from(&mut report, frontier);
        }
        info!(
            status = ?report.status,
            last_page = ?report.last_page,
            resume_page = ?report.resume_page,
            persisted = report.acts_persisted,
            skipped = report.acts_skipped,
            failed = report.acts_failed,
            versions = report.versions_persisted,
            conflicts = report.conflicts.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "ingestion finished"
        );
        Ok(report)
    }

    /// Fold one act's result into the report. Returns a status when the run must stop.
    fn record(
        &self,
        report: &mut RunReport,
        act: &InFlight,
        outcome: Result<ActOutcome, IngestError>,
    ) -> Option<RunStatus> {
        let code = act.code.as_str();
        match outcome {
            Ok(ActOutcome::Persisted { act_id, versions }) => {
                report.acts_persisted += 1;
                report.versions_persisted += versions;
                info!(code, act_id, versions, "act persisted");
                None
            }
            Ok(ActOutcome::Skipped(reason)) => {
                report.acts_skipped += 1;
                info!(code, ?reason, "act skipped");
                None
            }
            Err(err) => {
                report.acts_failed += 1;
                let kind = err.kind();
                if kind == crate::ErrorKind::Conflict {
                    // not retried: the editions would disagree again
                    warn!(code, error = %err, "act failed reconciliation");
                    report.conflicts.push(code.to_string());
                } else {
                    error!(code, page = act.page, ?kind, error = %err, "act failed");
                    retry_from(report, act.page);
                }
                kind.stops_run(self.config.keep_going)
                    .then_some(RunStatus::Failed)
            }
        }
    }
}

/// Lower the resume page to `page`.
fn retry_from(report: &mut RunReport, page: u32) {
    report.resume_page = Some(report.resume_page.map_or(page, |p| p.min(page)));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use qazlaw_core::Language;

    use super::*;
    use crate::fixtures::{FakeTransport, date, document};

    const CODES: [&str; 5] = ["A1", "A2", "A3", "A4", "A5"];

    fn config(concurrency: usize) -> IngestConfig {
        IngestConfig {
            concurrency,
            page_delay: Duration::ZERO,
            ..IngestConfig::default()
        }
    }

    fn store() -> DuckStore {
        let store = DuckStore::open().unwrap();
        store.init_schema(false).unwrap();
        store
    }

    fn five_acts(delay: Duration) -> FakeTransport {
        let mut transport = FakeTransport::new().with_delay(delay);
        for code in CODES {
            transport.bilingual_act(code);
        }
        transport
    }

    fn persisted(store: &DuckStore) -> Vec<&'static str> {
        CODES
            .into_iter()
            .filter(|code| store.find_act_id(code).unwrap().is_some())
            .collect()
    }

    #[tokio::test]
    async fn completes_and_resumes_idempotently() {
        let store = store();
        let transport = Arc::new(five_acts(Duration::ZERO));

        let report = Coordinator::new(transport.clone(), config(2))
            .run(&store)
            .await
            .unwrap();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.acts_persisted, 5);
        assert_eq!(report.versions_persisted, 10);
        assert_eq!(report.last_page, Some(1));
        assert_eq!(report.resume_page, None);

        let again = Coordinator::new(transport, config(2)).run(&store).await.unwrap();
        assert_eq!(again.status, RunStatus::Completed);
        assert_eq!(again.acts_persisted, 0);
        assert_eq!(again.acts_skipped, 5);

        let stats = store.stats().unwrap();
        assert_eq!(stats.acts, 5);
        assert_eq!(stats.versions, 10);
    }

    #[tokio::test]
    async fn failure_stops_submissions_and_keeps_committed_acts() {
        let store = store();
        let mut failing = five_acts(Duration::from_millis(20));
        failing.fail("A3");
        let failing = Arc::new(failing);

        let report = Coordinator::new(failing.clone(), config(2))
            .run(&store)
            .await
            .unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.acts_failed, 1);
        assert!(report.conflicts.is_empty());

        let done = persisted(&store);
        assert!(done.contains(&"A1"));
        assert!(done.contains(&"A2"));
        assert!(!done.contains(&"A3"));
        assert!(!done.contains(&"A5"));
        assert_eq!(failing.document_calls("A5"), 0);
        assert_eq!(store.stats().unwrap().versions, 2 * done.len());

        let healthy = Arc::new(five_acts(Duration::ZERO));
        let resumed = Coordinator::new(healthy, config(2)).run(&store).await.unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
        assert_eq!(resumed.acts_skipped, done.len());
        assert_eq!(resumed.acts_persisted, 5 - done.len());
        assert_eq!(store.stats().unwrap().acts, 5);
    }

    #[tokio::test]
    async fn keep_going_rides_over_transport_failures() {
        let store = store();
        let mut transport = five_acts(Duration::ZERO);
        transport.fail("A3");

        let report = Coordinator::new(
            Arc::new(transport),
            IngestConfig {
                keep_going: true,
                ..config(2)
            },
        )
        .run(&store)
        .await
        .unwrap();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.acts_failed, 1);
        assert_eq!(report.resume_page, Some(1));
        assert_eq!(persisted(&store), vec!["A1", "A2", "A4", "A5"]);
    }

    #[tokio::test]
    async fn conflicts_are_reported_and_the_run_continues() {
        let store = store();
        let mut transport = five_acts(Duration::ZERO);
        let mut diverging = document("A2", Language::Kaz, date(2020, 1, 1));
        diverging.ngr = "ngr-other".into();
        transport.latest(diverging);

        let report = Coordinator::new(Arc::new(transport), config(1))
            .run(&store)
            .await
            .unwrap();
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.conflicts, vec!["A2"]);
        assert_eq!(report.resume_page, None);
        assert_eq!(report.acts_failed, 1);
        assert_eq!(persisted(&store), vec!["A1", "A3", "A4", "A5"]);
    }

    #[tokio::test]
    async fn catalog_failure_fails_the_run() {
        let store = store();
        let mut transport = five_acts(Duration::ZERO);
        transport.fail_search_from(1);

        let report = Coordinator::new(Arc::new(transport), config(2))
            .run(&store)
            .await
            .unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.last_page, None);
        assert_eq!(report.resume_page, Some(1));
        assert_eq!(store.stats().unwrap().acts, 0);
    }

    #[tokio::test]
    async fn interrupt_drains_in_flight_acts() {
        let store = store();
        let transport = Arc::new(five_acts(Duration::from_millis(20)));
        let coordinator = Coordinator::new(transport, config(2));
        let cancel = coordinator.cancellation();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });

        let report = coordinator.run(&store).await.unwrap();
        assert_eq!(report.status, RunStatus::Interrupted);
        assert_eq!(report.resume_page, Some(report.last_page.unwrap_or(1)));
        assert!(report.acts_persisted < 5);
        assert_eq!(report.acts_failed, 0);
        let stats = store.stats().unwrap();
        assert_eq!(stats.acts, report.acts_persisted);
        assert_eq!(stats.versions, 2 * stats.acts);
    }

    #[tokio::test]
    async fn resume_page_points_at_the_earliest_failed_act() {
        let store = store();
        let mut transport = five_acts(Duration::ZERO);
        transport.slow("A2", Duration::from_millis(100));
        transport.fail("A2");
        let config = IngestConfig {
            page_size: 2,
            ..config(2)
        };

        let report = Coordinator::new(Arc::new(transport), config.clone())
            .run(&store)
            .await
            .unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        // A1 finished early, so later pages were walked while A2 was stalled
        assert!(report.last_page > Some(1));
        assert_eq!(report.resume_page, Some(1));
        assert!(!persisted(&store).contains(&"A2"));

        let resumed = Coordinator::new(
            Arc::new(five_acts(Duration::ZERO)),
            IngestConfig {
                start_page: report.resume_page.unwrap(),
                ..config
            },
        )
        .run(&store)
        .await
        .unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
        assert_eq!(persisted(&store), CODES.to_vec());
    }

    #[tokio::test]
    async fn worker_panic_is_reported_against_its_act() {
        let store = store();
        let mut transport = five_acts(Duration::ZERO);
        transport.panic_on("A2");

        let report = Coordinator::new(Arc::new(transport), config(1))
            .run(&store)
            .await
            .unwrap();
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.acts_failed, 1);
        assert_eq!(report.resume_page, Some(1));
        assert_eq!(persisted(&store), vec!["A1"]);
    }

    #[tokio::test]
    async fn in_flight_acts_never_exceed_concurrency() {
        for concurrency in [1, 3] {
            let store = store();
            let transport = Arc::new(five_acts(Duration::from_millis(20)));
            let report = Coordinator::new(transport.clone(), config(concurrency))
                .run(&store)
                .await
                .unwrap();
            assert_eq!(report.acts_persisted, 5);
            assert_eq!(transport.max_active_acts(), concurrency);
        }
    }

    #[test]
    fn exit_codes() {
        assert_eq!(RunStatus::Completed.exit_code(), 0);
        assert_eq!(RunStatus::Interrupted.exit_code(), 130);
        assert_eq!(RunStatus::Failed.exit_code(), 1);
    }
}
