use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::job::{Job, JobOutcome, JobReport};
use crate::metrics::collector::MetricsCollector;
use crate::shutdown::Shutdown;
use crate::state::SharedState;
use crate::store::{LogStore, MetricsRow};
use chrono::Utc;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;

/// Consumer: takes one job at a time off the queue, counts the target phrase
/// and records the outcome.
///
/// Fetch failures and malformed entries are recorded and the loop goes on.
/// Any error from the shared state or the log store ends [`Worker::run`].
pub struct Worker {
    state: Arc<dyn SharedState>,
    log_store: Arc<dyn LogStore>,
    fetcher: Arc<dyn PageFetcher>,
    metrics: MetricsCollector,
    pause: Duration,
    progress: Option<ProgressBar>,
}

impl Worker {
    pub fn new(
        state: Arc<dyn SharedState>,
        log_store: Arc<dyn LogStore>,
        fetcher: Arc<dyn PageFetcher>,
        pause: Duration,
    ) -> Self {
        Self {
            metrics: MetricsCollector::new(state.clone()),
            state,
            log_store,
            fetcher,
            pause,
            progress: None,
        }
    }

    /// Reports running totals on a terminal spinner.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn run(&self, shutdown: Shutdown) -> Result<()> {
        log::info!("Waiting on queue: {}", crate::state::QUEUE_KEY);

        let result = self.consume(shutdown).await;

        if let Some(progress) = &self.progress {
            match &result {
                Ok(()) => progress.finish_with_message("stopped"),
                Err(e) => progress.abandon_with_message(format!("failed: {}", e)),
            }
        }
        match &result {
            Ok(()) => log::info!("Worker stopped."),
            Err(e) => log::error!("Worker stopped: {}", e),
        }
        result
    }

    async fn consume(&self, shutdown: Shutdown) -> Result<()> {
        loop {
            let raw = tokio::select! {
                _ = shutdown.clone().wait() => return Ok(()),
                popped = self.state.pop_job() => popped?,
            };

            let report = self.process_entry(&raw).await?;
            self.show_progress(&report);

            if report.outcome.is_success() {
                tokio::select! {
                    _ = shutdown.clone().wait() => return Ok(()),
                    _ = tokio::time::sleep(self.pause) => {}
                }
            }
        }
    }

    /// Handles one dequeued entry end to end: counters, heartbeat, log row.
    pub async fn process_entry(&self, raw: &str) -> Result<JobReport> {
        let ts = Utc::now();

        let job = match Job::from_payload(raw) {
            Ok(job) => job,
            Err(e) => {
                let error = format!("bad job: {}", e);
                log::warn!("Bad job payload; recorded error: {}", e);
                self.metrics.record_malformed(ts, &error).await?;
                return self
                    .finish(ts, None, JobOutcome::Malformed { error })
                    .await;
            }
        };

        self.metrics.record_attempt().await?;

        let outcome = match self.fetcher.count_occurrences(&job.url, &job.target).await {
            Ok(count) => {
                self.metrics.record_success(ts).await?;
                log::info!(
                    "OK: {} - occurrences of '{}': {}",
                    job.url,
                    job.target,
                    count
                );
                JobOutcome::Succeeded { count }
            }
            Err(e) => {
                let error = e.to_string();
                self.metrics.record_failure(ts, &error).await?;
                log::error!("ERROR fetching {}: {}", job.url, error);
                JobOutcome::Failed { error }
            }
        };

        self.finish(ts, Some(job), outcome).await
    }

    async fn finish(
        &self,
        ts: chrono::DateTime<Utc>,
        job: Option<Job>,
        outcome: JobOutcome,
    ) -> Result<JobReport> {
        let totals = self.metrics.totals().await?;
        let row = MetricsRow::new(ts, outcome.count(), &totals);
        self.log_store.append(&row).await?;
        log::debug!(
            "Logged row: count={:?} fetch={} success={} error={}",
            row.count,
            row.crawler_fetch_total,
            row.crawler_success_total,
            row.crawler_error_total
        );

        Ok(JobReport {
            ts,
            job,
            outcome,
            totals,
        })
    }

    fn show_progress(&self, report: &JobReport) {
        if let Some(progress) = &self.progress {
            progress.inc(1);
            progress.set_message(format!(
                "Fetched: {} | Success: {:.1}% | Errors: {}",
                report.totals.fetch_total,
                report.totals.success_rate(),
                report.totals.error_total
            ));
        }
    }
}
