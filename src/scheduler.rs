use crate::error::Result;
use crate::job::Job;
use crate::shutdown::Shutdown;
use crate::state::SharedState;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;

/// Producer: pushes the configured job on a fixed period and stamps its
/// heartbeat after every push.
pub struct Scheduler {
    state: Arc<dyn SharedState>,
    job: Job,
    period: Duration,
}

impl Scheduler {
    pub fn new(state: Arc<dyn SharedState>, job: Job, period: Duration) -> Self {
        Self { state, job, period }
    }

    /// Enqueues one job. A failed push is returned; a failed heartbeat write
    /// is only logged because the job is already committed to the queue.
    pub async fn tick(&self) -> Result<DateTime<Utc>> {
        let payload = self.job.to_payload()?;
        self.state.push_job(&payload).await?;

        let ts = Utc::now();
        if let Err(e) = self.state.record_enqueue_heartbeat(ts).await {
            log::warn!("Enqueued job but failed to write heartbeat: {}", e);
        }
        log::info!(
            "Enqueued: {} (target='{}') @ {}",
            self.job.url,
            self.job.target,
            ts
        );
        Ok(ts)
    }

    /// Ticks immediately, then once per period until shutdown.
    pub async fn run(&self, shutdown: Shutdown) -> Result<()> {
        log::info!(
            "Sending jobs every {:.1} seconds. URL={} TARGET={}",
            self.period.as_secs_f64(),
            self.job.url,
            self.job.target
        );

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let ticks = IntervalStream::new(interval).take_until(shutdown.wait());
        tokio::pin!(ticks);

        while ticks.next().await.is_some() {
            self.tick().await?;
        }

        log::info!("Scheduler stopped.");
        Ok(())
    }
}
