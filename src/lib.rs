pub mod config;
pub mod error;
pub mod fetcher;
pub mod health;
pub mod job;
pub mod metrics;
pub mod output;
pub mod scheduler;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod worker;

pub use error::{Error, Result};
pub use fetcher::{FetchError, HttpPageFetcher, PageFetcher};
pub use health::{HealthAggregator, HealthReport, Thresholds};
pub use job::{Job, JobOutcome, JobReport};
pub use metrics::collector::MetricsCollector;
pub use metrics::snapshot::{Counter, Counters};
pub use scheduler::Scheduler;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use state::{MemoryState, RedisState, SharedState};
pub use store::{LogStore, MemoryLogStore, MetricsRow};
pub use worker::Worker;
