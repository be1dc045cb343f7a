pub mod collector;
pub mod exposition;
pub mod snapshot;

pub use collector::MetricsCollector;
pub use snapshot::{Counter, Counters};
