use serde::{Deserialize, Serialize};

/// The three lifetime counters maintained by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Fetch,
    Success,
    Error,
}

impl Counter {
    pub const ALL: [Counter; 3] = [Counter::Fetch, Counter::Success, Counter::Error];

    /// Shared state key holding the decimal value.
    pub fn key(&self) -> &'static str {
        match self {
            Counter::Fetch => "crawler:fetch_total",
            Counter::Success => "crawler:success_total",
            Counter::Error => "crawler:error_total",
        }
    }

    /// Metric name in the text exposition.
    pub fn metric_name(&self) -> &'static str {
        match self {
            Counter::Fetch => "crawler_fetch_total",
            Counter::Success => "crawler_success_total",
            Counter::Error => "crawler_error_total",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Counter::Fetch => "Total crawl fetch attempts.",
            Counter::Success => "Total successful crawl executions.",
            Counter::Error => "Total failed crawl executions.",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub fetch_total: u64,
    pub success_total: u64,
    pub error_total: u64,
}

impl Counters {
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Fetch => self.fetch_total,
            Counter::Success => self.success_total,
            Counter::Error => self.error_total,
        }
    }

    /// True when every fetch attempt has been settled as a success or an error.
    pub fn is_balanced(&self) -> bool {
        self.fetch_total == self.success_total + self.error_total
    }

    pub fn success_rate(&self) -> f64 {
        if self.fetch_total > 0 {
            (self.success_total as f64 / self.fetch_total as f64) * 100.0
        } else {
            0.0
        }
    }
}
