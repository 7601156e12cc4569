//! Request samples and latency summaries.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Readers,
    Creators,
}

impl Scenario {
    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Readers => "readers",
            Scenario::Creators => "creators",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// `GET /posts`
    ListPosts,
    /// `POST /posts`
    CreatePost,
}

#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub scenario: Scenario,
    pub endpoint: Endpoint,
    pub latency: Duration,
    /// The response carried the expected status.
    pub ok: bool,
}

/// Shared sink for samples from every virtual user.
#[derive(Debug, Default)]
pub struct Recorder {
    samples: Mutex<Vec<Sample>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sample: Sample) {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sample);
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Latency statistics for one slice of the samples, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub failed: usize,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

impl LatencySummary {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Option<Self> {
        let mut latencies = Vec::new();
        let mut failed = 0;
        for sample in samples {
            latencies.push(sample.latency);
            if !sample.ok {
                failed += 1;
            }
        }
        if latencies.is_empty() {
            return None;
        }
        latencies.sort_unstable();

        let total: Duration = latencies.iter().sum();
        let count = latencies.len();
        Some(Self {
            count,
            failed,
            min_ms: as_ms(latencies[0]),
            avg_ms: as_ms(total) / count as f64,
            p95_ms: as_ms(percentile(&latencies, 0.95)),
            max_ms: as_ms(latencies[count - 1]),
        })
    }

    pub fn failure_rate(&self) -> f64 {
        self.failed as f64 / self.count as f64
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice.
pub fn percentile(sorted: &[Duration], quantile: f64) -> Duration {
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

fn as_ms(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}
