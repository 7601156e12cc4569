//! Threshold checks over a finished run.

use serde::Serialize;

use crate::stats::{Endpoint, LatencySummary, Sample, Scenario};

/// Pass/fail limits applied once the run completes.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Upper bound on the share of failed requests, exclusive.
    pub max_failure_rate: f64,
    pub p95_all_ms: f64,
    /// `GET /posts` issued by the readers scenario.
    pub p95_reader_list_ms: f64,
    /// `POST /posts` issued by the creators scenario.
    pub p95_creator_create_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_failure_rate: 0.01,
            p95_all_ms: 500.0,
            p95_reader_list_ms: 400.0,
            p95_creator_create_ms: 800.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdResult {
    pub name: &'static str,
    pub limit: f64,
    /// `None` when no request fell into the checked slice.
    pub observed: Option<f64>,
    pub passed: bool,
}

impl ThresholdResult {
    fn below(name: &'static str, limit: f64, observed: Option<f64>) -> Self {
        Self {
            name,
            limit,
            observed,
            passed: observed.is_none_or(|value| value < limit),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub overall: Option<LatencySummary>,
    pub reader_list: Option<LatencySummary>,
    pub creator_list: Option<LatencySummary>,
    pub creator_create: Option<LatencySummary>,
    pub thresholds: Vec<ThresholdResult>,
}

impl Report {
    pub fn build(samples: &[Sample], thresholds: &Thresholds) -> Self {
        let slice = |scenario: Scenario, endpoint: Endpoint| {
            LatencySummary::from_samples(
                samples
                    .iter()
                    .filter(|s| s.scenario == scenario && s.endpoint == endpoint),
            )
        };

        let overall = LatencySummary::from_samples(samples);
        let reader_list = slice(Scenario::Readers, Endpoint::ListPosts);
        let creator_list = slice(Scenario::Creators, Endpoint::ListPosts);
        let creator_create = slice(Scenario::Creators, Endpoint::CreatePost);

        let thresholds = vec![
            ThresholdResult::below(
                "http_req_failed rate",
                thresholds.max_failure_rate,
                overall.as_ref().map(LatencySummary::failure_rate),
            ),
            ThresholdResult::below(
                "http_req_duration p95",
                thresholds.p95_all_ms,
                overall.as_ref().map(|s| s.p95_ms),
            ),
            ThresholdResult::below(
                "readers GET /posts p95",
                thresholds.p95_reader_list_ms,
                reader_list.as_ref().map(|s| s.p95_ms),
            ),
            ThresholdResult::below(
                "creators POST /posts p95",
                thresholds.p95_creator_create_ms,
                creator_create.as_ref().map(|s| s.p95_ms),
            ),
        ];

        Self {
            overall,
            reader_list,
            creator_list,
            creator_create,
            thresholds,
        }
    }

    pub fn passed(&self) -> bool {
        self.thresholds.iter().all(|result| result.passed)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rows = [
            ("all requests", &self.overall),
            ("readers  GET /posts", &self.reader_list),
            ("creators GET /posts", &self.creator_list),
            ("creators POST /posts", &self.creator_create),
        ];
        for (label, summary) in rows {
            match summary {
                Some(s) => out.push_str(&format!(
                    "{label:<22} n={:<7} failed={:<5} min={:.1}ms avg={:.1}ms p95={:.1}ms max={:.1}ms\n",
                    s.count, s.failed, s.min_ms, s.avg_ms, s.p95_ms, s.max_ms
                )),
                None => out.push_str(&format!("{label:<22} no requests\n")),
            }
        }
        out.push('\n');
        for result in &self.thresholds {
            let verdict = if result.passed { "PASS" } else { "FAIL" };
            let observed = result
                .observed
                .map(|value| format!("{value:.3}"))
                .unwrap_or_else(|| "n/a".to_string());
            out.push_str(&format!(
                "[{verdict}] {} < {} (observed {observed})\n",
                result.name, result.limit
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn sample(scenario: Scenario, endpoint: Endpoint, ms: u64, ok: bool) -> Sample {
        Sample {
            scenario,
            endpoint,
            latency: Duration::from_millis(ms),
            ok,
        }
    }

    #[test]
    fn fast_clean_run_passes() {
        let samples = vec![
            sample(Scenario::Readers, Endpoint::ListPosts, 12, true),
            sample(Scenario::Creators, Endpoint::ListPosts, 15, true),
            sample(Scenario::Creators, Endpoint::CreatePost, 40, true),
        ];
        let report = Report::build(&samples, &Thresholds::default());
        assert!(report.passed());
        assert!(report.render_text().contains("[PASS]"));
    }

    #[test]
    fn slow_creates_fail_only_their_threshold() {
        let samples = vec![
            sample(Scenario::Readers, Endpoint::ListPosts, 10, true),
            sample(Scenario::Readers, Endpoint::ListPosts, 10, true),
            sample(Scenario::Readers, Endpoint::ListPosts, 10, true),
            sample(Scenario::Creators, Endpoint::CreatePost, 900, true),
        ];
        let report = Report::build(&samples, &Thresholds::default());

        assert!(!report.passed());
        let failed: Vec<_> = report
            .thresholds
            .iter()
            .filter(|t| !t.passed)
            .map(|t| t.name)
            .collect();
        assert!(failed.contains(&"creators POST /posts p95"));
        assert!(!failed.contains(&"readers GET /posts p95"));
    }

    #[test]
    fn failure_rate_at_limit_fails() {
        let mut samples: Vec<_> = (0..99)
            .map(|_| sample(Scenario::Readers, Endpoint::ListPosts, 5, true))
            .collect();
        samples.push(sample(Scenario::Readers, Endpoint::ListPosts, 5, false));

        let report = Report::build(&samples, &Thresholds::default());
        assert!(!report.thresholds[0].passed);
    }

    #[test]
    fn empty_run_has_nothing_to_fail() {
        let report = Report::build(&[], &Thresholds::default());
        assert!(report.passed());
        assert!(report.overall.is_none());
    }
}
