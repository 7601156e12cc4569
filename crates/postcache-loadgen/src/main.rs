//! Load generator for the postcache posts API.
//!
//! Drives two ramping scenarios against a running server and checks latency
//! and error thresholds:
//!
//! ```bash
//! postcache-loadgen --base-url http://localhost:3000
//! postcache-loadgen --readers 10 --creators 2 --ramp-up-seconds 5 --hold-seconds 10
//! ```

mod report;
mod scenario;
mod stages;
mod stats;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use report::{Report, Thresholds};
use scenario::{PostsTarget, ScenarioRun, run_all};
use stages::RampProfile;
use stats::{Recorder, Scenario};

#[derive(Debug, Parser)]
#[command(
    name = "postcache-loadgen",
    version,
    about = "Ramping reader/creator load against the posts API"
)]
struct Args {
    /// Base URL of the server under test.
    #[arg(
        long = "base-url",
        env = "POSTCACHE_LOADGEN_BASE_URL",
        default_value = "http://localhost:3000"
    )]
    base_url: Url,

    /// Peak number of reader virtual users.
    #[arg(long, default_value_t = 80)]
    readers: usize,

    /// Peak number of creator virtual users.
    #[arg(long, default_value_t = 20)]
    creators: usize,

    #[arg(long = "ramp-up-seconds", default_value_t = 30)]
    ramp_up_seconds: u64,

    #[arg(long = "hold-seconds", default_value_t = 60)]
    hold_seconds: u64,

    #[arg(long = "ramp-down-seconds", default_value_t = 20)]
    ramp_down_seconds: u64,

    /// Per-request timeout; a timed-out request counts as failed.
    #[arg(long = "request-timeout-seconds", default_value_t = 10)]
    request_timeout_seconds: u64,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum LoadgenError {
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<bool, LoadgenError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(args.request_timeout_seconds))
        .build()?;
    let target = Arc::new(PostsTarget::new(client, &args.base_url)?);
    let recorder = Arc::new(Recorder::new());

    let up = Duration::from_secs(args.ramp_up_seconds);
    let hold = Duration::from_secs(args.hold_seconds);
    let down = Duration::from_secs(args.ramp_down_seconds);
    let runs = vec![
        ScenarioRun {
            scenario: Scenario::Readers,
            profile: Arc::new(RampProfile::ramp_hold_ramp(args.readers, up, hold, down)),
        },
        ScenarioRun {
            scenario: Scenario::Creators,
            profile: Arc::new(RampProfile::ramp_hold_ramp(args.creators, up, hold, down)),
        },
    ];

    eprintln!(
        "running {} readers and {} creators against {} for {}s",
        args.readers,
        args.creators,
        args.base_url,
        (up + hold + down).as_secs()
    );
    for run in &runs {
        eprintln!("  scenario {}: peak {}", run.scenario.as_str(), run.profile.peak());
    }
    run_all(runs, target, Arc::clone(&recorder)).await;

    let report = Report::build(&recorder.snapshot(), &Thresholds::default());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(report.passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reproduce_standard_profile() {
        let args = Args::parse_from(["postcache-loadgen"]);
        assert_eq!(args.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(args.readers, 80);
        assert_eq!(args.creators, 20);
        assert_eq!(args.ramp_up_seconds, 30);
        assert_eq!(args.hold_seconds, 60);
        assert_eq!(args.ramp_down_seconds, 20);
        assert!(!args.json);
    }

    #[test]
    fn rejects_malformed_base_url() {
        let parsed = Args::try_parse_from(["postcache-loadgen", "--base-url", "not a url"]);
        assert!(parsed.is_err());
    }
}
