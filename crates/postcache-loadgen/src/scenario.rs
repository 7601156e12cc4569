//! Reader and creator virtual users.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};
use reqwest::{Client, StatusCode};
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep};
use url::Url;

use postcache_api_types::CreatePostRequest;

use crate::stages::RampProfile;
use crate::stats::{Endpoint, Recorder, Sample, Scenario};

const IDLE_POLL: Duration = Duration::from_millis(100);
const READER_THINK_SECS: Range<f64> = 1.0..3.0;
const CREATOR_COMPOSE_SECS: Range<f64> = 2.0..4.0;
const CREATOR_REST_SECS: Range<f64> = 3.0..5.0;
const POST_BODY: &str = "This post was created during a load test to check API scalability.";

/// HTTP access to the posts API under test.
pub struct PostsTarget {
    client: Client,
    posts_url: Url,
}

impl PostsTarget {
    pub fn new(client: Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            posts_url: base_url.join("posts")?,
        })
    }

    async fn list(&self) -> (Duration, bool) {
        let started = Instant::now();
        let result = self.client.get(self.posts_url.clone()).send().await;
        (started.elapsed(), status_is(result, StatusCode::OK))
    }

    async fn create(&self, title: String) -> (Duration, bool) {
        let payload = CreatePostRequest {
            title: Some(title),
            body: Some(POST_BODY.to_string()),
        };
        let started = Instant::now();
        let result = self
            .client
            .post(self.posts_url.clone())
            .json(&payload)
            .send()
            .await;
        (started.elapsed(), status_is(result, StatusCode::CREATED))
    }
}

fn status_is(result: Result<reqwest::Response, reqwest::Error>, expected: StatusCode) -> bool {
    matches!(result, Ok(response) if response.status() == expected)
}

/// One ramping scenario: a profile of active users and the journey each runs.
pub struct ScenarioRun {
    pub scenario: Scenario,
    pub profile: Arc<RampProfile>,
}

/// Run every scenario to completion, recording each request.
pub async fn run_all(
    runs: Vec<ScenarioRun>,
    target: Arc<PostsTarget>,
    recorder: Arc<Recorder>,
) {
    let started = Instant::now();
    let mut users = JoinSet::new();

    for run in runs {
        for vu in 0..run.profile.peak() {
            users.spawn(virtual_user(
                vu,
                run.scenario,
                Arc::clone(&run.profile),
                Arc::clone(&target),
                Arc::clone(&recorder),
                started,
            ));
        }
    }

    while users.join_next().await.is_some() {}
}

/// User `vu` is active while the profile wants more than `vu` users.
/// An iteration in progress always completes.
async fn virtual_user(
    vu: usize,
    scenario: Scenario,
    profile: Arc<RampProfile>,
    target: Arc<PostsTarget>,
    recorder: Arc<Recorder>,
    started: Instant,
) {
    let mut rng = StdRng::from_entropy();
    let total = profile.total();
    let mut iteration = 0u64;

    loop {
        let elapsed = started.elapsed();
        if elapsed >= total {
            break;
        }
        if vu >= profile.target_at(elapsed) {
            sleep(IDLE_POLL).await;
            continue;
        }

        match scenario {
            Scenario::Readers => {
                let (latency, ok) = target.list().await;
                recorder.record(Sample {
                    scenario,
                    endpoint: Endpoint::ListPosts,
                    latency,
                    ok,
                });
                pause(&mut rng, READER_THINK_SECS).await;
            }
            Scenario::Creators => {
                let (latency, ok) = target.list().await;
                recorder.record(Sample {
                    scenario,
                    endpoint: Endpoint::ListPosts,
                    latency,
                    ok,
                });
                pause(&mut rng, CREATOR_COMPOSE_SECS).await;

                let title = format!("loadgen post by VU={}, iter={iteration}", vu + 1);
                let (latency, ok) = target.create(title).await;
                recorder.record(Sample {
                    scenario,
                    endpoint: Endpoint::CreatePost,
                    latency,
                    ok,
                });
                pause(&mut rng, CREATOR_REST_SECS).await;
            }
        }

        iteration += 1;
    }
}

async fn pause(rng: &mut StdRng, seconds: Range<f64>) {
    sleep(Duration::from_secs_f64(rng.gen_range(seconds))).await;
}
