use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::Level;
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 64;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Adopt the caller's `x-request-id` when it is short printable ASCII,
/// otherwise mint a UUID. The id is echoed on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext { request_id };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response.extensions_mut().insert(ctx);
    response
}

struct FailedResponse {
    status: StatusCode,
    method: String,
    path: String,
    elapsed_ms: u128,
    request_id: String,
    source: &'static str,
    chain: Vec<String>,
}

macro_rules! failed_response_event {
    ($level:expr, $failed:expr, $message:literal) => {
        tracing::event!(
            target: "postcache::http::response",
            $level,
            status = $failed.status.as_u16(),
            method = %$failed.method,
            path = %$failed.path,
            elapsed_ms = $failed.elapsed_ms,
            request_id = %$failed.request_id,
            source = $failed.source,
            detail = $failed.chain.first().map(String::as_str).unwrap_or("no diagnostic available"),
            chain = ?$failed.chain,
            $message
        )
    };
}

impl FailedResponse {
    fn emit(&self) {
        if self.status.is_server_error() {
            failed_response_event!(Level::ERROR, self, "request failed");
        } else {
            failed_response_event!(Level::WARN, self, "client request error");
        }
    }
}

/// Log 4xx at `warn` and 5xx at `error`, together with the attached [`ErrorReport`].
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (source, chain) = response
        .extensions_mut()
        .remove::<ErrorReport>()
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unknown", Vec::new()));

    FailedResponse {
        status,
        method,
        path,
        elapsed_ms: start.elapsed().as_millis(),
        request_id,
        source,
        chain,
    }
    .emit();

    response
}
