mod middleware;
mod posts;
mod state;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::{ErrorReport, HttpError, INTERNAL_SERVER_ERROR};
use crate::application::posts::PostServiceError;
use crate::application::repos::RepoError;

use middleware::{log_responses, set_request_context};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/_health/db", get(db_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.health_check().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Map a post service failure to the public `{"error": ..}` contract.
///
/// Store failures never leak their detail to the client; it travels in the
/// attached [`ErrorReport`] instead.
pub fn service_error_to_http(source: &'static str, err: PostServiceError) -> HttpError {
    match err {
        PostServiceError::Validation(err) => HttpError::new(
            source,
            StatusCode::BAD_REQUEST,
            err.public_message(),
            err.to_string(),
        ),
        PostServiceError::StoreUnavailable(_) | PostServiceError::Interrupted(_) => {
            HttpError::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_SERVER_ERROR,
                &err,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = PostServiceError::Validation(DomainError::validation("Title is required"));
        let http = service_error_to_http("test", err);
        assert_eq!(http.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failure_maps_to_internal_error() {
        let err = PostServiceError::StoreUnavailable(RepoError::Unavailable("down".into()));
        let http = service_error_to_http("test", err);
        assert_eq!(http.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn failed_health_check_attaches_report() {
        let response = db_health_response(Err(RepoError::Timeout));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }
}
