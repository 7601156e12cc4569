//! `/posts` handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use postcache_api_types::{CreatePostRequest, Post, PostListItem};

use crate::application::error::HttpError;

use super::{HttpState, service_error_to_http};

pub(super) async fn list_posts(
    State(state): State<HttpState>,
) -> Result<Json<Vec<PostListItem>>, HttpError> {
    state
        .posts
        .get_posts()
        .await
        .map(Json)
        .map_err(|err| service_error_to_http("infra::http::posts::list_posts", err))
}

pub(super) async fn create_post(
    State(state): State<HttpState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), HttpError> {
    let Json(CreatePostRequest { title, body }) = payload.map_err(rejection_to_http)?;

    let post = state
        .posts
        .create_post(title, body)
        .await
        .map_err(|err| service_error_to_http("infra::http::posts::create_post", err))?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Body rejections keep axum's status but answer with the usual error body.
fn rejection_to_http(rejection: JsonRejection) -> HttpError {
    HttpError::from_error(
        "infra::http::posts::create_post",
        rejection.status(),
        rejection.body_text(),
        &rejection,
    )
}
