use async_trait::async_trait;

use postcache_api_types::Post;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError};
use crate::infra::db::map_sqlx_error;

use super::PostgresRepositories;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError> {
        let CreatePostParams { title, body } = params;

        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, body)
            VALUES ($1, $2)
            RETURNING id, title, body, created_at
            "#,
        )
        .bind(title)
        .bind(body)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
