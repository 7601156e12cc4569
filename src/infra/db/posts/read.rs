use async_trait::async_trait;

use postcache_api_types::{Post, PostListItem, PostSummary};

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::posts::ListProjection;
use crate::infra::db::map_sqlx_error;

use super::PostgresRepositories;

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        projection: ListProjection,
    ) -> Result<Vec<PostListItem>, RepoError> {
        match projection {
            ListProjection::Summary => {
                let rows = sqlx::query_as::<_, PostSummary>(
                    "SELECT id, title FROM posts ORDER BY created_at DESC, id DESC",
                )
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;

                Ok(rows.into_iter().map(PostListItem::Summary).collect())
            }
            ListProjection::Full => {
                let rows = sqlx::query_as::<_, Post>(
                    "SELECT id, title, body, created_at FROM posts \
                     ORDER BY created_at DESC, id DESC",
                )
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;

                Ok(rows.into_iter().map(PostListItem::Full).collect())
            }
        }
    }
}
