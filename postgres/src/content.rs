//! Content block persistence.

use crate::rows::ContentRow;
use crate::{PostgresStore, db_error};
use rifa_core::content::{ContentBlock, ContentKey};
use rifa_core::store::{ContentStore, StoreFuture};

impl ContentStore for PostgresStore {
    fn get(&self, key: ContentKey) -> StoreFuture<'_, Option<ContentBlock>> {
        Box::pin(async move {
            let row: Option<ContentRow> =
                sqlx::query_as("SELECT key, body, updated_at FROM content_blocks WHERE key = $1")
                    .bind(key.as_str())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;
            row.map(ContentBlock::try_from).transpose()
        })
    }

    fn put(&self, block: ContentBlock) -> StoreFuture<'_, ContentBlock> {
        Box::pin(async move {
            let row: ContentRow = sqlx::query_as(
                "INSERT INTO content_blocks (key, body, updated_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (key) DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at \
                 RETURNING key, body, updated_at",
            )
            .bind(block.key.as_str())
            .bind(&block.body)
            .bind(block.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
            row.try_into()
        })
    }
}
