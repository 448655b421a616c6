//! User account persistence.

use crate::rows::{USER_COLUMNS, UserRow, convert_all};
use crate::{PostgresStore, db_error};
use rifa_core::store::{StoreFuture, UserStore};
use rifa_core::{StoreError, User, UserId};

impl UserStore for PostgresStore {
    fn insert(&self, user: User) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let row: UserRow = sqlx::query_as(&format!(
                "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING {USER_COLUMNS}"
            ))
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.active)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
            row.try_into()
        })
    }

    fn get(&self, id: UserId) -> StoreFuture<'_, Option<User>> {
        Box::pin(async move {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;
            row.map(User::try_from).transpose()
        })
    }

    fn find_by_username<'a>(&'a self, username: &'a str) -> StoreFuture<'a, Option<User>> {
        Box::pin(async move {
            let row: Option<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error)?;
            row.map(User::try_from).transpose()
        })
    }

    fn list(&self) -> StoreFuture<'_, Vec<User>> {
        Box::pin(async move {
            let rows: Vec<UserRow> =
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
                    .fetch_all(&self.pool)
                    .await
                    .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn update(&self, user: User) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let row: Option<UserRow> = sqlx::query_as(&format!(
                "UPDATE users SET username = $2, password_hash = $3, role = $4, active = $5, updated_at = $6 \
                 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.active)
            .bind(user.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
            row.ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))?
                .try_into()
        })
    }

    fn delete(&self, id: UserId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
