use log::trace;
use sqlx::SqliteConnection;

use crate::{db::sqlite::SqliteDatabaseError, db_types::User};

/// Inserts the user if they are new. For existing users, a non-empty `handle` that differs from the stored one
/// replaces it; an absent handle never erases one.
pub async fn upsert_user(
    user_id: i64,
    handle: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let handle = handle.map(str::trim).filter(|h| !h.is_empty());
    let result = sqlx::query(
        r#"
            INSERT INTO users (user_id, username) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                updated_at = CURRENT_TIMESTAMP
            WHERE excluded.username IS NOT NULL AND excluded.username IS NOT users.username;
        "#,
    )
    .bind(user_id)
    .bind(handle)
    .execute(conn)
    .await?;
    trace!("🗃️ Upsert of user #{user_id} touched {} rows", result.rows_affected());
    Ok(())
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, SqliteDatabaseError> {
    let user = sqlx::query_as::<_, User>(
        r#"
            SELECT user_id, username, created_at, updated_at
            FROM users
            WHERE user_id = ?;
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}
