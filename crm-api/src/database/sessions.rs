use crate::database::AsyncDbConnection;
use crate::helpers::auth::{generate_token, hash_token, SESSION_TTL_SECS};
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{User, UserRole};
use std::str::FromStr;

/// Issues a new session for the user. Returns the raw token (shown to the
/// client once) and its expiry.
pub async fn create_session(conn: AsyncDbConnection, user_id: i64, now: i64) -> Result<(String, i64)> {
    let conn = conn.lock().await?;
    let token = generate_token();
    let expires_at = now + SESSION_TTL_SECS;

    conn.execute(
        "INSERT INTO sessions (user_id, token_hash, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, hash_token(&token), now, expires_at],
    )?;

    Ok((token, expires_at))
}

/// Resolves a live session to its user. Unknown, revoked and expired tokens
/// all yield `None`.
pub async fn load_user_from_session(
    conn: AsyncDbConnection,
    token: &str,
    now: i64,
) -> Result<Option<User>> {
    let conn = conn.lock().await?;

    let user = conn
        .query_row(
            "SELECT u.id, u.name, u.email, u.phone, u.role, u.branch_id, u.created_at, u.updated_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = ?1
               AND s.revoked_at IS NULL
               AND s.expires_at > ?2
               AND u.deleted = 0",
            params![hash_token(token), now],
            |row| {
                let role: String = row.get(4)?;
                let role = UserRole::from_str(&role).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?;
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    phone: row.get(3)?,
                    role,
                    branch_id: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            },
        )
        .optional()?;

    Ok(user)
}

pub async fn revoke_session(conn: AsyncDbConnection, token: &str, now: i64) -> Result<bool> {
    let conn = conn.lock().await?;

    let updated = conn.execute(
        "UPDATE sessions SET revoked_at = ?1 WHERE token_hash = ?2 AND revoked_at IS NULL",
        params![now, hash_token(token)],
    )?;

    Ok(updated > 0)
}

/// Drops sessions that expired before `now`.
pub async fn purge_expired(conn: AsyncDbConnection, now: i64) -> Result<usize> {
    let conn = conn.lock().await?;
    let removed = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])?;
    Ok(removed)
}
