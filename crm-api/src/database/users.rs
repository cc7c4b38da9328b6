use crate::database::AsyncDbConnection;
use crate::helpers::auth::{generate_salt, hash_password};
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{CreateUserRequest, UpdateUserRequest, User, UserRole};
use std::str::FromStr;

const USER_COLUMNS: &str =
    "id, name, email, phone, role, branch_id, created_at, updated_at";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    let role = UserRole::from_str(&role).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
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
}

pub async fn insert_user(conn: AsyncDbConnection, request: &CreateUserRequest) -> Result<User> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();
    let email = request.email.trim().to_lowercase();

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM users WHERE email = ? LIMIT 1",
            [&email],
            |row| row.get(0),
        )
        .optional()?;

    if existing.is_some() {
        return Err(anyhow::anyhow!("User with email {} already exists", email));
    }

    let salt = generate_salt();
    let hash = hash_password(&salt, &request.password);

    let user = conn.query_row(
        &format!(
            "INSERT INTO users
             (name, email, phone, role, branch_id, password_salt, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ),
        params![
            request.name.trim(),
            &email,
            request.phone.as_ref(),
            request.role.as_str(),
            request.branch_id,
            &salt,
            &hash,
            now,
            now
        ],
        user_from_row,
    )?;

    Ok(user)
}

pub async fn email_exists(conn: AsyncDbConnection, email: &str) -> Result<bool> {
    let conn = conn.lock().await?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?",
        [email.trim().to_lowercase()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub async fn get_user(conn: AsyncDbConnection, id: i64) -> Result<Option<User>> {
    let conn = conn.lock().await?;

    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted = 0"),
            [id],
            user_from_row,
        )
        .optional()?;

    Ok(user)
}

/// Returns the user with their password salt and hash, for login.
pub async fn find_credentials(
    conn: AsyncDbConnection,
    email: &str,
) -> Result<Option<(User, String, String)>> {
    let conn = conn.lock().await?;

    let found = conn
        .query_row(
            &format!(
                "SELECT {USER_COLUMNS}, password_salt, password_hash
                 FROM users WHERE email = ? AND deleted = 0"
            ),
            [email.trim().to_lowercase()],
            |row| Ok((user_from_row(row)?, row.get(8)?, row.get(9)?)),
        )
        .optional()?;

    Ok(found)
}

pub async fn count_users(conn: AsyncDbConnection) -> Result<i64> {
    let conn = conn.lock().await?;
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

pub async fn list_users(
    conn: AsyncDbConnection,
    role: Option<UserRole>,
    limit: u32,
    offset: u64,
) -> Result<(Vec<User>, u64)> {
    let conn = conn.lock().await?;
    let role = role.map(|r| r.as_str());

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE deleted = 0 AND (?1 IS NULL OR role = ?1)",
        params![role],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE deleted = 0 AND (?1 IS NULL OR role = ?1)
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3"
    ))?;

    let users = stmt
        .query_map(params![role, limit, offset as i64], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((users, total as u64))
}

pub async fn update_user(conn: AsyncDbConnection, request: &UpdateUserRequest) -> Result<Option<User>> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let updated = conn.execute(
        "UPDATE users SET
            name = COALESCE(?1, name),
            phone = COALESCE(?2, phone),
            role = COALESCE(?3, role),
            branch_id = COALESCE(?4, branch_id),
            updated_at = ?5
         WHERE id = ?6 AND deleted = 0",
        params![
            request.name.as_ref().map(|n| n.trim()),
            request.phone.as_ref(),
            request.role.map(|r| r.as_str()),
            request.branch_id,
            now,
            request.id
        ],
    )?;

    if updated == 0 {
        return Ok(None);
    }

    if let Some(password) = &request.password {
        let salt = generate_salt();
        let hash = hash_password(&salt, password);
        conn.execute(
            "UPDATE users SET password_salt = ?1, password_hash = ?2 WHERE id = ?3",
            params![&salt, &hash, request.id],
        )?;
    }

    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            [request.id],
            user_from_row,
        )
        .optional()?;

    Ok(user)
}

/// Soft delete. Also revokes the user's sessions.
pub async fn delete_user(conn: AsyncDbConnection, id: i64) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let updated = conn.execute(
        "UPDATE users SET deleted = 1, updated_at = ?1 WHERE id = ?2 AND deleted = 0",
        params![now, id],
    )?;

    if updated > 0 {
        conn.execute(
            "UPDATE sessions SET revoked_at = ?1 WHERE user_id = ?2 AND revoked_at IS NULL",
            params![now, id],
        )?;
    }

    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::temp_database;
    use crate::helpers::auth::verify_password;

    fn request(email: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            name: "Sara Nasser".to_string(),
            email: email.to_string(),
            password: "pass1234".to_string(),
            phone: None,
            role,
            branch_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_credentials() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        let user = insert_user(conn.clone(), &request("Sara@Example.com", UserRole::Agent))
            .await
            .unwrap();
        assert_eq!(user.email, "sara@example.com");
        assert_eq!(user.role, UserRole::Agent);

        let (found, salt, hash) = find_credentials(conn.clone(), "SARA@example.com ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert!(verify_password(&salt, "pass1234", &hash));
        assert!(hash.starts_with("pbkdf2-sha256$"));
        assert!(!hash.contains("pass1234"));

        assert!(insert_user(conn, &request("sara@example.com", UserRole::Admin))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_list_filters_role_and_hides_deleted() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();

        let agent = insert_user(conn.clone(), &request("a@example.com", UserRole::Agent))
            .await
            .unwrap();
        insert_user(conn.clone(), &request("k@example.com", UserRole::KioskMember))
            .await
            .unwrap();

        let (agents, total) = list_users(conn.clone(), Some(UserRole::Agent), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(agents[0].id, agent.id);

        assert!(delete_user(conn.clone(), agent.id).await.unwrap());
        assert!(!delete_user(conn.clone(), agent.id).await.unwrap());
        let (all, total) = list_users(conn.clone(), None, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(all.len(), 1);
        assert!(get_user(conn, agent.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_changes_only_given_fields() {
        let (_dir, db) = temp_database();
        let conn = db.async_connection.clone();
        let user = insert_user(conn.clone(), &request("m@example.com", UserRole::Agent))
            .await
            .unwrap();

        let updated = update_user(
            conn.clone(),
            &UpdateUserRequest {
                id: user.id,
                role: Some(UserRole::SalesManager),
                password: Some("newpass".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.role, UserRole::SalesManager);
        assert_eq!(updated.name, user.name);

        let (_, salt, hash) = find_credentials(conn, "m@example.com").await.unwrap().unwrap();
        assert!(verify_password(&salt, "newpass", &hash));
    }
}
