use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{Branch, CreateBranchRequest, UpdateBranchRequest};

const BRANCH_COLUMNS: &str = "id, name, location, phone, manager_id, created_at, updated_at";

fn branch_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        phone: row.get(3)?,
        manager_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub async fn insert_branch(conn: AsyncDbConnection, request: &CreateBranchRequest) -> Result<Branch> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let branch = conn.query_row(
        &format!(
            "INSERT INTO branches (name, location, phone, manager_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {BRANCH_COLUMNS}"
        ),
        params![
            request.name.trim(),
            request.location.as_ref(),
            request.phone.as_ref(),
            request.manager_id,
            now,
            now
        ],
        branch_from_row,
    )?;

    Ok(branch)
}

pub async fn get_branch(conn: AsyncDbConnection, id: i64) -> Result<Option<Branch>> {
    let conn = conn.lock().await?;

    let branch = conn
        .query_row(
            &format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE id = ? AND deleted = 0"),
            [id],
            branch_from_row,
        )
        .optional()?;

    Ok(branch)
}

pub async fn list_branches(conn: AsyncDbConnection, limit: u32, offset: u64) -> Result<(Vec<Branch>, u64)> {
    let conn = conn.lock().await?;

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM branches WHERE deleted = 0",
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {BRANCH_COLUMNS} FROM branches
         WHERE deleted = 0
         ORDER BY name ASC, id ASC
         LIMIT ?1 OFFSET ?2"
    ))?;

    let branches = stmt
        .query_map(params![limit, offset as i64], branch_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((branches, total as u64))
}

pub async fn update_branch(conn: AsyncDbConnection, request: &UpdateBranchRequest) -> Result<Option<Branch>> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let branch = conn
        .query_row(
            &format!(
                "UPDATE branches SET
                    name = COALESCE(?1, name),
                    location = COALESCE(?2, location),
                    phone = COALESCE(?3, phone),
                    manager_id = COALESCE(?4, manager_id),
                    updated_at = ?5
                 WHERE id = ?6 AND deleted = 0
                 RETURNING {BRANCH_COLUMNS}"
            ),
            params![
                request.name.as_ref().map(|n| n.trim()),
                request.location.as_ref(),
                request.phone.as_ref(),
                request.manager_id,
                now,
                request.id
            ],
            branch_from_row,
        )
        .optional()?;

    Ok(branch)
}

pub async fn delete_branch(conn: AsyncDbConnection, id: i64) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let updated = conn.execute(
        "UPDATE branches SET deleted = 1, updated_at = ?1 WHERE id = ?2 AND deleted = 0",
        params![now, id],
    )?;

    Ok(updated > 0)
}
