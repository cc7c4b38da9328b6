use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{CreateTaskRequest, Task, TaskPriority, TaskStatus, UpdateTaskRequest};
use std::str::FromStr;

const TASK_COLUMNS: &str = "id, title, description, lead_id, assigned_to, created_by, status, priority,
     due_date, created_at, updated_at";

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(6)?;
    let priority: String = row.get(7)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        lead_id: row.get(3)?,
        assigned_to: row.get(4)?,
        created_by: row.get(5)?,
        status: TaskStatus::from_str(&status).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, e.into())
        })?,
        priority: TaskPriority::from_str(&priority).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, e.into())
        })?,
        due_date: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub async fn insert_task(
    conn: AsyncDbConnection,
    request: &CreateTaskRequest,
    created_by: i64,
) -> Result<Task> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let task = conn.query_row(
        &format!(
            "INSERT INTO tasks
             (title, description, lead_id, assigned_to, created_by, status, priority, due_date,
              created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {TASK_COLUMNS}"
        ),
        params![
            request.title.trim(),
            request.description.as_ref(),
            request.lead_id,
            request.assigned_to,
            created_by,
            TaskStatus::Todo.as_str(),
            request.priority.as_str(),
            request.due_date.as_ref(),
            now,
            now
        ],
        task_from_row,
    )?;

    Ok(task)
}

pub async fn get_task(conn: AsyncDbConnection, id: i64) -> Result<Option<Task>> {
    let conn = conn.lock().await?;

    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND deleted = 0"),
            [id],
            task_from_row,
        )
        .optional()?;

    Ok(task)
}

/// Lists tasks, newest first. With `visible_to` set, only tasks assigned to
/// or created by that user are returned.
pub async fn list_tasks(
    conn: AsyncDbConnection,
    visible_to: Option<i64>,
    limit: u32,
    offset: u64,
) -> Result<(Vec<Task>, u64)> {
    let conn = conn.lock().await?;

    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks
         WHERE deleted = 0 AND (?1 IS NULL OR assigned_to = ?1 OR created_by = ?1)",
        params![visible_to],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE deleted = 0 AND (?1 IS NULL OR assigned_to = ?1 OR created_by = ?1)
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3"
    ))?;

    let tasks = stmt
        .query_map(params![visible_to, limit, offset as i64], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((tasks, total as u64))
}

pub async fn update_task(conn: AsyncDbConnection, request: &UpdateTaskRequest) -> Result<Option<Task>> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let task = conn
        .query_row(
            &format!(
                "UPDATE tasks SET
                    title = COALESCE(?1, title),
                    description = COALESCE(?2, description),
                    assigned_to = COALESCE(?3, assigned_to),
                    status = COALESCE(?4, status),
                    priority = COALESCE(?5, priority),
                    due_date = COALESCE(?6, due_date),
                    updated_at = ?7
                 WHERE id = ?8 AND deleted = 0
                 RETURNING {TASK_COLUMNS}"
            ),
            params![
                request.title.as_ref().map(|t| t.trim()),
                request.description.as_ref(),
                request.assigned_to,
                request.status.map(|s| s.as_str()),
                request.priority.map(|p| p.as_str()),
                request.due_date.as_ref(),
                now,
                request.id
            ],
            task_from_row,
        )
        .optional()?;

    Ok(task)
}

pub async fn delete_task(conn: AsyncDbConnection, id: i64) -> Result<bool> {
    let conn = conn.lock().await?;
    let now = chrono::Utc::now().timestamp();

    let updated = conn.execute(
        "UPDATE tasks SET deleted = 1, updated_at = ?1 WHERE id = ?2 AND deleted = 0",
        params![now, id],
    )?;

    Ok(updated > 0)
}
