use actix_web::{web, HttpResponse};
use shared_types::{
    CreateTaskRequest, DeleteRequest, ListQuery, Paginated, Task, UpdateTaskRequest, UserRole,
};
use std::sync::Arc;

use super::ok;
use crate::database::{tasks as db_tasks, Database};
use crate::error::{ApiError, ApiResult};
use crate::helpers::auth::AuthenticatedUser;

fn is_admin(auth: &AuthenticatedUser) -> bool {
    auth.role() == UserRole::Admin
}

async fn own_task(db: &Database, auth: &AuthenticatedUser, id: i64) -> ApiResult<Task> {
    let task = db_tasks::get_task(db.async_connection.clone(), id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    let involved = task.created_by == Some(auth.id()) || task.assigned_to == Some(auth.id());
    if is_admin(auth) || involved {
        Ok(task)
    } else {
        Err(ApiError::NotFound("Task"))
    }
}

pub async fn get_all(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let visible_to = if is_admin(&auth) { None } else { Some(auth.id()) };

    let (tasks, total) = db_tasks::list_tasks(
        db.async_connection.clone(),
        visible_to,
        query.limit(),
        query.offset(),
    )
    .await?;

    Ok(ok(
        "Tasks fetched",
        Paginated::new(tasks, total, query.page(), query.limit()),
    ))
}

pub async fn create_task(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<CreateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let req = request.into_inner();

    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("Task title is required".to_string()));
    }
    if let Some(due) = req.due_date.as_deref() {
        shared_types::parse_api_date(due)?;
    }

    let task = db_tasks::insert_task(db.async_connection.clone(), &req, auth.id()).await?;
    tracing::info!("User {} created task {}", auth.id(), task.id);
    Ok(ok("Task created", task))
}

pub async fn update_task(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<UpdateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let req = request.into_inner();
    own_task(&db, &auth, req.id).await?;

    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::Validation("Task title cannot be empty".to_string()));
    }
    if let Some(due) = req.due_date.as_deref() {
        shared_types::parse_api_date(due)?;
    }

    let task = db_tasks::update_task(db.async_connection.clone(), &req)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    tracing::info!("User {} updated task {}", auth.id(), task.id);
    Ok(ok("Task updated", task))
}

pub async fn delete_task(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<DeleteRequest>,
) -> ApiResult<HttpResponse> {
    let task = own_task(&db, &auth, request.id).await?;

    if !is_admin(&auth) && task.created_by != Some(auth.id()) {
        return Err(ApiError::Forbidden(
            "Only the task's creator can delete it".to_string(),
        ));
    }

    if !db_tasks::delete_task(db.async_connection.clone(), task.id).await? {
        return Err(ApiError::NotFound("Task"));
    }

    tracing::info!("User {} deleted task {}", auth.id(), task.id);
    Ok(ok("Task deleted", ()))
}
