use actix_web::{web, HttpResponse};
use shared_types::{
    CreateUserRequest, DeleteRequest, ListQuery, Paginated, UpdateUserRequest, UserRole,
};
use std::str::FromStr;
use std::sync::Arc;

use super::ok;
use crate::database::{branches, users as db_users, Database};
use crate::error::{ApiError, ApiResult};
use crate::helpers::auth::AuthenticatedUser;

const MIN_PASSWORD_CHARS: usize = 6;

fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}

async fn check_branch(db: &Database, branch_id: Option<i64>) -> ApiResult<()> {
    if let Some(id) = branch_id {
        branches::get_branch(db.async_connection.clone(), id)
            .await?
            .ok_or(ApiError::NotFound("Branch"))?;
    }
    Ok(())
}

/// Admins list everyone; sales managers list users to pick assignees from.
pub async fn get_all(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    if !matches!(auth.role(), UserRole::Admin | UserRole::SalesManager) {
        return Err(ApiError::Forbidden(
            "Only administrators and sales managers can list users".to_string(),
        ));
    }

    let role = query
        .role
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(UserRole::from_str)
        .transpose()
        .map_err(ApiError::Validation)?;

    let (users, total) = db_users::list_users(
        db.async_connection.clone(),
        role,
        query.limit(),
        query.offset(),
    )
    .await?;

    Ok(ok(
        "Users fetched",
        Paginated::new(users, total, query.page(), query.limit()),
    ))
}

pub async fn create_user(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let req = request.into_inner();

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    check_password(&req.password)?;
    check_branch(&db, req.branch_id).await?;

    if db_users::email_exists(db.async_connection.clone(), &req.email).await? {
        return Err(ApiError::Validation(
            "A user with this email already exists".to_string(),
        ));
    }

    let user = db_users::insert_user(db.async_connection.clone(), &req).await?;
    tracing::info!("User {} created {} {}", auth.id(), user.role.as_str(), user.id);
    Ok(ok("User created", user))
}

pub async fn update_user(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<UpdateUserRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let req = request.into_inner();

    if let Some(password) = &req.password {
        check_password(password)?;
    }
    check_branch(&db, req.branch_id).await?;

    let user = db_users::update_user(db.async_connection.clone(), &req)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    tracing::info!("User {} updated user {}", auth.id(), user.id);
    Ok(ok("User updated", user))
}

pub async fn delete_user(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<DeleteRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;

    if request.id == auth.id() {
        return Err(ApiError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !db_users::delete_user(db.async_connection.clone(), request.id).await? {
        return Err(ApiError::NotFound("User"));
    }

    tracing::info!("User {} deleted user {}", auth.id(), request.id);
    Ok(ok("User deleted", ()))
}
