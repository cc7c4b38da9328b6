use actix_web::{web, HttpResponse};
use shared_types::{CreateBranchRequest, DeleteRequest, ListQuery, Paginated, UpdateBranchRequest};
use std::sync::Arc;

use super::ok;
use crate::database::{branches as db_branches, Database};
use crate::error::{ApiError, ApiResult};
use crate::helpers::auth::AuthenticatedUser;

pub async fn get_all(
    db: web::Data<Arc<Database>>,
    _auth: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let (branches, total) =
        db_branches::list_branches(db.async_connection.clone(), query.limit(), query.offset())
            .await?;

    Ok(ok(
        "Branches fetched",
        Paginated::new(branches, total, query.page(), query.limit()),
    ))
}

pub async fn create_branch(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<CreateBranchRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let req = request.into_inner();

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Branch name is required".to_string()));
    }

    let branch = db_branches::insert_branch(db.async_connection.clone(), &req).await?;
    tracing::info!("User {} created branch {}", auth.id(), branch.id);
    Ok(ok("Branch created", branch))
}

pub async fn update_branch(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<UpdateBranchRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let req = request.into_inner();

    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::Validation("Branch name cannot be empty".to_string()));
    }

    let branch = db_branches::update_branch(db.async_connection.clone(), &req)
        .await?
        .ok_or(ApiError::NotFound("Branch"))?;

    tracing::info!("User {} updated branch {}", auth.id(), branch.id);
    Ok(ok("Branch updated", branch))
}

pub async fn delete_branch(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
    request: web::Json<DeleteRequest>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;

    if !db_branches::delete_branch(db.async_connection.clone(), request.id).await? {
        return Err(ApiError::NotFound("Branch"));
    }

    tracing::info!("User {} deleted branch {}", auth.id(), request.id);
    Ok(ok("Branch deleted", ()))
}
