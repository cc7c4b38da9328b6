use actix_web::{web, HttpResponse};
use shared_types::{LoginRequest, LoginResponse};
use std::sync::Arc;

use super::ok;
use crate::database::{sessions, users, Database};
use crate::error::{ApiError, ApiResult};
use crate::helpers::auth::{verify_password, AuthenticatedUser};

const BAD_CREDENTIALS: &str = "Invalid email or password";

pub async fn login(
    db: web::Data<Arc<Database>>,
    request: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let req = request.into_inner();

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let Some((user, salt, hash)) =
        users::find_credentials(db.async_connection.clone(), &req.email).await?
    else {
        tracing::warn!("Login attempt for unknown email");
        return Err(ApiError::Validation(BAD_CREDENTIALS.to_string()));
    };

    if !verify_password(&salt, &req.password, &hash) {
        tracing::warn!("Wrong password for user {}", user.id);
        return Err(ApiError::Validation(BAD_CREDENTIALS.to_string()));
    }

    let now = chrono::Utc::now().timestamp();
    let (token, expires_at) = sessions::create_session(db.async_connection.clone(), user.id, now).await?;

    tracing::info!("User {} logged in as {}", user.id, user.role.as_str());

    Ok(ok(
        "Logged in",
        LoginResponse {
            token,
            expires_at,
            user,
        },
    ))
}

pub async fn logout(
    db: web::Data<Arc<Database>>,
    auth: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let now = chrono::Utc::now().timestamp();
    sessions::revoke_session(db.async_connection.clone(), &auth.token, now).await?;

    tracing::info!("User {} logged out", auth.id());
    Ok(ok("Logged out", ()))
}

pub async fn me(auth: AuthenticatedUser) -> ApiResult<HttpResponse> {
    Ok(ok("Current user", auth.user))
}
