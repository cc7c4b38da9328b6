pub mod auth;
pub mod branches;
pub mod health;
pub mod leads;
pub mod tasks;
pub mod users;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use shared_types::ApiResponse;

/// Base path of every JSON endpoint except `/health`.
pub const API_SCOPE: &str = "/api";

pub(crate) fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(message, data))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health)).service(
        web::scope(API_SCOPE)
            .route("/auth/login/en", web::post().to(auth::login))
            .route("/auth/logout/en", web::post().to(auth::logout))
            .route("/auth/me/en", web::get().to(auth::me))
            .route("/lead/getAll/en", web::get().to(leads::get_all))
            .route("/lead/branch/en", web::get().to(leads::branch_leads))
            .route("/sales/en", web::get().to(leads::sales_leads))
            .route("/lead/create/en", web::post().to(leads::create_lead))
            .route("/lead/update/en", web::patch().to(leads::update_lead))
            .route("/lead/updateStatus/en", web::patch().to(leads::update_status))
            .route("/lead/assignToAgent/en", web::patch().to(leads::assign_to_agent))
            .route("/lead/delete/en", web::patch().to(leads::delete_lead))
            .route("/lead/history/en", web::get().to(leads::history))
            .route("/branch/getAll/en", web::get().to(branches::get_all))
            .route("/branch/create/en", web::post().to(branches::create_branch))
            .route("/branch/update/en", web::patch().to(branches::update_branch))
            .route("/branch/delete/en", web::patch().to(branches::delete_branch))
            .route("/user/getAll/en", web::get().to(users::get_all))
            .route("/user/create/en", web::post().to(users::create_user))
            .route("/user/update/en", web::patch().to(users::update_user))
            .route("/user/delete/en", web::patch().to(users::delete_user))
            .route("/task/getAll/en", web::get().to(tasks::get_all))
            .route("/task/create/en", web::post().to(tasks::create_task))
            .route("/task/update/en", web::patch().to(tasks::update_task))
            .route("/task/delete/en", web::patch().to(tasks::delete_task)),
    );
}
