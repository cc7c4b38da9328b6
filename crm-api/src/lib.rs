pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod helpers;

use actix_web::web;
use std::sync::Arc;

pub use database::Database;

/// Registers shared state, extractor error handlers and every route. Used by
/// the server binary and by handler tests.
pub fn configure_app(db: Arc<Database>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(db))
            .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
            .configure(handlers::configure_routes);
    }
}
