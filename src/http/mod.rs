use actix_web::web;
use thiserror::Error as ThisError;

use crate::types;

pub mod actor;
pub mod controllers;
pub mod error;
pub mod jwt;

pub use actor::Actor;
pub use error::Error;
pub use jwt::Jwt;

#[derive(Debug, ThisError)]
#[error("Malformed request body: {0}")]
struct MalformedBody(String);

/// Registers every route with the extractor settings they rely on.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(|error, _req| {
        let message = error.to_string();
        Error::from_context(types::Error::InvalidRequest, MalformedBody(message)).into()
    });

    cfg.app_data(json)
        .configure(controllers::configure)
        .default_service(web::to(controllers::not_found));
}
