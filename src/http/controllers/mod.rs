use actix_web::{web, HttpRequest, HttpResponse};
use std::str::FromStr;

use crate::http::Error;
use crate::types::{
    self,
    id::{marker::Marker, Id, ParseIdError},
};

pub mod follow;
pub mod views;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/follow")
            .route("/followers/{user_id}", web::get().to(follow::followers))
            .route("/following/{user_id}", web::get().to(follow::following))
            .route("/status/{user_id}", web::get().to(follow::status))
            .route("/stats/{user_id}", web::get().to(follow::stats))
            .service(
                web::resource("/{user_id}")
                    .route(web::post().to(follow::toggle))
                    .route(web::delete().to(follow::unfollow)),
            ),
    )
    .service(
        web::scope("/view")
            .route("/add-view", web::post().to(views::add_view))
            .route("/{blog_id}", web::get().to(views::view_count)),
    );
}

/// Ids that cannot be parsed can never point to an existing resource.
fn parse_path_id<M: Marker>(raw: &str, not_found: &'static str) -> Result<Id<M>, Error> {
    Id::<M>::from_str(raw).map_err(|e: ParseIdError| {
        Error::from_context(types::Error::NotFound, e).message(not_found)
    })
}

#[tracing::instrument(skip_all)]
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, Error> {
    tracing::debug!(path = %req.path(), "no route matched");
    Err(Error::new(types::Error::NotFound))
}
