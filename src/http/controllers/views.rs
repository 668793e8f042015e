use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::parse_path_id;
use crate::http::{Actor, Error};
use crate::services::views::{AddView, GetViewCount};
use crate::types::id::{marker::BlogMarker, Id};
use crate::App;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddViewBody {
    pub blog_id: Id<BlogMarker>,
}

#[tracing::instrument(skip(app))]
pub async fn add_view(
    app: web::Data<App>,
    actor: Actor,
    body: web::Json<AddViewBody>,
) -> Result<HttpResponse, Error> {
    let blog_id = body.into_inner().blog_id;
    let view_count = AddView { blog_id }.perform(&app, &actor).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "viewCount": view_count,
    })))
}

#[tracing::instrument(skip(app))]
pub async fn view_count(
    app: web::Data<App>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let blog_id = parse_path_id(&path, "Blog not found.")?;
    let view_count = GetViewCount { blog_id }.perform(&app).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "viewCount": view_count,
    })))
}
