use actix_web::{web, HttpResponse};
use serde_json::json;

use super::parse_path_id;
use crate::http::{Actor, Error};
use crate::services::follow::{
    CheckFollowStatus, GetFollowStats, ListFollowers, ListFollowing, ToggleFollow, UnfollowUser,
};
use crate::types::id::{marker::UserMarker, Id};
use crate::App;

const USER_NOT_FOUND: &str = "User not found.";

fn user_id(path: &str) -> Result<Id<UserMarker>, Error> {
    parse_path_id(path, USER_NOT_FOUND)
}

#[tracing::instrument(skip(app))]
pub async fn toggle(
    app: web::Data<App>,
    path: web::Path<String>,
    actor: Actor,
) -> Result<HttpResponse, Error> {
    // anonymous callers learn nothing about the target id
    actor.user_id()?;
    let target = user_id(&path)?;
    let response = ToggleFollow { target }.perform(&app, &actor).await?;

    Ok(if response.following {
        HttpResponse::Created().json(json!({
            "success": true,
            "following": true,
            "message": "Successfully followed user.",
        }))
    } else {
        HttpResponse::Ok().json(json!({
            "success": true,
            "following": false,
            "message": "Unfollowed user.",
        }))
    })
}

#[tracing::instrument(skip(app))]
pub async fn unfollow(
    app: web::Data<App>,
    path: web::Path<String>,
    actor: Actor,
) -> Result<HttpResponse, Error> {
    actor.user_id()?;
    let target = user_id(&path)?;
    UnfollowUser { target }.perform(&app, &actor).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Successfully unfollowed user.",
    })))
}

#[tracing::instrument(skip(app))]
pub async fn followers(
    app: web::Data<App>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user = user_id(&path)?;
    let followers = ListFollowers { user }.perform(&app).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": followers.len(),
        "followers": followers,
    })))
}

#[tracing::instrument(skip(app))]
pub async fn following(
    app: web::Data<App>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user = user_id(&path)?;
    let following = ListFollowing { user }.perform(&app).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": following.len(),
        "following": following,
    })))
}

#[tracing::instrument(skip(app))]
pub async fn status(
    app: web::Data<App>,
    path: web::Path<String>,
    actor: Actor,
) -> Result<HttpResponse, Error> {
    actor.user_id()?;
    let target = user_id(&path)?;
    let is_following = CheckFollowStatus { target }.perform(&app, &actor).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "isFollowing": is_following,
    })))
}

#[tracing::instrument(skip(app))]
pub async fn stats(app: web::Data<App>, path: web::Path<String>) -> Result<HttpResponse, Error> {
    let user = user_id(&path)?;
    let stats = GetFollowStats { user }.perform(&app).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "followersCount": stats.followers_count,
        "followingCount": stats.following_count,
    })))
}
