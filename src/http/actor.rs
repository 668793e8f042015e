use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use thiserror::Error;

use super::{Error, Jwt};
use crate::types::id::{marker::UserMarker, Id};
use crate::{types, App};

/// Name of the cookie browsers carry the access token in.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Whoever performs the request.
///
/// A request without any token is anonymous; a request with an invalid
/// or expired token is rejected before it reaches the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(Id<UserMarker>),
}

#[derive(Debug, Error)]
#[error("Attempt to access user-only route")]
struct AnonymousActor;

impl Actor {
    pub fn user_id(&self) -> Result<Id<UserMarker>, Error> {
        match self {
            Self::User(id) => Ok(*id),
            Self::Anonymous => Err(Error::from_context(
                types::Error::Unauthorized,
                AnonymousActor,
            )),
        }
    }

    fn from_http_request(req: &HttpRequest) -> Result<Self, Error> {
        let Some(token) = access_token(req) else {
            return Ok(Self::Anonymous);
        };

        let Some(app) = req.app_data::<web::Data<App>>() else {
            #[derive(Debug, Error)]
            #[error("The web app has no available configuration")]
            struct NoConfig;
            return Err(Error::from_context(types::Error::Internal, NoConfig));
        };

        let jwt = Jwt::decode(&token, app.config.auth.jwt_secret.as_str())
            .map_err(|e| Error::from_report(types::Error::Unauthorized, e))?;

        Ok(Self::User(jwt.user_id))
    }
}

fn access_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    req.cookie(ACCESS_TOKEN_COOKIE)
        .map(|v| v.value().to_string())
        .filter(|v| !v.is_empty())
}

impl FromRequest for Actor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}
