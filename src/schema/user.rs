use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::id::{marker::UserMarker, Id};

/// Public projection of a user, carrying only the display fields
/// other users are allowed to see.
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserSummary {
    pub id: Id<UserMarker>,
    pub name: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}
