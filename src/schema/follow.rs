use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::types::id::{
    marker::{FollowMarker, UserMarker},
    Id,
};

/// A directed "follows" relationship from `follower_id` to `following_id`.
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize)]
pub struct FollowEdge {
    pub id: Id<FollowMarker>,
    pub follower_id: Id<UserMarker>,
    pub following_id: Id<UserMarker>,
    pub created_at: NaiveDateTime,
}
