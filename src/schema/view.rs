use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::types::id::{marker::BlogMarker, Id};

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct BlogViews {
    pub blog_id: Id<BlogMarker>,
    pub view_count: i64,
    pub updated_at: NaiveDateTime,
}
