mod follow;
mod user;
mod view;

pub use follow::FollowEdge;
pub use user::UserSummary;
pub use view::BlogViews;
