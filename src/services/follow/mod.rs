mod list;
mod stats;
mod status;
mod toggle;
mod unfollow;

pub use self::list::{ListFollowers, ListFollowing};
pub use self::stats::{FollowStats, GetFollowStats};
pub use self::status::CheckFollowStatus;
pub use self::toggle::{ToggleFollow, ToggleFollowResponse};
pub use self::unfollow::UnfollowUser;
