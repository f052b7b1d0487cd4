//! Application services on top of the store and the leaderboard cache

pub mod password;
pub mod score;
pub mod user;

pub use score::ScoreService;
pub use user::UserService;
