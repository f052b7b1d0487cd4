//! Data models for tinca

pub mod leaderboard;
pub mod score;
pub mod user;

pub use leaderboard::{LeaderboardEntry, Level, TopScores, UNKNOWN_USERNAME};
pub use score::{NewScore, Score, UploadScore, UserScores};
pub use user::{LoginRequest, NewUser, User, UserInfo};
