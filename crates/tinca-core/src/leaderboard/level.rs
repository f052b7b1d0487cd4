//! Score to level mapping
//!
//! Levels come from a fixed threshold table. Lookups go through a dense
//! table indexed by score so ranking 100 entries costs 100 array reads.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Player level derived from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Grandmaster,
    Master,
    Legend,
}

/// Minimum score per level, highest first
const THRESHOLDS: [(i64, Level); 8] = [
    (2300, Level::Legend),
    (2100, Level::Master),
    (1900, Level::Grandmaster),
    (1700, Level::Diamond),
    (1500, Level::Platinum),
    (1000, Level::Gold),
    (500, Level::Silver),
    (300, Level::Bronze),
];

/// Length of the dense table; every score at or past it is a Legend
pub const LEVEL_TABLE_LEN: usize = 2300;

static LEVEL_TABLE: Lazy<Vec<Level>> = Lazy::new(|| {
    (0..LEVEL_TABLE_LEN as i64)
        .map(Level::by_threshold)
        .collect()
});

impl Level {
    /// O(1) level lookup
    pub fn for_score(score: i64) -> Level {
        if score < 0 {
            return Level::Bronze;
        }
        usize::try_from(score)
            .ok()
            .and_then(|index| LEVEL_TABLE.get(index).copied())
            .unwrap_or(Level::Legend)
    }

    /// Linear scan of the thresholds, used to build the dense table
    fn by_threshold(score: i64) -> Level {
        THRESHOLDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, level)| *level)
            .unwrap_or(Level::Bronze)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Bronze => "Bronze",
            Level::Silver => "Silver",
            Level::Gold => "Gold",
            Level::Platinum => "Platinum",
            Level::Diamond => "Diamond",
            Level::Grandmaster => "Grandmaster",
            Level::Master => "Master",
            Level::Legend => "Legend",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
