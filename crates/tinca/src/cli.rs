//! Terminal output for CLI commands

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use tinca_core::models::LeaderboardEntry;

/// Format the leaderboard as a table (human) or JSON
pub fn format_leaderboard(entries: &[LeaderboardEntry], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string());
    }

    if entries.is_empty() {
        return "Leaderboard is empty.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers = ["#", "Player", "Score", "Level", "Game", "Date", "Country"];
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for (rank, entry) in entries.iter().enumerate() {
        table.add_row(Row::from(vec![
            (rank + 1).to_string(),
            truncate(&entry.username, 24),
            entry.highest_score.to_string(),
            entry.level.to_string(),
            truncate(&entry.game_id, 20),
            truncate(&entry.date, 12),
            entry.country.clone().unwrap_or_else(|| "-".to_string()),
        ]));
    }

    table.to_string()
}

/// Summary line under the table
pub fn format_footer(shown: usize, total: usize) -> String {
    format!("Top {shown} of {total} scores")
}

/// Truncate to `max` characters, marking the cut with an ellipsis
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinca_core::models::Level;

    fn entry(username: &str, score: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: 1,
            username: username.to_string(),
            highest_score: score,
            game_id: "run-1".to_string(),
            timestamp: 1,
            date: "2024-06-01".to_string(),
            country: Some("CN".to_string()),
            created_at: 0,
            updated_at: 0,
            level: Level::for_score(score),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("日本語テキスト", 4), "日本語…");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_leaderboard(&[], false, true), "Leaderboard is empty.");
        assert_eq!(format_leaderboard(&[], true, true), "[]");
    }

    #[test]
    fn test_format_table() {
        let out = format_leaderboard(&[entry("alice", 2400), entry("bob", 900)], false, true);
        assert!(out.contains("alice"));
        assert!(out.contains("Legend"));
        assert!(out.contains("Silver"));
    }

    #[test]
    fn test_format_footer() {
        assert_eq!(format_footer(100, 250), "Top 100 of 250 scores");
    }

    #[test]
    fn test_format_json_camel_case() {
        let out = format_leaderboard(&[entry("alice", 2400)], true, true);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["highestScore"], 2400);
        assert_eq!(value[0]["level"], "Legend");
    }
}
