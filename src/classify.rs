use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::games_fetch::GameRecord;
use crate::openings::OpeningTable;

pub const STANDARD_RULES: &str = "chess";

/// White result codes that mean the game was drawn.
pub const DRAW_CODES: &[&str] = &[
    "timevsinsufficient",
    "repetition",
    "stalemate",
    "agreed",
    "insufficient",
    "50move",
];

/// White result codes that mean white lost.
pub const LOSS_CODES: &[&str] = &["timeout", "checkmated", "resigned", "abandoned"];

static ECO_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[ECO "([^"]+)"\]"#).expect("valid ECO regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeClass {
    #[default]
    All,
    Bullet,
    Blitz,
    Rapid,
    Daily,
}

impl TimeClass {
    pub fn admits(self, tag: &str) -> bool {
        match self {
            TimeClass::All => true,
            TimeClass::Bullet => tag == "bullet",
            TimeClass::Blitz => tag == "blitz",
            TimeClass::Rapid => tag == "rapid",
            TimeClass::Daily => tag == "daily",
        }
    }
}

/// What happens to a game whose opening code is missing from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownOpening {
    #[default]
    Fail,
    Skip,
}

/// Result of a game from white's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    WhiteWin,
    Draw,
    BlackWin,
}

impl Outcome {
    /// Codes outside both fixed sets count as a white win.
    pub fn from_white_result(code: &str) -> Self {
        if DRAW_CODES.contains(&code) {
            Outcome::Draw
        } else if LOSS_CODES.contains(&code) {
            Outcome::BlackWin
        } else {
            Outcome::WhiteWin
        }
    }

    /// `(white_win, draw, black_win)` as 0/1 flags; exactly one is set.
    pub fn flags(self) -> (u8, u8, u8) {
        match self {
            Outcome::WhiteWin => (1, 0, 0),
            Outcome::Draw => (0, 1, 0),
            Outcome::BlackWin => (0, 0, 1),
        }
    }
}

/// A rated standard game with outcome and opening resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedGame {
    pub outcome: Outcome,
    pub opening_code: String,
    pub opening: String,
    pub time_class: String,
    pub white_username: String,
    pub white_rating: u32,
    pub black_username: String,
    pub black_rating: u32,
}

/// A classified game seen from the queried user's side.
#[derive(Debug, Clone, PartialEq)]
pub struct UserGame {
    pub opening_code: String,
    pub opening: String,
    pub user_win: bool,
    pub draw: bool,
    pub user_loss: bool,
    pub user_rating: u32,
    pub opponent_rating: u32,
}

impl UserGame {
    pub fn from_classified(game: &ClassifiedGame, side: Side) -> Self {
        let (white_win, draw, black_win) = match game.outcome {
            Outcome::WhiteWin => (true, false, false),
            Outcome::Draw => (false, true, false),
            Outcome::BlackWin => (false, false, true),
        };
        let (user_win, user_loss, user_rating, opponent_rating) = match side {
            Side::White => (white_win, black_win, game.white_rating, game.black_rating),
            Side::Black => (black_win, white_win, game.black_rating, game.white_rating),
        };
        Self {
            opening_code: game.opening_code.clone(),
            opening: game.opening.clone(),
            user_win,
            draw,
            user_loss,
            user_rating,
            opponent_rating,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SideViews {
    pub white: Vec<UserGame>,
    pub black: Vec<UserGame>,
}

impl SideViews {
    pub fn into_side(self, side: Side) -> Vec<UserGame> {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }
}

pub fn extract_opening_code(pgn: &str) -> Option<&str> {
    ECO_TAG
        .captures(pgn)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Rated, standard ruleset, and inside the requested time class.
pub fn is_eligible(record: &GameRecord, time_class: TimeClass) -> bool {
    record.rated && record.rules == STANDARD_RULES && time_class.admits(&record.time_class)
}

/// Filters, then resolves outcome and opening for every remaining record.
///
/// With `UnknownOpening::Fail` the first unresolvable opening aborts the
/// whole batch.
pub fn classify_games(
    records: &[GameRecord],
    time_class: TimeClass,
    table: &OpeningTable,
    unknown: UnknownOpening,
) -> Result<Vec<ClassifiedGame>> {
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for record in records.iter().filter(|r| is_eligible(r, time_class)) {
        let code = extract_opening_code(&record.pgn);
        let opening = match table.name_for(code) {
            Ok(name) => name.to_string(),
            Err(err @ AnalysisError::LookupFailure { .. }) => match unknown {
                UnknownOpening::Fail => return Err(err),
                UnknownOpening::Skip => {
                    tracing::warn!(url = %record.url, "skipping game: {err}");
                    skipped += 1;
                    continue;
                }
            },
            Err(err) => return Err(err),
        };
        out.push(ClassifiedGame {
            outcome: Outcome::from_white_result(&record.white_result),
            opening_code: code.unwrap_or_default().to_string(),
            opening,
            time_class: record.time_class.clone(),
            white_username: record.white_username.clone(),
            white_rating: record.white_rating,
            black_username: record.black_username.clone(),
            black_rating: record.black_rating,
        });
    }
    tracing::debug!(
        total = records.len(),
        classified = out.len(),
        skipped,
        ?time_class,
        "classified games"
    );
    Ok(out)
}

/// Splits games by which colour `username` played (case-insensitive).
/// Games the user did not play land in neither view.
pub fn split_by_side(games: &[ClassifiedGame], username: &str) -> SideViews {
    let needle = username.trim().to_lowercase();
    let mut views = SideViews::default();
    for game in games {
        if game.white_username.to_lowercase() == needle {
            views.white.push(UserGame::from_classified(game, Side::White));
        } else if game.black_username.to_lowercase() == needle {
            views.black.push(UserGame::from_classified(game, Side::Black));
        }
    }
    views
}

/// Full normalization: classify, split by colour, keep the requested side.
pub fn normalize_games(
    records: &[GameRecord],
    username: &str,
    side: Side,
    time_class: TimeClass,
    table: &OpeningTable,
    unknown: UnknownOpening,
) -> Result<Vec<UserGame>> {
    let classified = classify_games(records, time_class, table, unknown)?;
    Ok(split_by_side(&classified, username).into_side(side))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_sets() {
        assert_eq!(Outcome::from_white_result("win"), Outcome::WhiteWin);
        assert_eq!(Outcome::from_white_result("50move"), Outcome::Draw);
        assert_eq!(Outcome::from_white_result("abandoned"), Outcome::BlackWin);
        // Not in either set.
        assert_eq!(Outcome::from_white_result("kingofthehill"), Outcome::WhiteWin);
    }

    #[test]
    fn eco_tag_extraction() {
        let pgn = "[Event \"Live Chess\"]\n[ECO \"C50\"]\n[ECOUrl \"https://x/y\"]\n1. e4 e5";
        assert_eq!(extract_opening_code(pgn), Some("C50"));
        assert_eq!(extract_opening_code("[Event \"x\"]\n1. d4"), None);
        assert_eq!(extract_opening_code("[ECOUrl \"C50\"]"), None);
    }

    #[test]
    fn time_class_all_admits_everything() {
        assert!(TimeClass::All.admits("daily"));
        assert!(TimeClass::Blitz.admits("blitz"));
        assert!(!TimeClass::Bullet.admits("blitz"));
    }
}
