use std::collections::BTreeMap;

use serde::Serialize;
use tabled::Tabled;

use crate::classify::UserGame;

/// Per-opening summary for one user and side. Rates are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct OpeningStatRow {
    pub opening: String,
    #[serde(rename = "GamesPlayed")]
    #[tabled(rename = "GamesPlayed")]
    pub games_played: usize,
    #[serde(rename = "WinRate")]
    #[tabled(rename = "WinRate", display = "one_decimal")]
    pub win_rate: f64,
    #[serde(rename = "DrawRate")]
    #[tabled(rename = "DrawRate", display = "one_decimal")]
    pub draw_rate: f64,
    #[serde(rename = "LossRate")]
    #[tabled(rename = "LossRate", display = "one_decimal")]
    pub loss_rate: f64,
    #[serde(rename = "AvgSelfRating")]
    #[tabled(rename = "AvgSelfRating", display = "one_decimal")]
    pub avg_user_rating: f64,
    #[serde(rename = "AvgOpponentRating")]
    #[tabled(rename = "AvgOpponentRating", display = "one_decimal")]
    pub avg_opponent_rating: f64,
}

fn one_decimal(value: &f64) -> String {
    format!("{value:.1}")
}

#[derive(Debug, Default)]
struct Acc {
    count: usize,
    wins: usize,
    draws: usize,
    losses: usize,
    user_rating_sum: f64,
    opponent_rating_sum: f64,
}

/// Groups by opening name and summarizes each group, most played first.
///
/// Groups start in name order; the count sort is stable, so equal counts
/// keep that order. Empty input yields no rows.
pub fn aggregate_by_opening(games: &[UserGame]) -> Vec<OpeningStatRow> {
    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for game in games {
        let acc = groups.entry(game.opening.as_str()).or_default();
        acc.count += 1;
        acc.wins += usize::from(game.user_win);
        acc.draws += usize::from(game.draw);
        acc.losses += usize::from(game.user_loss);
        acc.user_rating_sum += f64::from(game.user_rating);
        acc.opponent_rating_sum += f64::from(game.opponent_rating);
    }

    let mut rows: Vec<OpeningStatRow> = groups
        .into_iter()
        .map(|(opening, acc)| {
            let n = acc.count as f64;
            OpeningStatRow {
                opening: opening.to_string(),
                games_played: acc.count,
                win_rate: round1(100.0 * acc.wins as f64 / n),
                draw_rate: round1(100.0 * acc.draws as f64 / n),
                loss_rate: round1(100.0 * acc.losses as f64 / n),
                avg_user_rating: round1(acc.user_rating_sum / n),
                avg_opponent_rating: round1(acc.opponent_rating_sum / n),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.games_played.cmp(&a.games_played));
    rows
}

/// Nearest one-decimal value of the exact binary input; exact halves go to
/// the even digit, so 6.25 becomes 6.2.
pub fn round1(x: f64) -> f64 {
    format!("{x:.1}").parse().unwrap_or(x)
}
