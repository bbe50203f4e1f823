//! Song of the day: turns the vote table into one song per calendar date.
//!
//! Votes are reduced to per-song statistics ([`score`]), songs below the
//! minimum composite score are dropped and the rest ranked ([`rank`]), and the
//! ranking is rotated through one song per day ([`rotation`]).

use serde::Serialize;
use time::Date;
use tracing::{debug, instrument};

pub mod models;
pub mod rank;
pub mod rotation;
pub mod score;

pub use models::{InvalidScore, Score, Song, Vote};
pub use rank::{rank_eligible, RankedSong, DEFAULT_MIN_SCORE};
pub use rotation::DEFAULT_ANCHOR;
pub use score::{aggregate, ScoreRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    pub min_score: f64,
    pub anchor: Date,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            anchor: DEFAULT_ANCHOR,
        }
    }
}

/// The song shown on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySelection {
    pub date: Date,
    pub song_id: i64,
    pub title: String,
    pub author: String,
    pub link: Option<String>,
    pub voters: u32,
    pub composite: f64,
    pub rank: usize,
}

impl DailySelection {
    fn new(date: Date, ranked: &RankedSong) -> Self {
        let song = &ranked.record.song;
        Self {
            date,
            song_id: song.id,
            title: song.title.clone(),
            author: song.author.clone(),
            link: song.link.clone(),
            voters: ranked.record.count,
            composite: ranked.composite,
            rank: ranked.rank,
        }
    }
}

/// Eligible songs, best first.
pub fn leaderboard(votes: &[Vote], config: &SelectionConfig) -> Vec<RankedSong> {
    rank_eligible(aggregate(votes), config.min_score)
}

/// Runs the whole pipeline for one date. `None` means no song is eligible yet.
#[instrument(skip(votes), fields(votes = votes.len()), level = "trace")]
pub fn select_for_date(
    votes: &[Vote],
    config: &SelectionConfig,
    date: Date,
) -> Option<DailySelection> {
    let ranking = leaderboard(votes, config);
    let selection = rotation::select(&ranking, config.anchor, date)
        .map(|ranked| DailySelection::new(date, ranked));
    debug!(?selection, "selected song");
    selection
}

/// Selections for `days` consecutive days starting at `from`, computed from a
/// single ranking.
pub fn schedule(
    votes: &[Vote],
    config: &SelectionConfig,
    from: Date,
    days: u32,
) -> Vec<DailySelection> {
    let ranking = leaderboard(votes, config);
    rotation::schedule(&ranking, config.anchor, from, days)
        .into_iter()
        .map(|(date, ranked)| DailySelection::new(date, ranked))
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::score::tests::votes_for;

    fn votes() -> Vec<Vote> {
        let mut votes = votes_for(10, &[6, 7, 8, 7]);
        votes.extend(votes_for(11, &[9, 10, 9]));
        votes.extend(votes_for(12, &[2, 4]));
        votes.extend(votes_for(13, &[8]));
        votes
    }

    #[test]
    fn selection_carries_song_and_rank() {
        let config = SelectionConfig::default();

        let selection = select_for_date(&votes(), &config, config.anchor).unwrap();

        // worst eligible song on the anchor day
        assert_eq!(selection.song_id, 10);
        assert_eq!(selection.rank, 3);
        assert_eq!(selection.voters, 4);
        assert_eq!(selection.title, "song 10");
        assert_eq!(selection.date, config.anchor);
    }

    #[test]
    fn no_eligible_song_is_none() {
        let config = SelectionConfig::default();

        assert_eq!(select_for_date(&[], &config, date!(2025 - 11 - 01)), None);
        assert_eq!(
            select_for_date(&votes_for(1, &[3, 5]), &config, date!(2025 - 11 - 01)),
            None
        );
    }

    #[test]
    fn custom_threshold_and_anchor() {
        let config = SelectionConfig {
            min_score: 9.0,
            anchor: date!(2026 - 01 - 01),
        };

        let selection = select_for_date(&votes(), &config, date!(2026 - 03 - 15)).unwrap();

        assert_eq!(selection.song_id, 11);
        assert_eq!(selection.rank, 1);
    }

    #[test]
    fn schedule_matches_single_day_selection() {
        let config = SelectionConfig::default();
        let from = date!(2025 - 12 - 30);

        let days = schedule(&votes(), &config, from, 7);

        assert_eq!(days.len(), 7);
        for day in days {
            assert_eq!(select_for_date(&votes(), &config, day.date), Some(day));
        }
    }
}
