use serde::Serialize;
use tracing::{debug, instrument};

use crate::score::ScoreRecord;

pub const DEFAULT_MIN_SCORE: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSong {
    /// 1 is the best eligible song.
    pub rank: usize,
    pub composite: f64,
    pub record: ScoreRecord,
}

/// Keeps the records whose composite score reaches `min_score` and orders them
/// best first: composite descending, then mean descending, otherwise input order.
///
/// An empty result means there is no eligible song yet.
#[instrument(skip(records), fields(records = records.len()), level = "trace")]
pub fn rank_eligible(records: Vec<ScoreRecord>, min_score: f64) -> Vec<RankedSong> {
    let mut eligible: Vec<(f64, ScoreRecord)> = records
        .into_iter()
        .filter_map(|record| match record.composite {
            Some(composite) if composite >= min_score => Some((composite, record)),
            _ => None,
        })
        .collect();

    eligible.sort_by(|(a, a_record), (b, b_record)| {
        b.total_cmp(a)
            .then_with(|| b_record.mean.total_cmp(&a_record.mean))
    });
    debug!(eligible = eligible.len(), min_score, "ranked songs");

    eligible
        .into_iter()
        .enumerate()
        .map(|(index, (composite, record))| RankedSong {
            rank: index + 1,
            composite,
            record,
        })
        .collect()
}
