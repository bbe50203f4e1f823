use std::collections::BTreeMap;

use serde::Serialize;
use tracing::instrument;

use crate::models::{Song, Vote};

/// Vote statistics for one song.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub song: Song,
    pub count: u32,
    pub mean: f64,
    /// `None` with a single vote.
    pub stddev: Option<f64>,
    /// `mean - stddev / sqrt(count)`, `None` only if the statistics are not finite.
    pub composite: Option<f64>,
}

/// Collapses raw votes into one [`ScoreRecord`] per song, ordered by song id.
/// Songs nobody voted for never appear in the output.
#[instrument(skip(votes), fields(votes = votes.len()), level = "trace")]
pub fn aggregate(votes: &[Vote]) -> Vec<ScoreRecord> {
    let mut by_song: BTreeMap<i64, (&Song, Vec<f64>)> = BTreeMap::new();
    for vote in votes {
        by_song
            .entry(vote.song.id)
            .or_insert_with(|| (&vote.song, Vec::new()))
            .1
            .push(vote.score.get() as f64);
    }

    by_song
        .into_values()
        .filter(|(_, values)| !values.is_empty())
        .map(|(song, values)| summarize(song.clone(), &values))
        .collect()
}

fn summarize(song: Song, values: &[f64]) -> ScoreRecord {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let stddev = sample_stddev(values, mean);

    let penalty = match stddev {
        Some(stddev) if count > 0 => stddev / (count as f64).sqrt(),
        _ => 0.0,
    };
    let composite = Some(mean - penalty)
        .filter(|value| value.is_finite())
        .map(round3);

    ScoreRecord {
        song,
        count: count as u32,
        mean: round3(mean),
        stddev: stddev.map(round3),
        composite,
    }
}

// Bessel-corrected, undefined below two samples.
fn sample_stddev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
