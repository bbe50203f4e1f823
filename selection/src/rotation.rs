use time::{macros::date, Date, Duration};
use tracing::trace;

use crate::rank::RankedSong;

/// Day zero of the rotation.
pub const DEFAULT_ANCHOR: Date = date!(2025 - 10 - 23);

/// Position in the worst-to-best order that `date` falls on, or `None` when
/// there is nothing to rotate through.
pub fn rotation_index(anchor: Date, date: Date, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }

    let offset = (date - anchor).whole_days();
    let index = offset.rem_euclid(len as i64) as usize;
    trace!(%date, offset, index, len, "rotation index");
    Some(index)
}

/// Picks the song for `date` from a best-first ranking. The rotation walks the
/// ranking from the worst song up to the best, one song per day, starting at
/// `anchor`.
pub fn select(ranking: &[RankedSong], anchor: Date, date: Date) -> Option<&RankedSong> {
    let index = rotation_index(anchor, date, ranking.len())?;
    ranking.iter().rev().nth(index)
}

/// The selections for `days` consecutive days starting at `from`.
pub fn schedule(
    ranking: &[RankedSong],
    anchor: Date,
    from: Date,
    days: u32,
) -> Vec<(Date, &RankedSong)> {
    (0..days as i64)
        .map_while(|day| from.checked_add(Duration::days(day)))
        .filter_map(|date| select(ranking, anchor, date).map(|song| (date, song)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rank::rank_eligible,
        score::{aggregate, tests::votes_for},
    };

    // C is the best, A the worst
    fn abc() -> Vec<RankedSong> {
        let mut votes = votes_for(1, &[7]);
        votes.extend(votes_for(2, &[8]));
        votes.extend(votes_for(3, &[9]));
        rank_eligible(aggregate(&votes), 6.0)
    }

    fn picked(ranking: &[RankedSong], date: Date) -> (i64, usize) {
        let song = select(ranking, DEFAULT_ANCHOR, date).unwrap();
        (song.record.song.id, song.rank)
    }

    #[test]
    fn walks_from_worst_to_best() {
        let ranking = abc();

        assert_eq!(picked(&ranking, date!(2025 - 10 - 23)), (1, 3));
        assert_eq!(picked(&ranking, date!(2025 - 10 - 24)), (2, 2));
        assert_eq!(picked(&ranking, date!(2025 - 10 - 25)), (3, 1));
        assert_eq!(picked(&ranking, date!(2025 - 10 - 26)), (1, 3));
    }

    #[test]
    fn day_before_anchor_is_the_best_song() {
        assert_eq!(picked(&abc(), date!(2025 - 10 - 22)), (3, 1));
    }

    #[test]
    fn far_past_dates_stay_in_range() {
        assert_eq!(rotation_index(DEFAULT_ANCHOR, date!(2024 - 10 - 23), 3), Some(1));
        assert_eq!(rotation_index(DEFAULT_ANCHOR, date!(2025 - 10 - 20), 3), Some(0));
    }

    #[test]
    fn period_is_ranking_length() {
        let ranking = abc();
        let start = date!(2026 - 02 - 11);

        for day in 0..10 {
            let date = start + Duration::days(day);
            let later = date + Duration::days(ranking.len() as i64);
            assert_eq!(picked(&ranking, date), picked(&ranking, later));
        }
    }

    #[test]
    fn same_date_same_song() {
        let ranking = abc();
        let date = date!(2026 - 07 - 04);

        assert_eq!(picked(&ranking, date), picked(&abc(), date));
    }

    #[test]
    fn empty_ranking_selects_nothing() {
        assert_eq!(rotation_index(DEFAULT_ANCHOR, DEFAULT_ANCHOR, 0), None);
        assert!(select(&[], DEFAULT_ANCHOR, DEFAULT_ANCHOR).is_none());
        assert!(schedule(&[], DEFAULT_ANCHOR, DEFAULT_ANCHOR, 5).is_empty());
    }

    #[test]
    fn schedule_lists_consecutive_days() {
        let ranking = abc();
        let days = schedule(&ranking, DEFAULT_ANCHOR, date!(2025 - 10 - 22), 4);

        let summary: Vec<(Date, i64)> = days
            .iter()
            .map(|(date, song)| (*date, song.record.song.id))
            .collect();
        assert_eq!(
            summary,
            vec![
                (date!(2025 - 10 - 22), 3),
                (date!(2025 - 10 - 23), 1),
                (date!(2025 - 10 - 24), 2),
                (date!(2025 - 10 - 25), 3),
            ]
        );
    }
}
