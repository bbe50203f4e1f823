use serde::{Deserialize, Serialize};

pub const MIN_VOTE: u8 = 1;
pub const MAX_VOTE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("vote {0} is outside {}..={}", MIN_VOTE, MAX_VOTE)]
pub struct InvalidScore(pub i64);

/// A single vote value, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = InvalidScore;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (MIN_VOTE as i64..=MAX_VOTE as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidScore(value))
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(rename = "song_id")]
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// One row of the vote table joined with the proposal it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(flatten)]
    pub song: Song,
    pub voter_id: i64,
    pub score: Score,
}
