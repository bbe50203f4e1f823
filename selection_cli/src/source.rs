use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use selection::Vote;
use tracing::{debug, instrument};

/// Where the read-only commands take their votes from.
#[derive(Debug, clap::Args)]
pub struct VoteSource {
    /// Postgres connection url
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub db: Option<String>,
    /// JSON file with an array of vote rows, takes precedence over the database
    #[arg(long)]
    pub votes: Option<PathBuf>,
}

impl VoteSource {
    #[instrument(skip(self), level = "trace")]
    pub async fn load(&self) -> anyhow::Result<Vec<Vote>> {
        match (&self.votes, &self.db) {
            (Some(path), _) => read_vote_file(path),
            (None, Some(url)) => {
                let database = database::Database::connect(url)
                    .await
                    .context("failed to connect to database")?;
                let votes = database.fetch_votes().await.context("failed to fetch votes")?;
                Ok(votes)
            }
            (None, None) => bail!("no vote source, pass --db, set DATABASE_URL or use --votes"),
        }
    }
}

pub fn read_vote_file(path: &Path) -> anyhow::Result<Vec<Vote>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let votes: Vec<Vote> = serde_json::from_str(&contents)
        .with_context(|| format!("malformed vote file {}", path.display()))?;

    // one vote per voter and song
    let mut seen = HashSet::with_capacity(votes.len());
    for vote in &votes {
        if !seen.insert((vote.song.id, vote.voter_id)) {
            bail!(
                "voter {} voted more than once for song {} in {}",
                vote.voter_id,
                vote.song.id,
                path.display()
            );
        }
    }
    debug!(votes = votes.len(), path = %path.display(), "read vote file");

    Ok(votes)
}
