use selection::{Score, Song, Vote};
use time::Date;
use tracing::{debug, instrument, warn};

mod error;
pub mod models;

pub use error::{Error, Result};
use models::{normalize_link, NewProposal, PROPOSALS_PER_MEMBER};

type VoteRow = (i64, String, String, Option<String>, i64, i64);
type SongRow = (i64, String, String, Option<String>);

pub struct Database {
    pool: sqlx::Pool<sqlx::Postgres>,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::PgPool::connect(url).await?;

        Ok(Self { pool })
    }

    /// Every vote together with the proposal it was cast for. Rows with a vote
    /// outside 1..=10 are skipped.
    #[instrument(skip(self), level = "trace")]
    pub async fn fetch_votes(&self) -> Result<Vec<Vote>> {
        let rows: Vec<VoteRow> = sqlx::query_as(
            "
            select p.id::int8, p.titolo, p.autore, p.link_youtube, v.user_id::int8, v.voto::int8
            from proposte p
            join voti v on p.id = v.brano_id
            order by p.id, v.user_id
        ",
        )
        .fetch_all(&self.pool)
        .await?;

        let total = rows.len();
        let votes: Vec<Vote> = rows.into_iter().filter_map(vote_from_row).collect();
        debug!(total, valid = votes.len(), "fetched votes");

        Ok(votes)
    }

    #[instrument(skip(self), ret, level = "trace")]
    pub async fn voting_active(&self) -> Result<bool> {
        let row: Option<(String,)> =
            sqlx::query_as("select valore from configurazione where chiave = 'votazione_attiva'")
                .fetch_optional(&self.pool)
                .await?;

        Ok(matches!(row, Some((value,)) if value.trim() == "1"))
    }

    #[instrument(skip(self), ret, level = "trace")]
    pub async fn proposal_count(&self, member: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("select count(*) from proposte where user_id = $1")
            .bind(member)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Stores a member's proposals in one transaction. A member proposes
    /// exactly [`PROPOSALS_PER_MEMBER`] songs and only once.
    #[instrument(skip(self, proposals), level = "trace")]
    pub async fn submit_proposals(
        &self,
        member: i64,
        proposals: &[NewProposal],
    ) -> Result<Vec<i64>> {
        if proposals.len() != PROPOSALS_PER_MEMBER {
            return Err(Error::WrongProposalCount {
                expected: PROPOSALS_PER_MEMBER,
                got: proposals.len(),
            });
        }
        if let Some(index) = proposals.iter().position(|proposal| !proposal.is_complete()) {
            return Err(Error::IncompleteProposal(index + 1));
        }

        let mut transaction = self.pool.begin().await?;

        // held until commit or rollback, so concurrent submissions for one
        // member run one after the other and the second sees the first's rows
        sqlx::query("select pg_advisory_xact_lock($1)")
            .bind(member)
            .execute(&mut *transaction)
            .await?;

        let (existing,): (i64,) =
            sqlx::query_as("select count(*) from proposte where user_id = $1")
                .bind(member)
                .fetch_one(&mut *transaction)
                .await?;
        if existing > 0 {
            return Err(Error::ProposalsAlreadySubmitted(member));
        }

        let mut ids = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let (id,): (i64,) = sqlx::query_as(
                "
                insert into proposte (user_id, titolo, autore, link_youtube)
                values ($1, $2, $3, $4)
                returning id::int8
            ",
            )
            .bind(member)
            .bind(&proposal.title)
            .bind(&proposal.author)
            .bind(&proposal.link)
            .fetch_one(&mut *transaction)
            .await?;
            ids.push(id);
        }

        transaction.commit().await?;
        debug!(member, ?ids, "stored proposals");

        Ok(ids)
    }

    /// The song registered in `brano_del_giorno` for `date`, if any.
    #[instrument(skip(self), level = "trace")]
    pub async fn scheduled_song(&self, date: Date) -> Result<Option<Song>> {
        let row: Option<SongRow> = sqlx::query_as(
            "
            select p.id::int8, p.titolo, p.autore, p.link_youtube
            from brano_del_giorno b
            join proposte p on p.id = b.brano_id
            where b.data = $1
        ",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(song_from_row))
    }

    /// The vote `member` already gave `song`, if any.
    #[instrument(skip(self), level = "trace")]
    pub async fn existing_vote(&self, member: i64, song: i64) -> Result<Option<Score>> {
        let row: Option<(i64,)> =
            sqlx::query_as("select voto::int8 from voti where user_id = $1 and brano_id = $2")
                .bind(member)
                .bind(song)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(value,)| Score::try_from(value).ok()))
    }

    #[instrument(skip(self), level = "trace")]
    pub async fn cast_vote(&self, member: i64, song: i64, score: Score) -> Result<()> {
        let result = sqlx::query(
            "
            insert into voti (user_id, brano_id, voto)
            select $1, $2, $3
            where not exists (select 1 from voti where user_id = $1 and brano_id = $2)
        ",
        )
        .bind(member)
        .bind(song)
        .bind(score.get() as i16)
        .execute(&self.pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                Error::DuplicateVote { member, song }
            }
            other => Error::Database(other),
        })?;

        if result.rows_affected() == 0 {
            return Err(Error::DuplicateVote { member, song });
        }
        debug!(member, song, score = score.get(), "recorded vote");

        Ok(())
    }
}

fn song_from_row((id, title, author, link): SongRow) -> Song {
    Song {
        id,
        title,
        author,
        link: normalize_link(link),
    }
}

fn vote_from_row((song_id, title, author, link, voter_id, value): VoteRow) -> Option<Vote> {
    match Score::try_from(value) {
        Ok(score) => Some(Vote {
            song: song_from_row((song_id, title, author, link)),
            voter_id,
            score,
        }),
        Err(error) => {
            warn!(song_id, voter_id, %error, "skipping malformed vote");
            None
        }
    }
}
