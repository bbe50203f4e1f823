use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("expected {expected} proposals, got {got}")]
    WrongProposalCount { expected: usize, got: usize },

    #[error("proposal {0} is missing a title or an author")]
    IncompleteProposal(usize),

    #[error("member {0} has already submitted proposals")]
    ProposalsAlreadySubmitted(i64),

    #[error("member {member} already voted for song {song}")]
    DuplicateVote { member: i64, song: i64 },
}
