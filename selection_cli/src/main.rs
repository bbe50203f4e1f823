use anyhow::{bail, Context};
use clap::Parser;
use database::models::NewProposal;
use selection::{Score, SelectionConfig, DEFAULT_ANCHOR, DEFAULT_MIN_SCORE};
use serde::Serialize;
use time::{macros::format_description, Date, OffsetDateTime};
use tracing::{debug, info, instrument, warn};

mod report;
mod source;

use source::VoteSource;

#[derive(Debug, clap::Parser)]
#[command(version, about = "Song of the day: proposals, votes and the daily rotation")]
struct Cli {
    /// Print machine readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Show the song of the day
    Today {
        #[command(flatten)]
        source: VoteSource,
        #[command(flatten)]
        engine: EngineArgs,
        /// Day to show instead of today, as YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
    },
    /// List every eligible song, best first
    Leaderboard {
        #[command(flatten)]
        source: VoteSource,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Preview the rotation for the coming days
    Schedule {
        #[command(flatten)]
        source: VoteSource,
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Submit a member's song proposals (once per member)
    Propose {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        db: String,
        #[arg(short, long)]
        member: i64,
        #[arg(long = "title", required = true)]
        titles: Vec<String>,
        #[arg(long = "author", required = true)]
        authors: Vec<String>,
    },
    /// Vote for the song of the day
    ///
    /// Votes on the song registered for the date. When none is registered,
    /// the song the rotation picks for that date is used instead.
    Vote {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        db: String,
        #[arg(short, long)]
        member: i64,
        #[arg(short, long, value_parser = parse_score)]
        score: Score,
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
    },
}

#[derive(Debug, Clone, clap::Args)]
struct EngineArgs {
    /// Lowest composite score a song needs to enter the rotation
    #[arg(long, env = "MIN_SCORE", default_value_t = DEFAULT_MIN_SCORE)]
    min_score: f64,
    /// Day zero of the rotation, as YYYY-MM-DD
    #[arg(long, env = "ANCHOR_DATE", value_parser = parse_date, default_value_t = DEFAULT_ANCHOR)]
    anchor: Date,
}

impl From<&EngineArgs> for SelectionConfig {
    fn from(args: &EngineArgs) -> Self {
        Self {
            min_score: args.min_score,
            anchor: args.anchor,
        }
    }
}

#[derive(Debug, Serialize)]
struct VoteReceipt {
    song_id: i64,
    title: String,
    score: u8,
    recorded: bool,
}

fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
}

fn parse_score(value: &str) -> Result<Score, String> {
    let value: i64 = value.parse().map_err(|error| format!("{error}"))?;
    Score::try_from(value).map_err(|error| error.to_string())
}

fn today() -> Date {
    match OffsetDateTime::now_local() {
        Ok(now) => now.date(),
        Err(error) => {
            warn!(%error, "local offset unavailable, using UTC");
            OffsetDateTime::now_utc().date()
        }
    }
}

fn pair_proposals(titles: &[String], authors: &[String]) -> anyhow::Result<Vec<NewProposal>> {
    if titles.len() != authors.len() {
        bail!(
            "every --title needs an --author ({} titles, {} authors)",
            titles.len(),
            authors.len()
        );
    }

    Ok(titles
        .iter()
        .zip(authors)
        .map(|(title, author)| NewProposal::new(title, author))
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    {
        use tracing_subscriber::prelude::*;

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .init()
    }

    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Command::Today {
            source,
            engine,
            date,
        } => show_today(&source, &engine, date.unwrap_or_else(today), json).await,
        Command::Leaderboard { source, engine } => show_leaderboard(&source, &engine, json).await,
        Command::Schedule {
            source,
            engine,
            from,
            days,
        } => show_schedule(&source, &engine, from.unwrap_or_else(today), days, json).await,
        Command::Propose {
            db,
            member,
            titles,
            authors,
        } => propose(&db, member, &titles, &authors).await,
        Command::Vote {
            db,
            member,
            score,
            engine,
            date,
        } => vote(&db, member, score, &engine, date.unwrap_or_else(today), json).await,
    }
}

#[instrument(skip(source), level = "trace")]
async fn show_today(
    source: &VoteSource,
    engine: &EngineArgs,
    date: Date,
    json: bool,
) -> anyhow::Result<()> {
    let votes = source.load().await?;
    let config = SelectionConfig::from(engine);

    let start = std::time::Instant::now();
    let selection = selection::select_for_date(&votes, &config, date);
    let elapsed = start.elapsed();
    debug!(?elapsed, votes = votes.len(), "computed selection");

    report::daily(selection.as_ref(), config.min_score, json)
}

async fn show_leaderboard(source: &VoteSource, engine: &EngineArgs, json: bool) -> anyhow::Result<()> {
    let votes = source.load().await?;
    let ranking = selection::leaderboard(&votes, &engine.into());

    report::leaderboard(&ranking, engine.min_score, json)
}

async fn show_schedule(
    source: &VoteSource,
    engine: &EngineArgs,
    from: Date,
    days: u32,
    json: bool,
) -> anyhow::Result<()> {
    let votes = source.load().await?;
    let schedule = selection::schedule(&votes, &engine.into(), from, days);

    report::schedule(&schedule, engine.min_score, json)
}

#[instrument(skip(db_url, titles, authors), level = "trace")]
async fn propose(db_url: &str, member: i64, titles: &[String], authors: &[String]) -> anyhow::Result<()> {
    let proposals = pair_proposals(titles, authors)?;

    let database = database::Database::connect(db_url)
        .await
        .context("failed to connect to database")?;
    if database.proposal_count(member).await? > 0 {
        println!("You already submitted your proposals, thank you for taking part!");
        return Ok(());
    }

    let ids = database
        .submit_proposals(member, &proposals)
        .await
        .context("failed to submit proposals")?;

    info!(member, ?ids, "inserted proposals");
    println!("Proposals submitted, thank you for taking part!");

    Ok(())
}

/// Votes on the song registered for `date`, falling back to the song the
/// rotation picks when nothing is registered.
#[instrument(skip(db_url), level = "trace")]
async fn vote(
    db_url: &str,
    member: i64,
    score: Score,
    engine: &EngineArgs,
    date: Date,
    json: bool,
) -> anyhow::Result<()> {
    let database = database::Database::connect(db_url)
        .await
        .context("failed to connect to database")?;

    if !database.voting_active().await? {
        bail!("voting is not open yet");
    }

    let song = match database.scheduled_song(date).await? {
        Some(song) => song,
        None => {
            let votes = database.fetch_votes().await?;
            match selection::select_for_date(&votes, &engine.into(), date) {
                Some(selected) => selection::Song {
                    id: selected.song_id,
                    title: selected.title,
                    author: selected.author,
                    link: selected.link,
                },
                None => bail!("no song to vote for on {date}"),
            }
        }
    };

    let receipt = match database.existing_vote(member, song.id).await? {
        Some(previous) => VoteReceipt {
            song_id: song.id,
            title: song.title,
            score: previous.get(),
            recorded: false,
        },
        None => {
            database.cast_vote(member, song.id, score).await?;
            info!(member, song = song.id, score = score.get(), "vote recorded");
            VoteReceipt {
                song_id: song.id,
                title: song.title,
                score: score.get(),
                recorded: true,
            }
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else if receipt.recorded {
        println!("Vote {} recorded for {}.", receipt.score, receipt.title);
    } else {
        println!("You already voted for {}: {}.", receipt.title, receipt.score);
    }

    Ok(())
}
