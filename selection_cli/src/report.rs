use selection::{DailySelection, RankedSong};
use serde::Serialize;
use time::{macros::format_description, Date};

fn display_date(date: Date) -> String {
    date.format(format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| date.to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn daily(selection: Option<&DailySelection>, min_score: f64, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&selection);
    }

    match selection {
        None => println!("No eligible song (score >= {min_score})."),
        Some(selection) => {
            println!("Date: {}", display_date(selection.date));
            println!("{} - {}", selection.title, selection.author);
            match &selection.link {
                Some(link) => println!("{link}"),
                None => println!("No video available for this song."),
            }
            println!(
                "voters: {}  score: {:.3}  position: {}",
                selection.voters, selection.composite, selection.rank
            );
        }
    }

    Ok(())
}

pub fn leaderboard(ranking: &[RankedSong], min_score: f64, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(ranking);
    }
    if ranking.is_empty() {
        println!("No eligible song (score >= {min_score}).");
        return Ok(());
    }

    println!("{:>4}  {:>6}  {:>6}  {:>6}  {:>6}  song", "#", "votes", "mean", "stddev", "score");
    for song in ranking {
        let record = &song.record;
        let stddev = record
            .stddev
            .map(|stddev| format!("{stddev:.3}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:>6}  {:>6.3}  {:>6}  {:>6.3}  {} - {}",
            song.rank, record.count, record.mean, stddev, song.composite, record.song.title, record.song.author
        );
    }

    Ok(())
}

pub fn schedule(days: &[DailySelection], min_score: f64, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(days);
    }
    if days.is_empty() {
        println!("No eligible song (score >= {min_score}).");
        return Ok(());
    }

    for day in days {
        println!(
            "{}  #{:<3} {} - {}",
            display_date(day.date),
            day.rank,
            day.title,
            day.author
        );
    }

    Ok(())
}
