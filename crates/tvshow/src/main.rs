//! tvshow CLI

use std::io::{self, Write};

use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use tracing_subscriber::EnvFilter;

use tvshow::area::{self, AREAS, DEFAULT_AREA};
use tvshow::client::BASE_URL;
use tvshow::{ATTRIBUTION, Program, ScheduleClient, schedule};

#[derive(Debug, Parser)]
#[command(name = "tvshow")]
#[command(version, about = "Display Japanese TV schedules in the terminal")]
struct Cli {
    /// Broadcast area, by name or group id
    #[arg(short, long, default_value = DEFAULT_AREA)]
    area: String,

    /// List the known areas and exit
    #[arg(long)]
    list_areas: bool,

    /// Include programs that have already ended
    #[arg(long)]
    all: bool,

    /// Day to show (YYYYMMDD or YYYY-MM-DD); defaults to today
    #[arg(short, long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Schedule site root
    #[arg(long, env = "TVSHOW_ENDPOINT", default_value = BASE_URL, hide = true)]
    endpoint: String,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| format!("invalid date '{s}' (expected YYYYMMDD or YYYY-MM-DD)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    if cli.list_areas {
        for a in AREAS {
            writeln!(out, "{:>4}  {}", a.id, a.name)?;
        }
        return Ok(());
    }

    let area = area::find(&cli.area).with_context(|| {
        format!("invalid area '{}' (see `tvshow --list-areas`)", cli.area)
    })?;

    let now = Local::now().naive_local();
    let date = cli.date.unwrap_or_else(|| now.date());

    let client = ScheduleClient::new(cli.endpoint)?;
    let programs = client
        .fetch(date, area)
        .await
        .with_context(|| format!("Failed to fetch the {} schedule for {date}", area.name))?;

    let color = io::stdout().is_tty();
    let shown: Vec<&Program> = if cli.all {
        programs.iter().collect()
    } else {
        schedule::upcoming(&programs, now).collect()
    };
    for program in shown {
        if color {
            writeln!(
                out,
                "{} {} {}",
                format!(
                    "{}~{}",
                    program.start.format("%H:%M"),
                    program.end.format("%H:%M")
                )
                .cyan(),
                program.name.as_str().bold(),
                format!("[{}]", program.id).dark_grey()
            )?;
        } else {
            writeln!(out, "{program}")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{ATTRIBUTION}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_in_both_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(parse_date("20240101").unwrap(), expected);
        assert_eq!(parse_date("2024-01-01").unwrap(), expected);
        assert!(parse_date("2024/01/01").is_err());
    }

    #[test]
    fn defaults_to_tokyo() {
        let cli = Cli::try_parse_from(["tvshow"]).unwrap();
        assert_eq!(cli.area, "東京");
        assert!(!cli.all);
    }
}
