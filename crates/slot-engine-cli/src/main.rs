use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use slot_engine::{
    compress_to_ranges_with, day_status, expand_to_blocks_with, group_by_hour,
    plan_day_with_options, Appointment, BlockSelection, EngineConfig, WeeklySchedule,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Plan appointment slots and convert weekly availability"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Settings {
    /// JSON engine configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// IANA timezone the schedule is read in
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Slot length in minutes
    #[arg(long, global = true, allow_negative_numbers = true)]
    slot_minutes: Option<i64>,

    /// Editor block size in minutes
    #[arg(long, global = true, allow_negative_numbers = true)]
    block_minutes: Option<i64>,
}

#[derive(Subcommand)]
enum Command {
    /// List the bookable slots for a date
    Plan {
        /// Calendar date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Weekly schedule JSON ('-' for stdin); default operating window if omitted
        #[arg(long)]
        schedule: Option<PathBuf>,

        /// Existing appointments JSON array ('-' for stdin)
        #[arg(long)]
        appointments: Option<PathBuf>,

        /// Current instant (RFC 3339); defaults to the system clock
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Group slots by local start hour
        #[arg(long)]
        group: bool,

        /// Drop duplicate slots from overlapping ranges
        #[arg(long)]
        dedupe: bool,

        /// Fail on errors instead of printing an empty day
        #[arg(long)]
        strict: bool,
    },
    /// Expand a weekly schedule into editor blocks
    Expand {
        /// Weekly schedule JSON ('-' for stdin)
        #[arg(long)]
        schedule: PathBuf,
    },
    /// Compress editor blocks into a weekly schedule
    Compress {
        /// Block selection JSON ('-' for stdin)
        #[arg(long)]
        blocks: PathBuf,
    },
    /// Report whether a date is a weekend, has no hours, or is open
    Day {
        /// Calendar date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Weekly schedule JSON ('-' for stdin); default operating window if omitted
        #[arg(long)]
        schedule: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.settings)?;
    debug!(?config, "loaded configuration");

    match cli.command {
        Command::Plan {
            date,
            schedule,
            appointments,
            now,
            group,
            dedupe,
            strict,
        } => {
            if schedule.as_deref() == Some(Path::new("-"))
                && appointments.as_deref() == Some(Path::new("-"))
            {
                bail!("only one of --schedule and --appointments can read stdin");
            }
            let now = now.unwrap_or_else(Utc::now);
            let planned = plan(
                &config,
                date,
                schedule.as_deref(),
                appointments.as_deref(),
                now,
                dedupe,
            );

            match planned {
                Ok(slots) if group => {
                    let tz = config.tz()?;
                    print_json(&group_by_hour(&slots, &tz))
                }
                Ok(slots) => print_json(&slots),
                Err(e) if strict => Err(e),
                Err(e) => {
                    // A broken schedule for one day must not block browsing others.
                    warn!(%date, "no availability shown: {e:#}");
                    print_json(&Vec::<()>::new())
                }
            }
        }
        Command::Expand { schedule } => {
            let schedule = read_schedule(&schedule)?;
            let blocks = expand_to_blocks_with(&schedule, config.block_minutes, &config.shifts)?;
            print_json(&blocks)
        }
        Command::Compress { blocks } => {
            let raw = read_input(&blocks)?;
            let selection = BlockSelection::from_json(&raw)
                .with_context(|| format!("parsing blocks from {}", blocks.display()))?;
            let schedule =
                compress_to_ranges_with(&selection, config.block_minutes, &config.shifts)?;
            print_json(&schedule)
        }
        Command::Day { date, schedule } => {
            let schedule = match schedule {
                Some(path) => read_schedule(&path)?,
                None => WeeklySchedule::default_window(),
            };
            print_json(&day_status(date, &schedule))
        }
    }
}

fn plan(
    config: &EngineConfig,
    date: NaiveDate,
    schedule: Option<&Path>,
    appointments: Option<&Path>,
    now: DateTime<Utc>,
    dedupe: bool,
) -> Result<Vec<slot_engine::Slot>> {
    let schedule = schedule.map(read_schedule).transpose()?;
    let appointments = match appointments {
        Some(path) => read_appointments(path)?,
        None => Vec::new(),
    };

    let mut options = config.plan_options()?;
    options.dedupe = dedupe;
    let slots = plan_day_with_options(date, schedule.as_ref(), &appointments, now, &options)?;
    Ok(slots)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// File configuration first, then flag overrides, validated as a whole.
fn load_config(settings: &Settings) -> Result<EngineConfig> {
    let mut config = match &settings.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Some(timezone) = &settings.timezone {
        config.timezone = timezone.clone();
    }
    if let Some(minutes) = settings.slot_minutes {
        config.slot_minutes = minutes;
    }
    if let Some(minutes) = settings.block_minutes {
        config.block_minutes = minutes;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_schedule(path: &Path) -> Result<WeeklySchedule> {
    let raw = read_input(path)?;
    WeeklySchedule::from_json(&raw)
        .with_context(|| format!("parsing schedule from {}", path.display()))
}

fn read_appointments(path: &Path) -> Result<Vec<Appointment>> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing appointments from {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}
