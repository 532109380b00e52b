//! Cohort Cadence CLI
//!
//! Outreach cadence analytics for program cohorts.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use cohort_cadence::{
    config::Config,
    core::{self, GapStatus},
    Clock, FixedClock, JsonFileStore, NewCohort, NewTouchpoint, RecordStore, Snapshot, VERSION,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cohort-cadence")]
#[command(version = VERSION)]
#[command(about = "Outreach cadence analytics for program cohorts", long_about = None)]
struct Cli {
    /// Path to the record store (overrides the configured path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Reference day as YYYY-MM-DD (defaults to today in the configured timezone)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty record store
    Init,

    /// Add a cohort
    AddCohort {
        #[arg(long)]
        name: String,

        #[arg(long)]
        start_date: NaiveDate,

        #[arg(long)]
        end_date: NaiveDate,

        /// Number of participants
        #[arg(long)]
        size: u32,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Add a touchpoint to a cohort
    AddTouchpoint {
        /// Cohort id or name
        #[arg(long)]
        cohort: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        date: NaiveDate,

        /// Left blank, the touchpoint counts as "Unassigned"
        #[arg(long, default_value = "")]
        owner: String,

        /// Left blank, the touchpoint counts as "Unspecified"
        #[arg(long, default_value = "")]
        channel: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// List cohorts by start date
    ListCohorts,

    /// Touchpoints in the next N days
    Upcoming {
        #[arg(long)]
        days: Option<u32>,
    },

    /// Record counts plus upcoming touchpoints
    Summary {
        #[arg(long)]
        days: Option<u32>,
    },

    /// Lifecycle and staleness of every cohort
    Status {
        #[arg(long)]
        stale_days: Option<u32>,

        #[arg(long)]
        lookahead: Option<u32>,
    },

    /// Classify cohorts as at-risk, stale, unscheduled or on-track
    GapReport {
        #[arg(long)]
        lookback: Option<u32>,

        #[arg(long)]
        lookahead: Option<u32>,

        /// Only list cohorts with this status
        #[arg(long)]
        status: Option<GapStatus>,
    },

    /// Spacing between consecutive touchpoints per cohort
    CadenceMetrics {
        /// Flag cohorts whose largest gap exceeds this many days
        #[arg(long)]
        max_gap: Option<u32>,
    },

    /// Detail for a single cohort
    CohortReport {
        /// Cohort id or name
        #[arg(long)]
        cohort: String,

        #[arg(long)]
        lookback: Option<u32>,

        #[arg(long)]
        lookahead: Option<u32>,
    },

    /// Touchpoints per owner in the next N days
    OwnerLoad {
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Owner workload against the average
    OwnerBalance {
        #[arg(long)]
        days: Option<u32>,

        /// Fractional tolerance around the average
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Touchpoints per channel around today
    ChannelReport {
        #[arg(long)]
        lookback: Option<u32>,

        #[arg(long)]
        lookahead: Option<u32>,

        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        cohort: Option<String>,
    },

    /// Touchpoints per weekday around today
    WeekdayReport {
        #[arg(long)]
        lookback: Option<u32>,

        #[arg(long)]
        lookahead: Option<u32>,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Upcoming touchpoints grouped by week
    WeeklyAgenda {
        #[arg(long)]
        weeks: Option<u32>,

        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        cohort: Option<String>,
    },

    /// Weeks with and without touchpoints per cohort
    CoverageReport {
        #[arg(long)]
        weeks: Option<u32>,

        #[arg(long)]
        cohort: Option<String>,
    },

    /// Weekly touchpoint counts per owner
    OwnerCapacity {
        #[arg(long)]
        weeks: Option<u32>,

        /// Weekly limit per owner
        #[arg(long = "limit")]
        weekly_limit: Option<u32>,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Days on which an owner exceeds a daily limit
    OwnerConflicts {
        #[arg(long)]
        days: Option<u32>,

        /// Daily limit per owner
        #[arg(long = "limit")]
        daily_limit: Option<u32>,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Cohorts that need a new touchpoint, with a date and an owner
    ActionPlan {
        #[arg(long)]
        target_gap: Option<u32>,

        #[arg(long)]
        lookahead: Option<u32>,
    },

    /// Show configuration
    Config {
        /// Write the effective configuration, defaults included, to the config file
        #[arg(long)]
        write: bool,
    },
}

/// Everything a command needs, resolved once from config and global flags.
struct Session {
    config: Config,
    store: JsonFileStore,
    today: NaiveDate,
    now: DateTime<Utc>,
}

impl Session {
    fn open(store: Option<PathBuf>, today: Option<NaiveDate>) -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let clock: Box<dyn Clock> = match today {
            Some(day) => Box::new(FixedClock::new(day, Utc::now())),
            None => Box::new(config.clock()?),
        };
        let (today, now) = (clock.today(), clock.now());
        let store = JsonFileStore::new(store.unwrap_or_else(|| config.store_path.clone()));
        debug!(store = %store.path().display(), %today, "Opened session");
        Ok(Self {
            config,
            store,
            today,
            now,
        })
    }

    fn load(&self) -> Result<Snapshot> {
        Ok(self.store.load()?)
    }

    /// Print a report wrapped with when and for which day it was built.
    fn emit<T: Serialize>(&self, report: &T) -> Result<()> {
        let envelope = Envelope {
            generated_at: self.now,
            today: self.today,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    generated_at: DateTime<Utc>,
    today: NaiveDate,
    #[serde(flatten)]
    report: &'a T,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { write } = cli.command {
        return cmd_config(write);
    }

    let session = Session::open(cli.store, cli.today)?;
    let defaults = session.config.defaults.clone();
    let today = session.today;

    match cli.command {
        Commands::Init => cmd_init(&session),
        Commands::AddCohort {
            name,
            start_date,
            end_date,
            size,
            notes,
        } => cmd_add_cohort(
            &session,
            NewCohort {
                name,
                start_date,
                end_date,
                size,
                notes,
            },
        ),
        Commands::AddTouchpoint {
            cohort,
            title,
            date,
            owner,
            channel,
            notes,
        } => cmd_add_touchpoint(
            &session,
            NewTouchpoint {
                cohort,
                title,
                date,
                owner,
                channel,
                notes,
            },
        ),
        Commands::ListCohorts => cmd_list_cohorts(&session),
        Commands::Upcoming { days } => {
            let days = days.unwrap_or(defaults.upcoming_days);
            session.emit(&core::upcoming(&session.load()?, today, days))
        }
        Commands::Summary { days } => {
            let days = days.unwrap_or(defaults.upcoming_days);
            session.emit(&core::summary(&session.load()?, today, days))
        }
        Commands::Status {
            stale_days,
            lookahead,
        } => session.emit(&core::cadence_status(
            &session.load()?,
            today,
            stale_days.unwrap_or(defaults.stale_days),
            lookahead.unwrap_or(defaults.lookahead_days),
        )),
        Commands::GapReport {
            lookback,
            lookahead,
            status,
        } => {
            let mut report = core::gap_report(
                &session.load()?,
                today,
                lookback.unwrap_or(defaults.lookback_days),
                lookahead.unwrap_or(defaults.lookahead_days),
            );
            if let Some(status) = status {
                report.retain_status(status);
            }
            session.emit(&report)
        }
        Commands::CadenceMetrics { max_gap } => session.emit(&core::cadence_metrics(
            &session.load()?,
            today,
            max_gap.or(defaults.max_gap_days),
        )),
        Commands::CohortReport {
            cohort,
            lookback,
            lookahead,
        } => session.emit(&core::cohort_report(
            &session.load()?,
            today,
            &cohort,
            lookback.unwrap_or(defaults.lookback_days),
            lookahead.unwrap_or(defaults.lookahead_days),
        )?),
        Commands::OwnerLoad { days, owner } => session.emit(&core::owner_load(
            &session.load()?,
            today,
            days.unwrap_or(defaults.upcoming_days),
            owner.as_deref(),
        )),
        Commands::OwnerBalance { days, threshold } => session.emit(&core::owner_balance(
            &session.load()?,
            today,
            days.unwrap_or(defaults.upcoming_days),
            threshold.unwrap_or(defaults.balance_threshold),
        )),
        Commands::ChannelReport {
            lookback,
            lookahead,
            owner,
            cohort,
        } => session.emit(&core::channel_report(
            &session.load()?,
            today,
            lookback.unwrap_or(defaults.lookback_days),
            lookahead.unwrap_or(defaults.lookahead_days),
            owner.as_deref(),
            cohort.as_deref(),
        )?),
        Commands::WeekdayReport {
            lookback,
            lookahead,
            owner,
        } => session.emit(&core::weekday_report(
            &session.load()?,
            today,
            lookback.unwrap_or(defaults.lookback_days),
            lookahead.unwrap_or(defaults.lookahead_days),
            owner.as_deref(),
        )),
        Commands::WeeklyAgenda {
            weeks,
            owner,
            cohort,
        } => session.emit(&core::weekly_agenda(
            &session.load()?,
            today,
            weeks.unwrap_or(defaults.weeks),
            owner.as_deref(),
            cohort.as_deref(),
        )?),
        Commands::CoverageReport { weeks, cohort } => session.emit(&core::cohort_coverage(
            &session.load()?,
            today,
            weeks.unwrap_or(defaults.weeks),
            cohort.as_deref(),
        )?),
        Commands::OwnerCapacity {
            weeks,
            weekly_limit,
            owner,
        } => session.emit(&core::owner_capacity(
            &session.load()?,
            today,
            weeks.unwrap_or(defaults.weeks),
            weekly_limit.or(defaults.weekly_limit),
            owner.as_deref(),
        )?),
        Commands::OwnerConflicts {
            days,
            daily_limit,
            owner,
        } => session.emit(&core::owner_conflicts(
            &session.load()?,
            today,
            days.unwrap_or(defaults.upcoming_days),
            daily_limit.unwrap_or(defaults.daily_limit),
            owner.as_deref(),
        )),
        Commands::ActionPlan {
            target_gap,
            lookahead,
        } => session.emit(&core::action_plan(
            &session.load()?,
            today,
            target_gap.unwrap_or(defaults.target_gap_days),
            lookahead.unwrap_or(defaults.lookahead_days),
        )),
        Commands::Config { write } => cmd_config(write),
    }
}

fn cmd_init(session: &Session) -> Result<()> {
    let snapshot = session.store.init(session.now)?;
    println!(
        "Initialized cadence store at {} ({} cohorts, {} touchpoints).",
        session.store.path().display(),
        snapshot.cohorts.len(),
        snapshot.touchpoints.len()
    );
    Ok(())
}

fn cmd_add_cohort(session: &Session, input: NewCohort) -> Result<()> {
    let mut snapshot = session.load()?;
    let cohort = snapshot.add_cohort(input, session.now)?;
    session.store.save(&snapshot)?;
    info!(id = %cohort.id, name = %cohort.name, "Added cohort");
    session.emit(&serde_json::json!({ "cohort": cohort }))
}

fn cmd_add_touchpoint(session: &Session, input: NewTouchpoint) -> Result<()> {
    let mut snapshot = session.load()?;
    let touchpoint = snapshot.add_touchpoint(input, session.now)?;
    session.store.save(&snapshot)?;
    info!(id = %touchpoint.id, cohort = %touchpoint.cohort_id, "Added touchpoint");
    session.emit(&serde_json::json!({ "touchpoint": touchpoint }))
}

fn cmd_list_cohorts(session: &Session) -> Result<()> {
    let snapshot = session.load()?;
    let cohorts = snapshot.list_cohorts();
    session.emit(&serde_json::json!({
        "count": cohorts.len(),
        "cohorts": cohorts,
    }))
}

fn cmd_config(write: bool) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    if write {
        config.save().context("Failed to save configuration")?;
        info!(path = %Config::config_path().display(), "Wrote configuration");
    }
    let report = serde_json::json!({
        "config_file": Config::config_path(),
        "config": config,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
