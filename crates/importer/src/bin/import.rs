use clap::{Parser, Subcommand};
use importer::{HistoryReplayer, ImporterError, RosterImporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_storage::{
    models::{Catalog, ScoringPolicy, Submission, SubmissionMode},
    repository::{
        CatalogProvider, HistoryStore, IdentityResolver, JsonFileHistory, OpenRegistration, Roster,
    },
    services::{ScoreAggregator, SubmissionValidator, validation::DEFAULT_ROUTE_CATEGORY},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tally-import")]
#[command(about = "Roster import and history maintenance for the tally tracker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a roster CSV into the ad-hoc roster
    Roster {
        file: PathBuf,

        #[arg(long)]
        validate_only: bool,
    },
    /// Replay the submission history through the validator
    Verify {
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    /// Print the current standings as JSON
    Standings {
        #[arg(long, env = "SUBMISSION_MODE", default_value = "task")]
        mode: SubmissionMode,

        #[arg(long, env = "SCORING_POLICY", default_value = "additive")]
        policy: ScoringPolicy,
    },
}

#[derive(clap::Args)]
struct TrackerArgs {
    #[arg(long, env = "SUBMISSION_MODE", default_value = "task")]
    mode: SubmissionMode,

    #[arg(long, env = "ROSTER_CSV")]
    roster_csv: Option<PathBuf>,

    #[arg(long, env = "CATALOG_PATH")]
    catalog: Option<PathBuf>,

    #[arg(long, env = "ROUTE_CATEGORY", default_value = DEFAULT_ROUTE_CATEGORY)]
    route_category: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "tally_import={},importer={},tally_storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Roster {
            file,
            validate_only,
        } => {
            handle_roster_import(&file, validate_only, &cli.data_dir)?;
        }
        Commands::Verify { tracker } => {
            handle_verify(&tracker, &cli.data_dir)?;
        }
        Commands::Standings { mode, policy } => {
            handle_standings(mode, policy, &cli.data_dir)?;
        }
    }

    Ok(())
}

fn handle_roster_import(
    file: &Path,
    validate_only: bool,
    data_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Loading roster CSV from: {}", file.display());
    let csv = std::fs::read_to_string(file)?;

    let roster = Roster::load(None, Some(data_dir.join("adhoc-people.json")))?;

    let report = RosterImporter::import(&csv, &roster, validate_only)?;
    report.log_warnings();
    tracing::info!("✓ Validation successful! {} row(s) parsed", report.parsed);

    if validate_only {
        return Ok(());
    }

    for id in &report.skipped {
        tracing::debug!("  Skipped existing person {}", id);
    }
    tracing::info!(
        "✓ Roster import completed: {} added, {} already present",
        report.added.len(),
        report.skipped.len()
    );

    Ok(())
}

fn handle_verify(args: &TrackerArgs, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let history = load_history(data_dir)?;
    tracing::info!("Replaying {} record(s) in {} mode", history.len(), args.mode);

    let roster = Arc::new(Roster::load(
        args.roster_csv.as_deref(),
        Some(data_dir.join("adhoc-people.json")),
    )?);

    let catalog: Arc<dyn CatalogProvider> = match (&args.catalog, args.mode) {
        (Some(path), _) => Arc::new(Catalog::from_file(path)?),
        (None, SubmissionMode::Task) => roster.clone(),
        (None, SubmissionMode::Lane) => Arc::new(Catalog::speed_lanes()),
        (None, SubmissionMode::Climb) => {
            return Err(ImporterError::ConfigError(
                "--catalog is required in climb mode".to_string(),
            )
            .into());
        }
    };

    let identities: Arc<dyn IdentityResolver> = match args.mode {
        SubmissionMode::Climb => Arc::new(OpenRegistration),
        SubmissionMode::Task | SubmissionMode::Lane => roster,
    };

    let validator = SubmissionValidator::new(args.mode).with_route_category(&args.route_category);
    let report = HistoryReplayer::new(&validator, catalog.as_ref(), identities.as_ref())
        .replay(&history)?;
    report.log_warnings();

    tracing::info!(
        "✓ History verified: {} record(s) accepted, {} warning(s)",
        report.accepted,
        report.warnings.len()
    );

    Ok(())
}

fn handle_standings(
    mode: SubmissionMode,
    policy: ScoringPolicy,
    data_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let history = load_history(data_dir)?;
    let aggregator = ScoreAggregator::new(policy);

    let json = match mode {
        SubmissionMode::Task => serde_json::to_string_pretty(&aggregator.summarize(&history))?,
        SubmissionMode::Climb => serde_json::to_string_pretty(&aggregator.aggregate(&history))?,
        SubmissionMode::Lane => {
            serde_json::to_string_pretty(&aggregator.speed_leaderboard(&history))?
        }
    };

    println!("{}", json);

    Ok(())
}

fn load_history(data_dir: &Path) -> Result<Vec<Submission>, Box<dyn std::error::Error>> {
    let path = data_dir.join("submissions.json");
    tracing::info!("Loading submission history from: {}", path.display());

    let store = JsonFileHistory::open(path)?;
    Ok(store.all_records()?)
}
