use clap::{Parser, Subcommand};
use ritualtrack_core::storage::Config;

mod commands;

#[derive(Parser)]
#[command(name = "ritualtrack", version, about = "Ritualtrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's progress at a glance
    Status(commands::status::StatusArgs),
    /// Record initial and current weight
    Weight {
        #[command(subcommand)]
        action: commands::weight::WeightAction,
    },
    /// Today's checklist
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Confirm today's ritual
    Confirm,
    /// Clear all progress and restart the journey today
    Reset(commands::reset::ResetArgs),
    /// Set the display name
    Name(commands::name::NameArgs),
    /// Journey phases and timeline
    Phase(commands::phase::PhaseArgs),
    /// Achieved and pending milestones
    Milestones(commands::milestones::MilestonesArgs),
    /// Weight trend interpretation
    Trend(commands::trend::TrendArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so stdout stays machine readable. `RUST_LOG` wins over the
/// configured level.
fn init_tracing() {
    let level = Config::load_or_default().logging.level;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Status(args) => commands::status::run(args),
        Commands::Weight { action } => commands::weight::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Confirm => commands::confirm::run(),
        Commands::Reset(args) => commands::reset::run(args),
        Commands::Name(args) => commands::name::run(args),
        Commands::Phase(args) => commands::phase::run(args),
        Commands::Milestones(args) => commands::milestones::run(args),
        Commands::Trend(args) => commands::trend::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
