use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "nightshift-cli", version, about = "Nightshift CLI")]
struct Cli {
    /// Show debug-level logs
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Setup logging based on verbosity level. The core logs through the
/// `log` facade; the subscriber's log bridge picks those records up.
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Subcommand)]
enum Commands {
    /// Blocker schedule management
    Blocker {
        #[command(subcommand)]
        action: commands::blocker::BlockerAction,
    },
    /// Sleep-time settings
    Sleep {
        #[command(subcommand)]
        action: commands::sleep::SleepAction,
    },
    /// Snooze the active blocker
    Snooze {
        #[command(subcommand)]
        action: commands::snooze::SnoozeAction,
    },
    /// Run the bedtime check once
    Check(commands::check::CheckArgs),
    /// Foreground poll loop (stand-in for the OS background task)
    Watch(commands::watch::WatchArgs),
    /// Bedtime adherence statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Sleep streak
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let result = match cli.command {
        Commands::Blocker { action } => commands::blocker::run(action).await,
        Commands::Sleep { action } => commands::sleep::run(action),
        Commands::Snooze { action } => commands::snooze::run(action).await,
        Commands::Check(args) => commands::check::run(args).await,
        Commands::Watch(args) => commands::watch::run(args).await,
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "nightshift-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
