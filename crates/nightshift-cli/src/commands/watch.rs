use std::time::Duration;

use clap::Args;
use serde_json::json;

use nightshift_core::{
    BedtimeChecker, BedtimeDeps, BlockerService, Config, HttpProbe, LogNotifier, NullBridge,
    SystemClock,
};

use crate::common::{open_db, print_json, CliResult};

#[derive(Args)]
pub struct WatchArgs {
    /// Minutes between rounds (defaults to the configured poll interval)
    #[arg(long)]
    pub interval_min: Option<u64>,
    /// Stop after this many rounds (runs until interrupted by default)
    #[arg(long)]
    pub iterations: Option<u64>,
}

/// Foreground loop doing what the OS background task would: re-evaluate
/// every blocker schedule and run the bedtime check, every interval.
pub async fn run(args: WatchArgs) -> CliResult {
    let config = Config::load_or_default();
    let db = open_db()?;
    let clock = SystemClock;
    let bridge = NullBridge;
    let probe = HttpProbe::from_config(&config)?;
    let notifier = LogNotifier;

    let service = BlockerService::new(&db, &bridge, &clock);
    let checker = BedtimeChecker::new(
        &db,
        BedtimeDeps {
            clock: &clock,
            probe: &probe,
            notifier: &notifier,
        },
        config.notifications.clone(),
    );

    let interval = Duration::from_secs(
        args.interval_min.unwrap_or(config.bedtime.poll_interval_min) * 60,
    );

    let mut round: u64 = 0;
    loop {
        let applied = service.poll().await;
        let bedtime = checker.run_once().await;
        print_json(&json!({
            "round": round,
            "applied": applied,
            "bedtime": bedtime,
        }))?;

        round += 1;
        if let Some(max) = args.iterations {
            if round >= max {
                break;
            }
        }
        tokio::time::sleep(interval).await;
    }

    Ok(())
}
