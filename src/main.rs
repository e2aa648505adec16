use clap::Parser;
use levelkit::cli::{load_config, run_move, MoveArgs};
use levelkit::{init_logging, MoveOutcome, BUILD_DATE, VERSION};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let args = MoveArgs::parse();

    // Initialize logging
    init_logging()?;
    info!("LevelKit {} (built {})", VERSION, BUILD_DATE);

    let request = args.request();
    let config = load_config(args.config.as_deref())?;
    let report = run_move(&config, &request)?;

    for segment in &report.segments {
        println!("{}", segment);
    }

    match report.outcome {
        MoveOutcome::Moved(end) => info!("{} segments, now at {}", report.segments.len(), end),
        MoveOutcome::Interrupted { reached } => warn!("Move interrupted at {}", reached),
        MoveOutcome::Unreachable => anyhow::bail!("Destination {} is unreachable", request.end),
    }

    Ok(())
}
