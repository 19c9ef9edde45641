use std::path::Path;

use args::Args;
use clap::Parser;
use rate_limit::RateLimitManager;
use tokio::io::{AsyncBufRead, BufReader};

mod args;
mod logger;
mod replay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args);

    let config = args.config()?;
    let _telemetry = telemetry::init(&config.telemetry)?;

    let manager = RateLimitManager::new(&config.rate_limits);

    log::info!(
        "Replaying requests with {} requests per {:?} per route and client",
        manager.limit(),
        manager.window()
    );

    let input = open_input(args.input.as_deref()).await?;
    let mut output = tokio::io::stdout();

    let summary = replay::replay(&manager, input, &mut output, args.purge_every).await?;

    log::info!(
        "Replayed {} requests: {} allowed, {} rejected, {} skipped, {} windows purged, {} keys tracked",
        summary.allowed + summary.rejected + summary.skipped,
        summary.allowed,
        summary.rejected,
        summary.skipped,
        summary.purged,
        manager.len()
    );

    Ok(())
}

async fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin>> {
    let input: Box<dyn AsyncBufRead + Unpin> = match path {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    Ok(input)
}
