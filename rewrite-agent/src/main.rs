//! Rewrite Agent Binary Entry Point

use clap::Parser;
use rewrite_agent::{init_logging, run, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args.logging_config())?;

    tokio::select! {
        result = run(args) => {
            if let Err(e) = result {
                tracing::error!("Rewrite agent failed: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping...");
        }
    }

    Ok(())
}
