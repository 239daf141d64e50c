use anyhow::Result;
use b2sync::cli::{run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(report) => tracing::info!(?report, "b2sync finished"),
        Err(e) => tracing::error!(error = %e, "b2sync failed"),
    }
    result.map(|_| ())
}
