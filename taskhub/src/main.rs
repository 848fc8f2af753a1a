use clap::Parser;
use tokio_util::sync::CancellationToken;

use taskhub::app::App;
use taskhub::config::Config;
use taskhub::utils::cli::Args;
use taskhub::utils::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::try_from(args)?;

    init_tracing(config.log_level);
    tracing::info!(config = %config, "starting taskhub");

    let app = App::new(config).await?;
    app.run(CancellationToken::new()).await
}
