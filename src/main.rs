use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use frigate_export_rs::{
    Result,
    config::{Args, Config},
    export::Exporter,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_ansi(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .init();

    let args: Args<Config> = Args::parse();
    let config = args
        .get_config()
        .inspect_err(|err| error!(err = ?err, "Error getting config"))?;
    debug!(config = ?config, "Parsed config successfully");

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let exporter = Exporter::new(config)?;
    exporter
        .run()
        .await
        .inspect_err(|err| error!(err = ?err, "Export run failed"))?;

    info!("Export complete");
    Ok(())
}
