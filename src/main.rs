use std::{io, process::ExitCode};

use kube::Client;
use kube_api_categories::{
    claputil::CompleteEnv,
    cli::{self, Cli},
    discover::{CachedDiscovery, client::DiscoverClient},
    run,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Logs go to stderr so the projection on stdout stays clean.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kube_api_categories={level}")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

async fn try_main(cli: Cli) -> anyhow::Result<()> {
    let options = cli.options()?;

    let config = cli.kube_config().await?;
    let cache_path = cli.cache_path(&config);
    debug!("Discovery cache path: {cache_path:?}");

    let client = Client::try_from(config)?;
    let gateway = CachedDiscovery::new(DiscoverClient::new(client), cache_path, cli.cached);

    run(&gateway, &options, &mut io::stdout()).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    CompleteEnv::with_factory(|| cli::command_with_name(cli::command_name())).complete();

    let cli = Cli::parse_env();
    init_logging(cli.verbose);
    debug!("Version: {}", env!("CARGO_PKG_VERSION"));

    match try_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
