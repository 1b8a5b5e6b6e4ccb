use clap::Parser;
use strava_client::http_client::ReqwestStravaClient;
use strava_rewriter::cli::Cli;
use strava_rewriter::{Translator, rewriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configure logging from env var `STRAVA_REWRITER_LOG_LEVEL` (or fallback to `RUST_LOG`).
    // `--debug` lowers the default to `debug` and always enables the client's
    // response dumps, whatever the env filter says.
    let default_level = if cli.debug { "debug" } else { "info" };
    let log_env = std::env::var("STRAVA_REWRITER_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());
    let mut combined_filter = format!("{},hyper_util=warn,reqwest=warn", log_env);
    if cli.debug {
        combined_filter.push_str(",strava_client=debug");
    }
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("strava-rewriter: log filter: {}", log_env);

    let client = ReqwestStravaClient::from_config(&cli.client_config(), cli.debug)?;

    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("strava-rewriter: interrupted, cancelling in-flight request");
            let _ = cancel_tx.send(true);
        }
    });

    let mut opts = cli.rewrite_options();
    opts.cancel = Some(cancel_rx);

    let summary = rewriter::run(&client, &Translator::new(), &opts).await?;
    tracing::info!(
        "strava-rewriter: done, {} of {} activities translated",
        summary.translated,
        summary.fetched
    );

    Ok(())
}
