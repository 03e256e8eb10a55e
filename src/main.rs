use anyhow::Result;
use datscraper::{config::Config, enrich::YahooQuoteClient, notify::Notifier, pipeline};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,datscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;
    info!(config = %config_path, url = %config.source.url, "configured");

    // ─── 3) wire collaborators once, up front ────────────────────────
    let notifier = Notifier::from_config(&config.mail)?;
    let quotes = YahooQuoteClient::new(&config.quotes)?;

    // ─── 4) run, notify, set exit status ─────────────────────────────
    match pipeline::run(&config, &quotes).await {
        Ok(summary) => {
            // success is logged only; mail goes out on failure alone
            info!(
                records = summary.records,
                priced = summary.priced,
                path = %summary.output_path.display(),
                "update succeeded"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "update failed");
            notifier.report_failure(&err).await;
            // distinguishable status so a scheduler can alert independently
            // of mail delivery
            std::process::exit(1);
        }
    }
}
