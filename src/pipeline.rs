// src/pipeline.rs

use std::path::PathBuf;
use tracing::info;

use crate::{
    config::Config,
    enrich::{self, QuoteSource},
    error::PipelineError,
    fetch, persist, scrape, validate,
};

/// What a successful run produced, for the final log line.
#[derive(Debug)]
pub struct RunSummary {
    pub records: usize,
    pub priced: usize,
    pub output_path: PathBuf,
}

/// One full scrape-validate-enrich-persist pass.
///
/// Strictly sequential: fetch, extract, freshness gate, price merge, write.
/// A fatal error anywhere leaves the previous output file untouched.
pub async fn run(config: &Config, quotes: &impl QuoteSource) -> Result<RunSummary, PipelineError> {
    let html = fetch::fetch_page(&config.source)
        .await
        .map_err(PipelineError::Fetch)?;
    run_on_page(&html, config, quotes).await
}

/// The pipeline from a fetched page onward. Split out so the whole flow
/// past the network fetch is exercisable against fixture HTML.
pub async fn run_on_page(
    html: &str,
    config: &Config,
    quotes: &impl QuoteSource,
) -> Result<RunSummary, PipelineError> {
    let extraction = scrape::extract(html, &config.tables);
    info!(
        base = extraction.base.len(),
        extra = extraction.extra.len(),
        "extracted records"
    );

    validate::check_freshness(&extraction.extra, &config.freshness)?;

    let records = enrich::combine(extraction.base, extraction.extra, quotes, &config.quotes).await;
    let priced = records.iter().filter(|r| r.live_price != 0.0).count();

    persist::write_json(&records, &config.output.path).map_err(PipelineError::Persist)?;

    Ok(RunSummary {
        records: records.len(),
        priced,
        output_path: config.output.path.clone(),
    })
}
