// src/enrich/mod.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::QuoteConfig;
use crate::scrape::{BaseRecord, CombinedRecord, ExtraRecord};

/// Source of previous-close prices. The live implementation talks to the
/// quote provider; tests substitute a stub so the merge logic runs without
/// the network.
#[allow(async_fn_in_trait)]
pub trait QuoteSource {
    async fn previous_close(&self, ticker: &str) -> Result<f64>;
}

/// `true` when the identifier plausibly names a tradable symbol rather
/// than a country: purely alphabetic and short. "MSTR" passes, "Germany"
/// and "3350" do not.
pub fn is_ticker_candidate(ident: &str, max_len: usize) -> bool {
    !ident.is_empty()
        && ident.chars().count() <= max_len
        && ident.chars().all(char::is_alphabetic)
}

fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Merge base and extra records by position and attach a live price.
///
/// Quote failures are recovered per record: the row keeps a price of 0 and
/// the run continues. Only the fetch and the freshness gate can abort a
/// run, a flaky symbol lookup never does.
pub async fn combine(
    base: Vec<BaseRecord>,
    extra: Vec<ExtraRecord>,
    quotes: &impl QuoteSource,
    config: &QuoteConfig,
) -> Vec<CombinedRecord> {
    let mut out = Vec::with_capacity(base.len());
    for (i, record) in base.into_iter().enumerate() {
        let (extra_val_1, extra_val_2) = match extra.get(i) {
            Some(e) => (Some(e.extra_val_1.clone()), Some(e.extra_val_2.clone())),
            None => (None, None),
        };

        let live_price = if is_ticker_candidate(&record.ticker_or_country, config.max_ticker_len) {
            match quotes.previous_close(&record.ticker_or_country).await {
                Ok(price) => round_price(price),
                Err(e) => {
                    warn!(ticker = %record.ticker_or_country, error = %e, "quote lookup failed; using 0");
                    0.0
                }
            }
        } else {
            0.0
        };

        out.push(CombinedRecord {
            name: record.name,
            ticker_or_country: record.ticker_or_country,
            btc_holdings: record.btc_holdings,
            extra_val_1,
            extra_val_2,
            live_price,
        });
    }
    out
}

// ---- live provider -------------------------------------------------------

/// Previous close via the provider's v8 chart endpoint; the meta block of
/// a 1-day chart carries the prior session's close.
pub struct YahooQuoteClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
}

impl YahooQuoteClient {
    pub fn new(config: &QuoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building quote http client")?;
        Ok(YahooQuoteClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl QuoteSource for YahooQuoteClient {
    async fn previous_close(&self, ticker: &str) -> Result<f64> {
        let url = format!(
            "{}/v8/finance/chart/{}?range=1d&interval=1d",
            self.base_url, ticker
        );
        debug!(%ticker, "fetching quote");
        let body: ChartResponse = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status for {}", ticker))?
            .json()
            .await
            .with_context(|| format!("decoding chart response for {}", ticker))?;

        let meta = body
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .map(|r| r.meta)
            .ok_or_else(|| anyhow!("no chart result for {}", ticker))?;

        meta.chart_previous_close
            .or(meta.previous_close)
            .ok_or_else(|| anyhow!("no previous close for {}", ticker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FixedQuote(f64);

    impl QuoteSource for FixedQuote {
        async fn previous_close(&self, _ticker: &str) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct FailingQuote;

    impl QuoteSource for FailingQuote {
        async fn previous_close(&self, ticker: &str) -> Result<f64> {
            Err(anyhow!("no such symbol {ticker}"))
        }
    }

    fn base(ticker: &str) -> BaseRecord {
        BaseRecord {
            name: "Some Corp".into(),
            ticker_or_country: ticker.into(),
            btc_holdings: "1,000".into(),
        }
    }

    #[test]
    fn ticker_candidate_heuristic() {
        assert!(is_ticker_candidate("AAPL", 5));
        assert!(is_ticker_candidate("MSTR", 5));
        assert!(!is_ticker_candidate("Germany", 5)); // too long
        assert!(!is_ticker_candidate("3350", 5)); // not alphabetic
        assert!(!is_ticker_candidate("BRK.B", 5)); // symbol-laden
        assert!(!is_ticker_candidate("", 5));
    }

    #[tokio::test]
    async fn successful_lookup_rounds_to_two_decimals() {
        let rows = combine(
            vec![base("AAPL")],
            vec![],
            &FixedQuote(172.345),
            &QuoteConfig::default(),
        )
        .await;
        assert_eq!(rows[0].live_price, 172.35);
    }

    #[tokio::test]
    async fn non_candidates_get_zero_without_lookup() {
        // FailingQuote would error if consulted; "Germany" must never reach it.
        let rows = combine(
            vec![base("Germany")],
            vec![],
            &FailingQuote,
            &QuoteConfig::default(),
        )
        .await;
        assert_eq!(rows[0].live_price, 0.0);
    }

    #[tokio::test]
    async fn failed_lookup_recovers_to_zero() {
        let rows = combine(
            vec![base("MSTR")],
            vec![],
            &FailingQuote,
            &QuoteConfig::default(),
        )
        .await;
        assert_eq!(rows[0].live_price, 0.0);
    }

    #[tokio::test]
    async fn extras_merge_by_position_and_run_out() {
        let extras = vec![ExtraRecord {
            extra_val_1: "$1.2B".into(),
            extra_val_2: "1.4x".into(),
        }];
        let rows = combine(
            vec![base("Germany"), base("France")],
            extras,
            &FixedQuote(10.0),
            &QuoteConfig::default(),
        )
        .await;
        assert_eq!(rows[0].extra_val_1.as_deref(), Some("$1.2B"));
        assert_eq!(rows[1].extra_val_1, None);
        assert_eq!(rows[1].extra_val_2, None);
    }

    #[test]
    fn chart_meta_falls_back_to_previous_close() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart":{"result":[{"meta":{"previousClose":42.125}}]}}"#,
        )
        .unwrap();
        let result = body.chart.result.unwrap();
        let meta = &result[0].meta;
        assert_eq!(meta.chart_previous_close, None);
        assert_eq!(meta.previous_close, Some(42.125));
    }
}
