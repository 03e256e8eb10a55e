// src/validate/mod.rs

use tracing::{debug, info};

use crate::config::FreshnessConfig;
use crate::error::PipelineError;
use crate::scrape::ExtraRecord;

/// Decide whether the scrape is trustworthy or the session has gone stale.
///
/// The site cannot tell us the cookie expired; it just renders `?` in the
/// secondary value column for unauthenticated requests. So: count rows
/// whose second field carries the placeholder, and only once the sample is
/// big enough to judge (> min_sample), abort when the density crosses the
/// configured ratio. Occasional missing data stays below the bar; a fully
/// expired session blows way past it.
pub fn check_freshness(
    extra: &[ExtraRecord],
    config: &FreshnessConfig,
) -> Result<(), PipelineError> {
    let placeholder_rows = extra
        .iter()
        .filter(|r| r.extra_val_2.contains(&config.placeholder))
        .count();

    if extra.len() <= config.min_sample {
        debug!(
            sample = extra.len(),
            min_sample = config.min_sample,
            "sample too small to judge freshness"
        );
        return Ok(());
    }

    let ratio = placeholder_rows as f64 / extra.len() as f64;
    if ratio > config.max_placeholder_ratio {
        return Err(PipelineError::StaleSession {
            placeholder_rows,
            sample_size: extra.len(),
        });
    }

    info!(
        placeholder_rows,
        sample = extra.len(),
        ratio,
        "freshness check passed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(placeholders: usize, clean: usize) -> Vec<ExtraRecord> {
        let mut out = Vec::new();
        for _ in 0..placeholders {
            out.push(ExtraRecord {
                extra_val_1: "$1.2B".into(),
                extra_val_2: "?".into(),
            });
        }
        for i in 0..clean {
            out.push(ExtraRecord {
                extra_val_1: "$1.2B".into(),
                extra_val_2: format!("{}.4x", i),
            });
        }
        out
    }

    #[test]
    fn dense_placeholders_fail_with_stale_session() {
        let err = check_freshness(&rows(17, 3), &Default::default()).unwrap_err();
        match err {
            PipelineError::StaleSession {
                placeholder_rows,
                sample_size,
            } => {
                assert_eq!(placeholder_rows, 17);
                assert_eq!(sample_size, 20);
            }
            other => panic!("expected StaleSession, got {other}"),
        }
    }

    #[test]
    fn small_samples_never_trigger() {
        // 10 rows, all placeholders: still within the min-sample grace.
        assert!(check_freshness(&rows(10, 0), &Default::default()).is_ok());
        assert!(check_freshness(&rows(0, 0), &Default::default()).is_ok());
    }

    #[test]
    fn ratio_at_exactly_the_threshold_passes() {
        // 16 of 20 is exactly 0.8; the rule is strictly-greater.
        assert!(check_freshness(&rows(16, 4), &Default::default()).is_ok());
        // one more placeholder tips it over
        assert!(check_freshness(&rows(17, 3), &Default::default()).is_err());
    }

    #[test]
    fn placeholder_anywhere_in_field_counts() {
        let mut data = rows(16, 3);
        data.push(ExtraRecord {
            extra_val_1: "x".into(),
            extra_val_2: "1.2x?".into(),
        });
        assert!(check_freshness(&data, &Default::default()).is_err());
    }
}
