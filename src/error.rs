// src/error.rs

use thiserror::Error;

/// A fatal, pipeline-aborting failure. Both variants are caught once at the
/// top level, routed to the notifier, and mapped to a non-zero exit code.
/// Per-record quote failures are not errors at all; they are recovered
/// in-place as a zero price.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetching holdings page failed: {0}")]
    Fetch(anyhow::Error),

    /// The placeholder density in the secondary column says the session
    /// cookie has expired and the site is serving the unauthenticated view.
    #[error(
        "stale session suspected: {placeholder_rows} of {sample_size} secondary rows \
         are placeholders (cookie needs rotating)"
    )]
    StaleSession {
        placeholder_rows: usize,
        sample_size: usize,
    },

    #[error("writing output failed: {0}")]
    Persist(anyhow::Error),
}

impl PipelineError {
    pub fn is_stale_session(&self) -> bool {
        matches!(self, PipelineError::StaleSession { .. })
    }
}
