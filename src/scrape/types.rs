// src/scrape/types.rs

use serde::{Deserialize, Serialize};

/// One entity from the primary holdings tables.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct BaseRecord {
    pub name: String,
    pub ticker_or_country: String,
    pub btc_holdings: String,
}

/// Secondary fields from the fourth table, merged onto base records by
/// position (row i of extra goes with row i of base, no key join).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct ExtraRecord {
    pub extra_val_1: String,
    pub extra_val_2: String,
}

/// The output row: base fields, extra fields when the index was in range,
/// and a live price that is always present (0 when unpriced).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CombinedRecord {
    pub name: String,
    pub ticker_or_country: String,
    pub btc_holdings: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_val_1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_val_2: Option<String>,
    pub live_price: f64,
}
