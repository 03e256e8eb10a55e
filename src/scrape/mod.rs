// src/scrape/mod.rs

pub mod types;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::TableSchema;
pub use types::{BaseRecord, CombinedRecord, ExtraRecord};

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("CSS selector for tables should be valid"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("CSS selector for rows should be valid"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("CSS selector for cells should be valid"));

/// Everything pulled out of one page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    pub base: Vec<BaseRecord>,
    pub extra: Vec<ExtraRecord>,
}

/// Concatenated, whitespace-stripped text of one cell.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}

/// Text of the configured cell index, or empty when the mapping points past
/// the row (indices are config-supplied, never trusted blindly).
fn mapped_cell(cells: &[ElementRef<'_>], idx: usize) -> String {
    cells.get(idx).copied().map(cell_text).unwrap_or_default()
}

/// Extract base and extra records from the page per the positional schema.
///
/// Tables are addressed by document-order index. Row 0 of each table is the
/// header and skipped; rows with fewer cells than the schema requires are
/// skipped silently. A missing extra table is not an error, the extra set
/// is simply empty.
pub fn extract(html: &str, schema: &TableSchema) -> Extraction {
    let doc = Html::parse_document(html);
    let tables: Vec<ElementRef<'_>> = doc.select(&TABLE_SELECTOR).collect();
    debug!(tables = tables.len(), "parsed holdings page");

    let mut base = Vec::new();
    for &idx in &schema.base.table_indices {
        let Some(table) = tables.get(idx) else {
            warn!(table = idx, "base table missing from page");
            break;
        };
        for row in table.select(&ROW_SELECTOR).skip(1) {
            if base.len() >= schema.base.max_records {
                break;
            }
            let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
            if cells.len() < schema.base.min_cells {
                continue;
            }
            base.push(BaseRecord {
                name: mapped_cell(&cells, schema.base.name_cell),
                ticker_or_country: mapped_cell(&cells, schema.base.ticker_cell),
                btc_holdings: mapped_cell(&cells, schema.base.holdings_cell),
            });
        }
    }

    let mut extra = Vec::new();
    if let Some(table) = tables.get(schema.extra.table_index) {
        for row in table.select(&ROW_SELECTOR).skip(1) {
            if extra.len() >= schema.extra.max_records {
                break;
            }
            let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
            if cells.len() < schema.extra.min_cells {
                continue;
            }
            extra.push(ExtraRecord {
                extra_val_1: mapped_cell(&cells, schema.extra.val1_cell),
                extra_val_2: mapped_cell(&cells, schema.extra.val2_cell),
            });
        }
    } else {
        debug!(
            table = schema.extra.table_index,
            "extra table missing; continuing without secondary fields"
        );
    }

    debug!(base = base.len(), extra = extra.len(), "extraction done");
    Extraction { base, extra }
}
