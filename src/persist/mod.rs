// src/persist/mod.rs

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

use crate::scrape::CombinedRecord;

/// Write the full record list as a pretty-printed JSON array, overwriting
/// whatever was there. serde_json leaves non-ASCII text unescaped, which
/// is what downstream consumers of the file expect.
pub fn write_json(records: &[CombinedRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output dir {}", parent.display()))?;
    }

    let file =
        File::create(path).with_context(|| format!("creating output {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .with_context(|| format!("serializing {} records", records.len()))?;
    writer.flush().context("flushing output file")?;

    info!(records = records.len(), path = %path.display(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(name: &str, price: f64) -> CombinedRecord {
        CombinedRecord {
            name: name.to_string(),
            ticker_or_country: "MSTR".into(),
            btc_holdings: "640,031".into(),
            extra_val_1: Some("$1.2B".into()),
            extra_val_2: Some("1.4x".into()),
            live_price: price,
        }
    }

    #[test]
    fn writes_pretty_array_and_overwrites() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.json");

        write_json(&[record("Strategy", 172.35)], &path).unwrap();
        write_json(&[record("Strategy", 180.0), record("Metaplanet", 0.0)], &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: Vec<CombinedRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2, "second write replaces the first");
        // pretty printing, not a single line
        assert!(raw.contains('\n'));
    }

    #[test]
    fn non_ascii_text_stays_unescaped() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.json");
        write_json(&[record("메타플래닛", 0.0)], &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("메타플래닛"));
        assert!(!raw.contains("\\u"));
    }

    #[test]
    fn absent_extras_are_omitted_from_json() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.json");
        let mut rec = record("Strategy", 1.0);
        rec.extra_val_1 = None;
        rec.extra_val_2 = None;
        write_json(&[rec], &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("extra_val_1"));
        assert!(raw.contains("live_price"));
    }
}
