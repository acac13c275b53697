//! Ticker universe loading.
//!
//! The universe file is the NSE equity list CSV with a `symbol` column,
//! the same shape the scheduled updater has always maintained.

use std::path::Path;

use crate::error::{Error, Result};

/// Load ticker symbols from a CSV file with a `symbol` column.
///
/// Blank cells are skipped; symbols are trimmed, deduplicated, and sorted.
pub fn load_tickers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = reader.headers()?.clone();
    let symbol_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("symbol"))
        .ok_or_else(|| {
            Error::Parse(format!(
                "No 'symbol' column in {} (found: {})",
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })?;

    let mut tickers: Vec<String> = Vec::new();
    for result in reader.records() {
        let record = result?;
        if let Some(raw) = record.get(symbol_idx) {
            let symbol = raw.trim();
            if !symbol.is_empty() {
                tickers.push(symbol.to_string());
            }
        }
    }

    tickers.sort();
    tickers.dedup();

    if tickers.is_empty() {
        return Err(Error::InvalidInput(format!(
            "No ticker symbols found in {}",
            path.display()
        )));
    }

    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_tickers() {
        let file = write_csv("symbol,last_updated\nTCS,2024-01-01\nRELIANCE,2024-01-01\nINFY,2024-01-01\n");
        let tickers = load_tickers(file.path()).unwrap();
        assert_eq!(tickers, vec!["INFY", "RELIANCE", "TCS"]);
    }

    #[test]
    fn test_load_tickers_dedup_and_blank() {
        let file = write_csv("SYMBOL\nTCS\n\n TCS \nINFY\n");
        let tickers = load_tickers(file.path()).unwrap();
        assert_eq!(tickers, vec!["INFY", "TCS"]);
    }

    #[test]
    fn test_missing_symbol_column() {
        let file = write_csv("name,exchange\nTata,NSE\n");
        assert!(matches!(load_tickers(file.path()), Err(Error::Parse(_))));
    }

    #[test]
    fn test_empty_file() {
        let file = write_csv("symbol\n");
        assert!(matches!(load_tickers(file.path()), Err(Error::InvalidInput(_))));
    }
}
