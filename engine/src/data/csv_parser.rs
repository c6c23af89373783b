use anyhow::{anyhow, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::{Comment, PriceRecord};
use shared::utils::snapshot_format;

pub const RETAINED_CURRENCY: &str = "usd";

pub struct SnapshotCsvParser;

impl SnapshotCsvParser {
    // Price snapshot header, as written by the price collector:
    // currency,bitcoin,ethereum,solana,dogecoin,cardano,date
    // usd,97012.0,3105.2,240.1,0.39,0.78,2024-11-20 12:10:00
    // Only `usd` rows are kept; `asset_column` picks the price column.
    pub fn parse_price_records(content: &[u8], asset_column: &str) -> Result<Vec<PriceRecord>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(content);
        let headers = rdr.headers()?.clone();

        let mut records = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", line, e))?;

            let currency = Self::required_field(&record, &headers, "currency", line)?;
            if currency != RETAINED_CURRENCY {
                continue;
            }
            let date_str = Self::required_field(&record, &headers, "date", line)?;
            let price_str = Self::required_field(&record, &headers, asset_column, line)?;

            let timestamp = snapshot_format::parse_timestamp(date_str)
                .map_err(|e| anyhow!("Error parsing 'date' at line {}: {}", line, e))?;
            let price = price_str
                .parse::<f64>()
                .map_err(|e| anyhow!("Error parsing '{}' at line {}: {}", asset_column, line, e))?;

            records.push(PriceRecord {
                timestamp,
                currency: currency.to_string(),
                price,
            });
        }
        Ok(records)
    }

    // Comment snapshots carry free text plus a pre-computed `compound` column.
    // Rows with an empty compound value (e.g. deleted comments) are skipped.
    pub fn parse_comments(content: &[u8]) -> Result<Vec<Comment>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content);
        let headers = rdr.headers()?.clone();
        if Self::column_index(&headers, "compound").is_none() {
            return Err(anyhow!("Missing 'compound' column in comment snapshot"));
        }

        let mut comments = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", line, e))?;
            let raw = match Self::field(&record, &headers, "compound") {
                Some(value) if !value.trim().is_empty() => value.trim(),
                _ => continue,
            };
            let compound = raw
                .parse::<f64>()
                .map_err(|e| anyhow!("Error parsing 'compound' at line {}: {}", line, e))?;
            if !(-1.0..=1.0).contains(&compound) {
                return Err(anyhow!("Compound value {} out of range [-1, 1] at line {}", compound, line));
            }
            comments.push(Comment { compound });
        }
        Ok(comments)
    }

    fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
        headers.iter().position(|header| header.trim() == name)
    }

    fn field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
        Self::column_index(headers, name).and_then(|pos| record.get(pos))
    }

    fn required_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
        Self::field(record, headers, name)
            .ok_or_else(|| anyhow!("Missing '{}' field in CSV record at line {}", name, line))
    }
}
