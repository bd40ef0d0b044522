// src/facts/stock_prices.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily stock price history, one random walk per company
//!
//! Workers partition the company list. Price ids are fully determined by
//! `(company ordinal, trading day)`, so each worker owns an exclusive
//! [`LocalIdGenerator`] range. Rows are encoded on the worker into chunks of
//! `ROWS_PER_CHUNK` and sent to a chunk sink.

use chrono::{Datelike, NaiveDate, Weekday};
use crossbeam_channel::Sender;
use rand::Rng;

use super::{check_cancelled, fan_out, FactOptions, FactStats};
use crate::constants::{streams, ROWS_PER_CHUNK};
use crate::dimension::Dimension;
use crate::error::{GenError, Result};
use crate::ids::LocalIdGenerator;
use crate::partition::WorkerRange;
use crate::pipeline::cancel::CancelToken;
use crate::records::{cents, day, Company, DailyStockPrice, TRADING_START_DAY};
use crate::rng::{derive_rng, resolve_seed};
use crate::sink::{encode_chunk, Chunk, OutputFormat};

const TABLE: &str = "daily_stock_prices";

/// Largest daily move of the close relative to the open
const MAX_DAILY_MOVE: f64 = 0.04;
/// Overnight gap between the previous close and the next open
const MAX_GAP: f64 = 0.01;
const MIN_PRICE: f64 = 0.01;

/// The first `count` weekdays starting at the first trading day
pub fn trading_days(count: u64) -> Vec<NaiveDate> {
    (0..)
        .map(|offset| day(TRADING_START_DAY + offset))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count as usize)
        .collect()
}

/// Generate `trading_days` price rows for every company
///
/// Consumes the sender, closing the chunk channel on return.
pub fn generate_stock_prices(
    companies: &Dimension<Company>,
    trading_days_count: u64,
    format: OutputFormat,
    chunk_tx: Sender<Chunk>,
    options: &FactOptions,
) -> Result<FactStats> {
    if companies.is_empty() {
        return Err(GenError::config("stock prices need at least one company"));
    }
    if trading_days_count == 0 {
        return Err(GenError::config("trading_days must be positive"));
    }

    let worker = PriceWorker {
        companies: companies.rows(),
        dates: trading_days(trading_days_count),
        format,
        chunk_tx,
        seed: resolve_seed(options.seed),
    };

    let stats = fan_out(
        TABLE,
        companies.len() as u64,
        options.workers(),
        &options.cancel,
        |range| worker.run(range, &options.cancel),
    )?;
    tracing::info!(
        "Generated {} price rows for {} companies",
        stats.rows,
        companies.len()
    );
    Ok(stats)
}

struct PriceWorker<'a> {
    companies: &'a [Company],
    dates: Vec<NaiveDate>,
    format: OutputFormat,
    chunk_tx: Sender<Chunk>,
    seed: u64,
}

impl PriceWorker<'_> {
    fn run(&self, range: WorkerRange, cancel: &CancelToken) -> Result<FactStats> {
        let days = self.dates.len() as i64;
        let first_id = (range.start as i64 - 1) * days + 1;
        let mut ids = LocalIdGenerator::new(first_id, first_id + range.count as i64 * days);
        let mut buffer = Vec::with_capacity(ROWS_PER_CHUNK);
        let mut stats = FactStats::default();

        for ordinal in range.indices() {
            let company = &self.companies[(ordinal - 1) as usize];
            let mut rng = derive_rng(self.seed, streams::STOCK_PRICES, ordinal);
            let mut close = company.base_price;

            for &trade_date in &self.dates {
                check_cancelled(cancel)?;
                let open = (close * (1.0 + rng.random_range(-MAX_GAP..MAX_GAP))).max(MIN_PRICE);
                close = (open * (1.0 + rng.random_range(-MAX_DAILY_MOVE..MAX_DAILY_MOVE)))
                    .max(MIN_PRICE);
                let high = open.max(close) * (1.0 + rng.random::<f64>() * 0.01);
                let low = (open.min(close) * (1.0 - rng.random::<f64>() * 0.01)).max(MIN_PRICE);

                buffer.push(DailyStockPrice {
                    price_id: ids.next_id(),
                    company_id: company.company_id,
                    trade_date,
                    open: cents(open),
                    high: cents(high),
                    low: cents(low),
                    close: cents(close),
                    volume: rng.random_range(10_000..5_000_000),
                });
                if buffer.len() == ROWS_PER_CHUNK {
                    stats.rows += self.flush(&mut buffer)?;
                }
            }
        }
        stats.rows += self.flush(&mut buffer)?;
        debug_assert!(!ids.has_more());
        Ok(stats)
    }

    fn flush(&self, buffer: &mut Vec<DailyStockPrice>) -> Result<u64> {
        if buffer.is_empty() {
            return Ok(0);
        }
        let chunk = encode_chunk(TABLE, buffer, self.format)?;
        let rows = chunk.rows;
        buffer.clear();
        self.chunk_tx.send(chunk).map_err(|_| GenError::ChannelClosed {
            table: TABLE.to_string(),
        })?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::financial::{generate_companies, generate_exchanges};
    use crossbeam_channel::unbounded;
    use std::collections::HashSet;

    #[test]
    fn test_trading_days_skip_weekends() {
        let dates = trading_days(10);
        assert_eq!(dates.len(), 10);
        assert_eq!(dates[0], day(TRADING_START_DAY));
        assert!(dates
            .iter()
            .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
        // Mon..Fri, then the next Monday
        assert_eq!(dates[5], day(TRADING_START_DAY + 7));
    }

    #[test]
    fn test_price_rows_cover_every_company_day() {
        let exchanges = generate_exchanges(2);
        let companies = generate_companies(9, &exchanges, 3).unwrap();
        let (tx, rx) = unbounded();
        let options = FactOptions {
            workers: Some(4),
            seed: Some(1),
            ..Default::default()
        };
        let stats = generate_stock_prices(&companies, 20, OutputFormat::JsonLines, tx, &options)
            .unwrap();
        assert_eq!(stats.rows, 180);

        let mut ids = HashSet::new();
        let mut rows = 0;
        for chunk in rx.iter() {
            for line in std::str::from_utf8(&chunk.data).unwrap().lines() {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                let company_id = value["company_id"].as_i64().unwrap();
                assert!((1..=9).contains(&company_id));
                assert!(value["low"].as_f64().unwrap() <= value["high"].as_f64().unwrap());
                ids.insert(value["price_id"].as_i64().unwrap());
                rows += 1;
            }
        }
        assert_eq!(rows, 180);
        assert_eq!(ids, (1..=180).collect());
    }

    #[test]
    fn test_csv_chunks_have_no_header() {
        let exchanges = generate_exchanges(1);
        let companies = generate_companies(1, &exchanges, 3).unwrap();
        let (tx, rx) = unbounded();
        let options = FactOptions {
            workers: Some(1),
            seed: Some(1),
            ..Default::default()
        };
        generate_stock_prices(&companies, 3, OutputFormat::Csv, tx, &options).unwrap();
        let text: String = rx
            .iter()
            .map(|c| String::from_utf8(c.data.to_vec()).unwrap())
            .collect();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("1,1,2023-01-02,"));
    }
}
