// src/pipeline/financial.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Financial stage graph: exchanges -> companies -> daily_stock_prices

use std::sync::OnceLock;

use super::cancel::CancelToken;
use super::errors::ErrorCollector;
use super::graph::{StageReport, TaskGraph};
use super::sinks::{publish, SinkSet};
use super::{sealed, RunContext};
use crate::config::FinancialCounts;
use crate::dimension::Dimension;
use crate::domains::financial::{generate_companies, generate_exchanges};
use crate::error::Result;
use crate::facts::generate_stock_prices;
use crate::records::{Company, DailyStockPrice, Exchange, Record};

pub(super) fn run(
    ctx: &RunContext<'_>,
    counts: &FinancialCounts,
    sinks: &mut SinkSet,
    cancel: &CancelToken,
    errors: &ErrorCollector,
) -> Result<Vec<StageReport>> {
    let exchanges_tx = sinks.open::<Exchange>("exchanges")?;
    let companies_tx = sinks.open::<Company>("companies")?;
    let prices_tx = sinks.open_chunks("daily_stock_prices", DailyStockPrice::COLUMNS)?;

    let exchanges: OnceLock<Dimension<Exchange>> = OnceLock::new();
    let companies: OnceLock<Dimension<Company>> = OnceLock::new();
    let (exchanges, companies) = (&exchanges, &companies);

    let mut graph = TaskGraph::new();

    graph.add("exchanges", &[], move |cancel| {
        let dim = generate_exchanges(counts.exchanges);
        publish(&exchanges_tx, "exchanges", dim.rows(), cancel)?;
        let _ = exchanges.set(dim);
        Ok(())
    });

    graph.add("companies", &["exchanges"], move |cancel| {
        let exchanges = sealed(exchanges, "exchanges")?;
        let dim = ctx
            .pool
            .install(|| generate_companies(counts.companies, exchanges, ctx.seed))?;
        publish(&companies_tx, "companies", dim.rows(), cancel)?;
        let _ = companies.set(dim);
        Ok(())
    });

    graph.add("stock_prices", &["companies"], move |cancel| {
        let companies = sealed(companies, "companies")?;
        generate_stock_prices(
            companies,
            counts.trading_days,
            ctx.format,
            prices_tx,
            &ctx.fact_options(cancel),
        )?;
        Ok(())
    });

    graph.run(cancel, errors)
}
