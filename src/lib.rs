// src/lib.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-throughput synthetic relational datasets
//!
//! This library provides:
//! - Dimension tables generated in parallel and sealed before any fact row exists
//! - O(1) rank-skewed foreign key sampling (alias method)
//! - Lock-free unique IDs for fact rows (shared atomic or per-worker ranges)
//! - Fact fan-out over disjoint worker ranges with bounded channels to per-table sinks
//! - A stage graph with first-error cancellation for whole-domain runs
//!
//! ```no_run
//! use dgen_tables::{Pipeline, PipelineConfig};
//!
//! let report = Pipeline::new(PipelineConfig::default()).run()?;
//! println!("{} rows", report.total_rows());
//! # Ok::<(), dgen_tables::GenError>(())
//! ```

// Core modules
pub mod config;
pub mod constants;
pub mod dimension;
pub mod error;
pub mod ids;
pub mod partition;
pub mod records;
pub mod rng;
pub mod sampler;
mod vocab;

// Generation
pub mod domains;
pub mod facts;

// Output and orchestration
pub mod pipeline;
pub mod sink;

// Re-export main API
pub use config::{Domain, EcommerceCounts, FinancialCounts, MedicalCounts, PipelineConfig};
pub use dimension::{AddressBook, Dimension, KeyPool, Keyed};
pub use error::{GenError, Result};
pub use facts::{
    generate_appointments, generate_facts, generate_stock_prices, AppointmentInputs, FactOptions,
    FactStats, OrderInputs,
};
pub use ids::{IdGenerator, LocalIdGenerator};
pub use partition::{partition, WorkerRange};
pub use pipeline::cancel::CancelToken;
pub use pipeline::graph::{StageReport, StageStatus, TaskGraph};
pub use pipeline::sinks::TableReport;
pub use pipeline::{Pipeline, RunReport};
pub use sampler::WeightedSampler;
pub use records::Record;
pub use sink::{drain, drain_with, Chunk, ChunkSink, OutputFormat, RecordSink, Sink};
