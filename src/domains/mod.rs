// src/domains/mod.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dimension generators, one module per schema
//!
//! Generators only depend on counts, the run seed and the static vocabulary
//! (plus already sealed parent dimensions). Rows are built in parallel on the
//! current rayon pool; every row derives its own RNG from `(seed, table, row)`
//! so output is identical for a given seed regardless of thread count.

pub mod ecommerce;
pub mod financial;
pub mod medical;
