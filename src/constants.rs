// src/constants.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Default capacity of each table channel (records or chunks in flight)
/// Small enough to bound memory, large enough to absorb sink latency spikes
pub const CHANNEL_CAPACITY: usize = 8192;

/// Default block handed out by `IdGenerator::reserve_block`
pub const ID_BLOCK_SIZE: i64 = 1000;

/// Upper bound of items drawn per order header
pub const MAX_ITEMS_PER_ORDER: usize = 5;

/// Upper bound of addresses generated per customer
pub const MAX_ADDRESSES_PER_CUSTOMER: usize = 3;

/// Rows encoded into one pre-serialized chunk before it is sent to a sink
pub const ROWS_PER_CHUNK: usize = 4096;

/// Sentinel returned by an exhausted `LocalIdGenerator`
pub const EXHAUSTED_ID: i64 = -1;

/// Stream salts used to derive independent RNGs per table
pub mod streams {
    pub const CUSTOMERS: u64 = 1;
    pub const ADDRESSES: u64 = 2;
    pub const SUPPLIERS: u64 = 3;
    pub const PRODUCTS: u64 = 5;
    pub const ORDERS: u64 = 6;
    pub const COMPANIES: u64 = 8;
    pub const STOCK_PRICES: u64 = 9;
    pub const DOCTORS: u64 = 11;
    pub const PATIENTS: u64 = 12;
    pub const APPOINTMENTS: u64 = 13;
}
