// src/facts/orders.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order headers and order items
//!
//! Header ids are the global row index, so they are unique and gap-free by
//! construction. Item counts are random, so item ids come from a shared
//! [`IdGenerator`]; each worker reserves blocks of ids and hands them out
//! locally. Items of an order are sent before its header.

use crossbeam_channel::Sender;
use rand::Rng;

use super::{check_cancelled, fan_out, FactOptions, FactStats};
use crate::constants::{streams, ID_BLOCK_SIZE};
use crate::dimension::AddressBook;
use crate::error::{GenError, Result};
use crate::ids::{IdGenerator, LocalIdGenerator};
use crate::partition::WorkerRange;
use crate::pipeline::cancel::CancelToken;
use crate::records::{
    cents, instant, OrderHeader, OrderItem, OrderStatus, ORDER_WINDOW_DAYS, ORDER_WINDOW_START_DAY,
};
use crate::rng::{derive_rng, resolve_seed};
use crate::sampler::WeightedSampler;

const SECS_PER_DAY: i64 = 86_400;
const DISCOUNTS: [f64; 4] = [0.05, 0.10, 0.15, 0.20];

/// Sealed dimension data the order generator reads
#[derive(Debug, Clone, Copy)]
pub struct OrderInputs<'a> {
    pub customer_ids: &'a [i64],
    /// Addresses owned by each customer
    pub addresses: &'a AddressBook,
    pub product_ids: &'a [i64],
    /// Unit price of product `id` at index `id - 1`
    pub product_prices: &'a [f64],
}

impl OrderInputs<'_> {
    fn validate(&self) -> Result<()> {
        if self.customer_ids.is_empty() {
            return Err(GenError::config("orders need at least one customer"));
        }
        if self.product_ids.is_empty() {
            return Err(GenError::config("orders need at least one product"));
        }
        let priced = self.product_prices.len() as i64;
        if let Some(id) = self
            .product_ids
            .iter()
            .find(|&&id| id < 1 || id > priced)
        {
            return Err(GenError::config(format!("product {id} has no price")));
        }
        Ok(())
    }
}

/// Generate `total_count` orders with their items
///
/// Consumes both senders: when this returns (either way) the header and item
/// channels are closed from the producer side.
pub fn generate_facts(
    total_count: u64,
    inputs: OrderInputs<'_>,
    header_tx: Sender<OrderHeader>,
    item_tx: Sender<OrderItem>,
    options: &FactOptions,
) -> Result<FactStats> {
    if total_count == 0 {
        return Err(GenError::config("order count must be positive"));
    }
    if options.max_items_per_order == 0 {
        return Err(GenError::config("max_items_per_order must be at least 1"));
    }
    inputs.validate()?;

    let worker = OrderWorker {
        inputs,
        customers: WeightedSampler::new(inputs.customer_ids)?,
        products: WeightedSampler::new(inputs.product_ids)?,
        item_ids: IdGenerator::new(1, ID_BLOCK_SIZE),
        header_tx,
        item_tx,
        seed: resolve_seed(options.seed),
        max_items: options.max_items_per_order,
    };

    let stats = fan_out(
        "orders",
        total_count,
        options.workers(),
        &options.cancel,
        |range| worker.run(range, &options.cancel),
    )?;

    if stats.skipped > 0 {
        tracing::warn!(
            "Skipped {} order(s) whose customer has no address",
            stats.skipped
        );
    }
    tracing::info!(
        "Generated {} orders with {} items",
        stats.rows,
        stats.child_rows
    );
    Ok(stats)
}

struct OrderWorker<'a> {
    inputs: OrderInputs<'a>,
    customers: WeightedSampler,
    products: WeightedSampler,
    item_ids: IdGenerator,
    header_tx: Sender<OrderHeader>,
    item_tx: Sender<OrderItem>,
    seed: u64,
    max_items: usize,
}

impl OrderWorker<'_> {
    fn run(&self, range: WorkerRange, cancel: &CancelToken) -> Result<FactStats> {
        let mut stats = FactStats::default();
        let mut local_ids = LocalIdGenerator::new(0, 0);
        let mut items = Vec::with_capacity(self.max_items);

        for index in range.indices() {
            check_cancelled(cancel)?;
            let mut rng = derive_rng(self.seed, streams::ORDERS, index);
            let order_id = index as i64;

            let customer_id = self.customers.sample(&mut rng);
            let Some(addresses) = self.inputs.addresses.get(customer_id) else {
                tracing::debug!("Customer {} has no address, skipping order {}", customer_id, order_id);
                stats.skipped += 1;
                continue;
            };
            let shipping_address_id = addresses[rng.random_range(0..addresses.len())];
            let billing_address_id = if rng.random_bool(0.8) {
                shipping_address_id
            } else {
                addresses[rng.random_range(0..addresses.len())]
            };

            let n_items = rng.random_range(1..=self.max_items);
            let mut total = 0.0;
            for _ in 0..n_items {
                if !local_ids.has_more() {
                    local_ids = self.item_ids.reserve_block();
                }
                let product_id = self.products.sample(&mut rng);
                let unit_price = self.inputs.product_prices[(product_id - 1) as usize];
                let quantity = rng.random_range(1..=5u32);
                let discount = if rng.random_bool(0.7) {
                    0.0
                } else {
                    DISCOUNTS[rng.random_range(0..DISCOUNTS.len())]
                };
                total += quantity as f64 * unit_price * (1.0 - discount);
                items.push(OrderItem {
                    order_item_id: local_ids.next_id(),
                    order_id,
                    product_id,
                    quantity,
                    unit_price,
                    discount,
                });
            }

            let header = OrderHeader {
                order_id,
                customer_id,
                shipping_address_id,
                billing_address_id,
                ordered_at: instant(
                    ORDER_WINDOW_START_DAY * SECS_PER_DAY
                        + rng.random_range(0..ORDER_WINDOW_DAYS * SECS_PER_DAY),
                ),
                status: order_status(&mut rng),
                order_total: cents(total),
            };

            for item in items.drain(..) {
                self.item_tx.send(item).map_err(|_| GenError::ChannelClosed {
                    table: "order_items".to_string(),
                })?;
            }
            self.header_tx.send(header).map_err(|_| GenError::ChannelClosed {
                table: "order_headers".to_string(),
            })?;

            stats.rows += 1;
            stats.child_rows += n_items as u64;
        }
        Ok(stats)
    }
}

fn order_status<R: Rng + ?Sized>(rng: &mut R) -> OrderStatus {
    match rng.random_range(0..100) {
        0..=59 => OrderStatus::Delivered,
        60..=74 => OrderStatus::Shipped,
        75..=84 => OrderStatus::Processing,
        85..=89 => OrderStatus::Pending,
        90..=95 => OrderStatus::Cancelled,
        _ => OrderStatus::Returned,
    }
}
