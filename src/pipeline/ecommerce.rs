// src/pipeline/ecommerce.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! E-commerce stage graph
//!
//! ```text
//! customers ──────────────┐
//! suppliers ──┐           ├─> orders
//! categories ─┴─> products┘
//! ```

use std::sync::OnceLock;

use super::cancel::CancelToken;
use super::errors::ErrorCollector;
use super::graph::{StageReport, TaskGraph};
use super::sinks::{publish, SinkSet};
use super::{sealed, RunContext};
use crate::config::EcommerceCounts;
use crate::dimension::Dimension;
use crate::domains::ecommerce::{
    generate_categories, generate_customers, generate_products, generate_suppliers, price_list,
    CustomerDimensions,
};
use crate::error::Result;
use crate::facts::{generate_facts, FactOptions, OrderInputs};
use crate::records::{Address, Category, Customer, OrderHeader, OrderItem, Product, Supplier};

pub(super) fn run(
    ctx: &RunContext<'_>,
    counts: &EcommerceCounts,
    sinks: &mut SinkSet,
    cancel: &CancelToken,
    errors: &ErrorCollector,
) -> Result<Vec<StageReport>> {
    let customers_tx = sinks.open::<Customer>("customers")?;
    let addresses_tx = sinks.open::<Address>("addresses")?;
    let suppliers_tx = sinks.open::<Supplier>("suppliers")?;
    let categories_tx = sinks.open::<Category>("categories")?;
    let products_tx = sinks.open::<Product>("products")?;
    let headers_tx = sinks.open::<OrderHeader>("order_headers")?;
    let items_tx = sinks.open::<OrderItem>("order_items")?;

    let customers: OnceLock<CustomerDimensions> = OnceLock::new();
    let suppliers: OnceLock<Dimension<Supplier>> = OnceLock::new();
    let categories: OnceLock<Dimension<Category>> = OnceLock::new();
    let products: OnceLock<Dimension<Product>> = OnceLock::new();
    let (customers, suppliers, categories, products) =
        (&customers, &suppliers, &categories, &products);

    let mut graph = TaskGraph::new();

    graph.add("customers", &[], move |cancel| {
        let dims = ctx.pool.install(|| {
            generate_customers(counts.customers, counts.max_addresses_per_customer, ctx.seed)
        });
        publish(&customers_tx, "customers", dims.customers.rows(), cancel)?;
        publish(&addresses_tx, "addresses", dims.addresses.rows(), cancel)?;
        let _ = customers.set(dims);
        Ok(())
    });

    graph.add("suppliers", &[], move |cancel| {
        let dim = ctx
            .pool
            .install(|| generate_suppliers(counts.suppliers, ctx.seed));
        publish(&suppliers_tx, "suppliers", dim.rows(), cancel)?;
        let _ = suppliers.set(dim);
        Ok(())
    });

    graph.add("categories", &[], move |cancel| {
        let dim = generate_categories(counts.categories);
        publish(&categories_tx, "categories", dim.rows(), cancel)?;
        let _ = categories.set(dim);
        Ok(())
    });

    graph.add("products", &["suppliers", "categories"], move |cancel| {
        let suppliers = sealed(suppliers, "suppliers")?;
        let categories = sealed(categories, "categories")?;
        let dim = ctx.pool.install(|| {
            generate_products(counts.products, suppliers, categories, ctx.seed)
        })?;
        publish(&products_tx, "products", dim.rows(), cancel)?;
        let _ = products.set(dim);
        Ok(())
    });

    graph.add("orders", &["customers", "products"], move |cancel| {
        let customers = sealed(customers, "customers")?;
        let products = sealed(products, "products")?;
        let addresses = customers.address_book();
        let prices = price_list(products);
        let inputs = OrderInputs {
            customer_ids: customers.customers.keys(),
            addresses: &addresses,
            product_ids: products.keys(),
            product_prices: &prices,
        };
        generate_facts(
            counts.orders,
            inputs,
            headers_tx,
            items_tx,
            &FactOptions {
                max_items_per_order: counts.max_items_per_order,
                ..ctx.fact_options(cancel)
            },
        )?;
        Ok(())
    });

    graph.run(cancel, errors)
}
