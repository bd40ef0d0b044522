// src/domains/ecommerce.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! E-commerce dimensions: customers (+ addresses), suppliers, categories, products

use rand::Rng;
use rayon::prelude::*;

use crate::constants::streams;
use crate::dimension::{AddressBook, Dimension};
use crate::error::Result;
use crate::records::*;
use crate::rng::derive_rng;
use crate::vocab::{self, pick};

/// Customers plus the addresses owned by each of them
#[derive(Debug, Clone)]
pub struct CustomerDimensions {
    pub customers: Dimension<Customer>,
    pub addresses: Dimension<Address>,
}

impl CustomerDimensions {
    /// customer → address ids lookup used by order workers
    pub fn address_book(&self) -> AddressBook {
        AddressBook::from_pairs(
            self.addresses
                .rows()
                .iter()
                .map(|a| (a.customer_id, a.address_id)),
        )
    }
}

/// Generate `count` customers with 1..=`max_addresses` addresses each
///
/// Address ids are assigned from a prefix sum over per-customer address
/// counts, so they are dense (`1..=total`) and independent of scheduling.
pub fn generate_customers(count: usize, max_addresses: usize, seed: u64) -> CustomerDimensions {
    let max_addresses = max_addresses.max(1);

    let customers: Vec<Customer> = (0..count)
        .into_par_iter()
        .map(|i| {
            let customer_id = i as i64 + 1;
            let mut rng = derive_rng(seed, streams::CUSTOMERS, i as u64);
            let first_name = pick(&mut rng, vocab::FIRST_NAMES);
            let last_name = pick(&mut rng, vocab::LAST_NAMES);
            let email = format!(
                "{}.{}{}@{}",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                customer_id,
                pick(&mut rng, vocab::EMAIL_DOMAINS)
            );
            Customer {
                customer_id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email,
                signup_date: day(DATA_EPOCH_DAY + rng.random_range(0..ORDER_WINDOW_DAYS)),
            }
        })
        .collect();

    let per_customer: Vec<usize> = (0..count)
        .into_par_iter()
        .map(|i| derive_rng(seed, streams::ADDRESSES, i as u64).random_range(1..=max_addresses))
        .collect();

    let mut first_address = Vec::with_capacity(count);
    let mut next = 1i64;
    for n in &per_customer {
        first_address.push(next);
        next += *n as i64;
    }

    let addresses: Vec<Address> = (0..count)
        .into_par_iter()
        .flat_map_iter(|i| {
            let mut rng = derive_rng(seed, streams::ADDRESSES, i as u64);
            let n = rng.random_range(1..=max_addresses);
            let customer_id = i as i64 + 1;
            let base = first_address[i];
            (0..n)
                .map(|j| {
                    let (city, state) = vocab::CITIES[rng.random_range(0..vocab::CITIES.len())];
                    Address {
                        address_id: base + j as i64,
                        customer_id,
                        street: format!(
                            "{} {}",
                            rng.random_range(1..9999),
                            pick(&mut rng, vocab::STREETS)
                        ),
                        city: city.to_string(),
                        state: state.to_string(),
                        postal_code: format!("{:05}", rng.random_range(1000..99_999)),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    tracing::debug!(
        "Generated {} customers with {} addresses",
        customers.len(),
        addresses.len()
    );

    CustomerDimensions {
        customers: Dimension::seal(customers),
        addresses: Dimension::seal(addresses),
    }
}

pub fn generate_suppliers(count: usize, seed: u64) -> Dimension<Supplier> {
    let rows: Vec<Supplier> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = derive_rng(seed, streams::SUPPLIERS, i as u64);
            Supplier {
                supplier_id: i as i64 + 1,
                name: format!(
                    "{} {}",
                    pick(&mut rng, vocab::LAST_NAMES),
                    pick(&mut rng, vocab::COMPANY_SUFFIXES)
                ),
                country: pick(&mut rng, vocab::COUNTRIES).to_string(),
            }
        })
        .collect();
    Dimension::seal(rows)
}

pub fn generate_categories(count: usize) -> Dimension<Category> {
    let rows: Vec<Category> = (0..count)
        .map(|i| Category {
            category_id: i as i64 + 1,
            name: vocab::cycled_name(vocab::CATEGORY_NAMES, i),
        })
        .collect();
    Dimension::seal(rows)
}

/// Generate products referencing sealed supplier and category dimensions
///
/// Fails only when either parent dimension is empty.
pub fn generate_products(
    count: usize,
    suppliers: &Dimension<Supplier>,
    categories: &Dimension<Category>,
    seed: u64,
) -> Result<Dimension<Product>> {
    let supplier_sampler = suppliers.keys().sampler()?;
    let category_sampler = categories.keys().sampler()?;

    let rows: Vec<Product> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = derive_rng(seed, streams::PRODUCTS, i as u64);
            let u: f64 = rng.random();
            Product {
                product_id: i as i64 + 1,
                name: format!(
                    "{} {}",
                    pick(&mut rng, vocab::PRODUCT_ADJECTIVES),
                    pick(&mut rng, vocab::PRODUCT_NOUNS)
                ),
                category_id: category_sampler.sample(&mut rng),
                supplier_id: supplier_sampler.sample(&mut rng),
                // Mostly cheap items with a long tail up to ~1000
                price: cents(4.99 + 995.0 * u * u),
            }
        })
        .collect();
    Ok(Dimension::seal(rows))
}

/// Unit prices indexed by `product_id - 1`
pub fn price_list(products: &Dimension<Product>) -> Vec<f64> {
    let mut prices = vec![0.0; products.len()];
    for p in products.rows() {
        if let Some(slot) = usize::try_from(p.product_id - 1)
            .ok()
            .and_then(|idx| prices.get_mut(idx))
        {
            *slot = p.price;
        }
    }
    prices
}
