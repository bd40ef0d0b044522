// src/domains/financial.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Financial dimensions: exchanges and listed companies

use rand::Rng;
use rayon::prelude::*;

use crate::constants::streams;
use crate::dimension::Dimension;
use crate::error::Result;
use crate::records::{cents, Company, Exchange};
use crate::rng::derive_rng;
use crate::vocab::{self, pick};

pub fn generate_exchanges(count: usize) -> Dimension<Exchange> {
    let rows: Vec<Exchange> = (0..count)
        .map(|i| {
            let (code, name) = vocab::EXCHANGES[i % vocab::EXCHANGES.len()];
            let round = i / vocab::EXCHANGES.len();
            Exchange {
                exchange_id: i as i64 + 1,
                code: if round == 0 {
                    code.to_string()
                } else {
                    format!("{code}{}", round + 1)
                },
                name: name.to_string(),
            }
        })
        .collect();
    Dimension::seal(rows)
}

/// Generate companies listed on the sealed exchange dimension
pub fn generate_companies(
    count: usize,
    exchanges: &Dimension<Exchange>,
    seed: u64,
) -> Result<Dimension<Company>> {
    let exchange_sampler = exchanges.keys().sampler()?;

    let rows: Vec<Company> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = derive_rng(seed, streams::COMPANIES, i as u64);
            let u: f64 = rng.random();
            Company {
                company_id: i as i64 + 1,
                exchange_id: exchange_sampler.sample(&mut rng),
                ticker: ticker(i),
                name: format!(
                    "{} {}",
                    pick(&mut rng, vocab::LAST_NAMES),
                    pick(&mut rng, vocab::COMPANY_SUFFIXES)
                ),
                sector: pick(&mut rng, vocab::SECTORS).to_string(),
                base_price: cents(5.0 + 495.0 * u),
            }
        })
        .collect();
    Ok(Dimension::seal(rows))
}

/// Unique ticker for the `n`-th company: A..Z, AA..ZZ, AAA..
fn ticker(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tickers_unique() {
        assert_eq!(ticker(0), "A");
        assert_eq!(ticker(25), "Z");
        assert_eq!(ticker(26), "AA");
        assert_eq!(ticker(27), "AB");
        let all: HashSet<String> = (0..5000).map(ticker).collect();
        assert_eq!(all.len(), 5000);
    }

    #[test]
    fn test_companies_reference_exchanges() {
        let exchanges = generate_exchanges(7);
        assert_eq!(exchanges.rows()[5].code, "NYSE2");

        let companies = generate_companies(300, &exchanges, 3).unwrap();
        assert_eq!(companies.len(), 300);
        assert!(companies
            .rows()
            .iter()
            .all(|c| (1..=7).contains(&c.exchange_id) && c.base_price >= 5.0));
    }
}
