// src/vocab.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static reference vocabulary used to fill dimension rows

use rand::Rng;

pub const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Carlos", "Mei", "Aisha", "Hiroshi", "Olga", "Priya",
];

pub const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore",
    "Jackson", "Nguyen", "Kim", "Patel", "Schmidt", "Rossi", "Tanaka",
];

pub const EMAIL_DOMAINS: &[&str] = &["example.com", "mail.test", "inbox.test", "corp.example"];

pub const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Pine Rd", "Maple Dr", "Cedar Ln", "Elm St", "Lake View",
    "Hill Rd", "Park Ave", "River Rd", "Sunset Blvd", "Market St",
];

/// (city, state)
pub const CITIES: &[(&str, &str)] = &[
    ("Austin", "TX"),
    ("Denver", "CO"),
    ("Seattle", "WA"),
    ("Boston", "MA"),
    ("Chicago", "IL"),
    ("Portland", "OR"),
    ("Atlanta", "GA"),
    ("Phoenix", "AZ"),
    ("Raleigh", "NC"),
    ("Madison", "WI"),
];

pub const COUNTRIES: &[&str] = &["US", "CA", "MX", "DE", "JP", "CN", "IN", "BR", "GB", "KR"];

pub const CATEGORY_NAMES: &[&str] = &[
    "Electronics", "Books", "Home", "Garden", "Toys", "Sports", "Clothing", "Beauty",
    "Grocery", "Automotive", "Office", "Music", "Pet Supplies", "Tools",
];

pub const PRODUCT_ADJECTIVES: &[&str] = &[
    "Classic", "Ultra", "Compact", "Deluxe", "Eco", "Smart", "Rugged", "Premium", "Mini",
    "Pro",
];

pub const PRODUCT_NOUNS: &[&str] = &[
    "Lamp", "Kettle", "Backpack", "Speaker", "Notebook", "Blender", "Jacket", "Drill",
    "Headphones", "Chair", "Bottle", "Camera",
];

pub const COMPANY_SUFFIXES: &[&str] = &["Holdings", "Industries", "Labs", "Systems", "Group", "Corp"];

pub const SECTORS: &[&str] = &[
    "Technology", "Healthcare", "Financials", "Energy", "Utilities", "Materials",
    "Industrials", "Consumer Staples", "Real Estate",
];

/// (code, name)
pub const EXCHANGES: &[(&str, &str)] = &[
    ("NYSE", "New York Stock Exchange"),
    ("NASDAQ", "Nasdaq"),
    ("LSE", "London Stock Exchange"),
    ("TSE", "Tokyo Stock Exchange"),
    ("XETRA", "Deutsche Boerse Xetra"),
];

pub const DEPARTMENTS: &[&str] = &[
    "Cardiology", "Dermatology", "Emergency", "Neurology", "Oncology", "Orthopedics",
    "Pediatrics", "Psychiatry", "Radiology", "General Practice",
];

/// Uniform pick from a non-empty static list
#[inline]
pub fn pick<'a, T: ?Sized, R: Rng + ?Sized>(rng: &mut R, list: &'a [&'a T]) -> &'a T {
    list[rng.random_range(0..list.len())]
}

/// Name of the `n`-th entry of a list, suffixed once the list wraps around
pub fn cycled_name(list: &[&str], n: usize) -> String {
    let base = list[n % list.len()];
    match n / list.len() {
        0 => base.to_string(),
        round => format!("{base} {}", round + 1),
    }
}
