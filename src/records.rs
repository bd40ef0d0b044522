// src/records.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for every generated table
//!
//! Dimension rows implement [`Keyed`]; fact rows only carry foreign keys into
//! dimensions sealed before fact generation started.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::dimension::Keyed;

/// 2020-01-01, earliest signup / birth reference day
pub const DATA_EPOCH_DAY: i64 = 18_262;
/// 2022-01-01, start of the order window
pub const ORDER_WINDOW_START_DAY: i64 = 18_993;
/// Orders are spread over two years
pub const ORDER_WINDOW_DAYS: i64 = 730;
/// 2023-01-02, a Monday: first trading day of the price history
pub const TRADING_START_DAY: i64 = 19_359;

/// Calendar day `days` after 1970-01-01
pub fn day(days: i64) -> NaiveDate {
    NaiveDate::default() + Duration::days(days)
}

/// Timestamp `secs` after 1970-01-01T00:00:00
pub fn instant(secs: i64) -> NaiveDateTime {
    NaiveDateTime::default() + Duration::seconds(secs)
}

macro_rules! keyed {
    ($ty:ty, $field:ident) => {
        impl Keyed for $ty {
            fn key(&self) -> i64 {
                self.$field
            }
        }
    };
}

/// Row type with a fixed column order
///
/// CSV sinks use `COLUMNS` to write the header of a table that ends up empty.
pub trait Record: Serialize {
    /// Field names in declaration order
    const COLUMNS: &'static [&'static str];
}

macro_rules! columns {
    ($ty:ty, [$($col:ident),+ $(,)?]) => {
        impl Record for $ty {
            const COLUMNS: &'static [&'static str] = &[$(stringify!($col)),+];
        }
    };
}

// ---------------------------------------------------------------------------
// E-commerce
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub signup_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub address_id: i64,
    pub customer_id: i64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supplier {
    pub supplier_id: i64,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub category_id: i64,
    pub supplier_id: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderHeader {
    pub order_id: i64,
    pub customer_id: i64,
    pub shipping_address_id: i64,
    pub billing_address_id: i64,
    pub ordered_at: NaiveDateTime,
    pub status: OrderStatus,
    pub order_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub order_item_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price: f64,
    pub discount: f64,
}

keyed!(Customer, customer_id);
keyed!(Address, address_id);
keyed!(Supplier, supplier_id);
keyed!(Category, category_id);
keyed!(Product, product_id);

columns!(Customer, [customer_id, first_name, last_name, email, signup_date]);
columns!(Address, [address_id, customer_id, street, city, state, postal_code]);
columns!(Supplier, [supplier_id, name, country]);
columns!(Category, [category_id, name]);
columns!(Product, [product_id, name, category_id, supplier_id, price]);
columns!(
    OrderHeader,
    [
        order_id,
        customer_id,
        shipping_address_id,
        billing_address_id,
        ordered_at,
        status,
        order_total,
    ]
);
columns!(
    OrderItem,
    [order_item_id, order_id, product_id, quantity, unit_price, discount]
);

// ---------------------------------------------------------------------------
// Financial
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub exchange_id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Company {
    pub company_id: i64,
    pub exchange_id: i64,
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub base_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStockPrice {
    pub price_id: i64,
    pub company_id: i64,
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

keyed!(Exchange, exchange_id);
keyed!(Company, company_id);

columns!(Exchange, [exchange_id, code, name]);
columns!(
    Company,
    [company_id, exchange_id, ticker, name, sector, base_price]
);
columns!(
    DailyStockPrice,
    [price_id, company_id, trade_date, open, high, low, close, volume]
);

// ---------------------------------------------------------------------------
// Medical
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Department {
    pub department_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctor {
    pub doctor_id: i64,
    pub department_id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub department_id: i64,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
}

keyed!(Department, department_id);
keyed!(Doctor, doctor_id);
keyed!(Patient, patient_id);

columns!(Department, [department_id, name]);
columns!(Doctor, [doctor_id, department_id, first_name, last_name]);
columns!(Patient, [patient_id, first_name, last_name, birth_date]);
columns!(
    Appointment,
    [
        appointment_id,
        patient_id,
        doctor_id,
        department_id,
        scheduled_at,
        duration_minutes,
        status,
    ]
);

/// Round to cents
#[inline]
pub fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn test_reference_days() {
        assert_eq!(day(DATA_EPOCH_DAY), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(
            day(ORDER_WINDOW_START_DAY),
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
        );
        assert_eq!(day(TRADING_START_DAY).weekday(), Weekday::Mon);
    }

    #[test]
    fn test_instant() {
        let ts = instant(86_400 + 3_600);
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
    }

    /// Header `csv` derives from a serialized row
    fn csv_header<T: Record>(row: &T) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(row).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        text.lines().next().unwrap().to_string()
    }

    #[test]
    fn test_columns_match_serialized_fields() {
        let ts = instant(0);
        let header = OrderHeader {
            order_id: 1,
            customer_id: 2,
            shipping_address_id: 3,
            billing_address_id: 3,
            ordered_at: ts,
            status: OrderStatus::Pending,
            order_total: 1.0,
        };
        assert_eq!(csv_header(&header), OrderHeader::COLUMNS.join(","));

        let item = OrderItem {
            order_item_id: 1,
            order_id: 1,
            product_id: 4,
            quantity: 2,
            unit_price: 3.5,
            discount: 0.0,
        };
        assert_eq!(csv_header(&item), OrderItem::COLUMNS.join(","));

        let price = DailyStockPrice {
            price_id: 1,
            company_id: 1,
            trade_date: day(TRADING_START_DAY),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 10,
        };
        assert_eq!(csv_header(&price), DailyStockPrice::COLUMNS.join(","));

        let appointment = Appointment {
            appointment_id: 1,
            patient_id: 1,
            doctor_id: 1,
            department_id: 1,
            scheduled_at: ts,
            duration_minutes: 30,
            status: AppointmentStatus::Scheduled,
        };
        assert_eq!(csv_header(&appointment), Appointment::COLUMNS.join(","));

        let address = Address {
            address_id: 1,
            customer_id: 1,
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: "62701".into(),
        };
        assert_eq!(csv_header(&address), Address::COLUMNS.join(","));
    }

    #[test]
    fn test_cents() {
        assert_eq!(cents(10.005_1), 10.01);
        assert_eq!(cents(3.14159), 3.14);
    }
}
