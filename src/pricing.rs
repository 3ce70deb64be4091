// Trip pricing and cancellation refund tiers
//
// Everything here is pure: no clock reads, no I/O.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::BookingError;

// Flat tax on base price x duration
pub const TAX_RATE: f64 = 0.11;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingError {
    #[error("Stay must last at least one day (got {0})")]
    InvalidDateRange(i64),
}

impl From<PricingError> for BookingError {
    fn from(_: PricingError) -> Self {
        BookingError::InvalidCheckOut
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInput {
    pub price_min: f64,
    pub adults: u32,
    pub children: u32,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub duration: i64,
    // Destination minimum price times guest count
    pub base_price: f64,
    pub tax_and_fees: f64,
    pub discount: f64,
    pub total_price: f64,
}

// Number of started days between two instants, rounded up
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let seconds = (to - from).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_DAY).ceil() as i64
}

pub fn calculate(input: &PricingInput) -> Result<Quote, PricingError> {
    let duration = days_between(input.check_in, input.check_out);
    if duration < 1 {
        return Err(PricingError::InvalidDateRange(duration));
    }

    let total_guests = (u64::from(input.adults) + u64::from(input.children)) as f64;
    let base_price = input.price_min * total_guests;
    let stay_price = base_price * duration as f64;
    let tax_and_fees = stay_price * TAX_RATE;
    let discount = 0.0;

    Ok(Quote {
        duration,
        base_price,
        tax_and_fees,
        discount,
        total_price: stay_price + tax_and_fees - discount,
    })
}

/// Refund percentage for a cancellation made `days_until_check_in` days
/// before arrival: more than a week gets everything back, three to seven
/// days gets half, anything later gets nothing.
pub fn refund_percentage(days_until_check_in: i64) -> u8 {
    if days_until_check_in > 7 {
        100
    } else if days_until_check_in >= 3 {
        50
    } else {
        0
    }
}

pub fn refund_amount(total_price: f64, percentage: u8) -> f64 {
    total_price * percentage as f64 / 100.0
}
