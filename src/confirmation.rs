// Confirmation summary shown to the customer after booking
//
// Formatting follows the id-ID locale: dates as d/m/yyyy, guests in
// Indonesian, amounts with '.' thousands and ',' decimals.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Booking, Destination, Guests};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub booking_code: String,
    pub destination: String,
    pub customer: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: String,
    pub total_price: String,
    pub status: String,
}

impl Confirmation {
    pub fn new(booking: &Booking, destination: &Destination) -> Self {
        Self {
            booking_code: booking.booking_code.clone(),
            destination: destination.name.clone(),
            customer: booking.customer.name.clone(),
            check_in: format_date(booking.trip_details.check_in_date),
            check_out: format_date(booking.trip_details.check_out_date),
            guests: format_guests(&booking.trip_details.number_of_guests),
            total_price: format_currency(booking.pricing.total_price, &booking.pricing.currency),
            status: booking.status.to_string(),
        }
    }
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%-d/%-m/%Y").to_string()
}

pub fn format_guests(guests: &Guests) -> String {
    if guests.children > 0 {
        format!("{} dewasa, {} anak", guests.adults, guests.children)
    } else {
        format!("{} dewasa", guests.adults)
    }
}

fn currency_symbol(currency: &str) -> &str {
    match currency {
        "IDR" => "Rp",
        "USD" => "US$",
        "EUR" => "€",
        other => other,
    }
}

pub fn format_currency(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}{} {},{:02}",
        sign,
        currency_symbol(currency),
        grouped,
        fraction
    )
}
