// Human-readable booking codes: WDL-YYYYMMDD-NNNNN

use chrono::NaiveDate;
use rand::Rng;

pub const BOOKING_CODE_PREFIX: &str = "WDL";

pub trait CodeGenerator: Send + Sync + 'static {
    fn generate(&self, date: NaiveDate) -> String;
}

pub fn format_code(date: NaiveDate, serial: u32) -> String {
    format!("{}-{}-{:05}", BOOKING_CODE_PREFIX, date.format("%Y%m%d"), serial)
}

// Five random digits. Uniqueness is left to the store's code index.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, date: NaiveDate) -> String {
        let serial = rand::thread_rng().gen_range(10_000..=99_999);
        format_code(date, serial)
    }
}

pub fn is_valid_code(code: &str) -> bool {
    let mut parts = code.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(date), Some(serial), None) => {
            prefix == BOOKING_CODE_PREFIX
                && NaiveDate::parse_from_str(date, "%Y%m%d").is_ok()
                && serial.len() == 5
                && serial.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}
