use crate::error::{ProgressPaymentError, Result};
use chrono::NaiveDate;
use rand::{thread_rng, Rng};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LENGTH: usize = 7;

/// Short random base-36 identifier for sheets, rows and ledger lines.
pub fn generate_id() -> String {
    let mut rng = thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Parses a date in the format "YYYY-MM-DD"
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ProgressPaymentError::DateError(format!(
            "Invalid date format: {}. Expected YYYY-MM-DD",
            value
        ))
    })
}

/// Rounds half away from zero to the given number of decimals.
///
/// Only meant for presentation. The calculation pipeline never rounds.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

pub fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
