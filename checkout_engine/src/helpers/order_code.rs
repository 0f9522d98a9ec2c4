use chrono::Utc;
use rand::Rng;

use crate::traits::MAX_DESCRIPTION_LENGTH;

/// Generates a gateway-facing numeric order code.
///
/// The gateway requires a positive integer that is unique per merchant account, with its own format constraints, so
/// the order's database id cannot be used directly. The code is derived from the current time in milliseconds with a
/// three-digit random suffix to separate codes minted within the same millisecond.
pub fn new_order_code() -> i64 {
    let millis = Utc::now().timestamp_millis() % 1_000_000_000_000;
    let suffix = rand::thread_rng().gen_range(0..1000);
    millis * 1000 + suffix
}

/// Truncates a checkout description to the gateway's length bound, on a character boundary.
pub fn bounded_description(description: &str) -> String {
    description.chars().take(MAX_DESCRIPTION_LENGTH).collect()
}
