use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `data` under `key`, rendered as lowercase hex, which is how PayOS transmits every signature.
pub fn hmac_sha256_hex(key: &str, data: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().iter().map(|b| format!("{b:02x}")).collect()
}

/// The signature PayOS requires on a create-payment-link request: HMAC over the five core fields in fixed
/// alphabetical order, ampersand-separated.
pub fn request_signature(
    checksum_key: &str,
    amount: i64,
    cancel_url: &str,
    description: &str,
    order_code: i64,
    return_url: &str,
) -> String {
    let data = format!(
        "amount={amount}&cancelUrl={cancel_url}&description={description}&orderCode={order_code}&returnUrl={return_url}"
    );
    hmac_sha256_hex(checksum_key, &data)
}

/// The signature PayOS attaches to webhook deliveries: HMAC over the `data` object rendered as
/// alphabetically-sorted `key=value` pairs.
///
/// Scalar values are rendered bare (no JSON quoting), `null` renders as the empty string, and nested
/// arrays/objects render as their compact JSON text.
pub fn webhook_signature(checksum_key: &str, data: &Value) -> String {
    let Some(map) = data.as_object() else {
        return hmac_sha256_hex(checksum_key, &render_value(data));
    };
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let payload = keys
        .into_iter()
        .map(|k| format!("{k}={}", render_value(&map[k])))
        .collect::<Vec<String>>()
        .join("&");
    hmac_sha256_hex(checksum_key, &payload)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
