use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};
use sha2::Sha256;

/// Aibee park-API signature: lowercase hex SHA-1 over the exact JSON body
/// string, the unix timestamp, and the API secret, concatenated in that
/// order. The body must be signed byte-for-byte as sent.
pub fn aibee_sign(body_json: &str, timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(body_json.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(api_secret.as_bytes());
    hex_lower(&hasher.finalize())
}

/// Form-gateway signature: uppercase hex HMAC-SHA256 (keyed with the
/// secret) over `secret + key1 + value1 + ... + secret` with keys in
/// ascending order and empty-valued parameters dropped.
pub fn gateway_sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut sign_string = String::from(secret);
    for (key, value) in params {
        if value.is_empty() {
            continue;
        }
        sign_string.push_str(key);
        sign_string.push_str(value);
    }
    sign_string.push_str(secret);

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(sign_string.as_bytes());
    hex_upper(&mac.finalize().into_bytes())
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}
