use crate::errors::DnsError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, Utc};

pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes base64 text, padding a partial trailing group the way zone files
/// are allowed to leave it.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DnsError> {
    let mut s: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match s.len() % 4 {
        0 => {}
        2 => s.push_str("=="),
        3 => s.push('='),
        _ => return Err(DnsError::zone("invalid base64 string length")),
    }
    STANDARD
        .decode(s.as_bytes())
        .map_err(|e| DnsError::zone(format!("invalid base64 string: {}", e)))
}

pub fn decode_hex(text: &str) -> Result<Vec<u8>, DnsError> {
    hex::decode(text.trim()).map_err(|e| DnsError::zone(format!("invalid hex string: {}", e)))
}

/// Decodes an NSEC3 hashed owner label (RFC 4648 base32hex, no padding).
pub fn decode_base32hex(text: &str) -> Result<Vec<u8>, DnsError> {
    base32::decode(
        base32::Alphabet::Rfc4648HexLower { padding: false },
        &text.to_ascii_lowercase(),
    )
    .ok_or_else(|| DnsError::zone(format!("bad base32hex hash {:?}", text)))
}

/// RFC 1982 serial number comparison on 32-bit epoch seconds. Both RRSIG
/// timestamp fields wrap, so `a < b` must hold across the wrap point.
pub fn serial_lt(a: u32, b: u32) -> bool {
    a != b && b.wrapping_sub(a) < 0x8000_0000
}

pub fn serial_le(a: u32, b: u32) -> bool {
    a == b || serial_lt(a, b)
}

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Parses a `YYYYMMDDHHmmSS` zone-text timestamp into epoch seconds.
pub fn timestamp_to_epoch(timestamp: &str) -> Result<u32, DnsError> {
    let parsed = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| DnsError::zone(format!("timestamp {} is invalid: {}", timestamp, e)))?;
    u32::try_from(parsed.and_utc().timestamp())
        .map_err(|_| DnsError::zone(format!("timestamp {} is out of range", timestamp)))
}

/// Renders epoch seconds as `YYYYMMDDHHmmSS` for zone text.
pub fn epoch_to_timestamp(epoch: u32) -> String {
    match DateTime::<Utc>::from_timestamp(epoch as i64, 0) {
        Some(datetime) => datetime.format(TIMESTAMP_FORMAT).to_string(),
        None => epoch.to_string(),
    }
}

/// Epoch seconds right now, truncated to the 32-bit serial space RRSIG uses.
pub fn now_epoch() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
