//! Shared encoding utilities.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Whether the input looks like PEM (begins with `-----BEGIN` after
/// leading whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Format raw IP address bytes from a GeneralName.
///
/// Four and sixteen byte values render as IPv4 and IPv6 addresses; any
/// other length is not an address and renders as hex.
pub fn format_ip_bytes(bytes: &[u8]) -> String {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        Ipv4Addr::from(octets).to_string()
    } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        Ipv6Addr::from(octets).to_string()
    } else {
        hex::encode(bytes)
    }
}

/// Parse dotted-decimal OID syntax, returning the canonical form.
///
/// The first arc must be 0, 1 or 2, at least two arcs are required, and
/// every arc must be a decimal number without superfluous leading zeros.
pub fn parse_dotted_oid(input: &str) -> Option<String> {
    let arcs: Vec<&str> = input.trim().split('.').collect();
    if arcs.len() < 2 {
        return None;
    }
    let mut values = Vec::with_capacity(arcs.len());
    for arc in &arcs {
        if arc.is_empty() || !arc.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if arc.len() > 1 && arc.starts_with('0') {
            return None;
        }
        values.push(arc.parse::<u64>().ok()?);
    }
    match values.as_slice() {
        [first, second, ..] if *first <= 1 && *second > 39 => None,
        [first, ..] if *first > 2 => None,
        _ => Some(
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("."),
        ),
    }
}

/// Decode a BMPString body (big-endian UTF-16).
pub fn decode_bmp_string(data: &[u8]) -> Option<String> {
    if data.len() % 2 != 0 {
        return None;
    }
    let units = data
        .chunks_exact(2)
        .filter_map(|pair| <[u8; 2]>::try_from(pair).ok())
        .map(u16::from_be_bytes);
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Decode a UniversalString body (big-endian UTF-32).
pub fn decode_universal_string(data: &[u8]) -> Option<String> {
    if data.len() % 4 != 0 {
        return None;
    }
    data.chunks_exact(4)
        .filter_map(|quad| <[u8; 4]>::try_from(quad).ok())
        .map(|quad| char::from_u32(u32::from_be_bytes(quad)))
        .collect()
}

/// Decode a TeletexString body the way OpenSSL does, as Latin-1.
pub fn decode_teletex_string(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}
