//! Matching primitives: domain suffixes and IP networks.
//!
//! These are pure functions shared by every name-based check.

use crate::validate::ConfigError;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Check whether `name` is covered by one of `allowed_suffixes`.
///
/// A suffix `example.com` matches `example.com` itself and any name ending
/// in `.example.com`; it never matches `evilexample.com`. A suffix written
/// with a leading dot (`.example.com`) matches subdomains only. Comparison
/// is ASCII case-insensitive, and one trailing root dot on either side is
/// ignored, so `evil.example.com.` falls under `example.com`. An empty list
/// matches nothing.
pub fn domain_matches<S: AsRef<str>>(name: &str, allowed_suffixes: &[S]) -> bool {
    allowed_suffixes
        .iter()
        .any(|suffix| domain_matches_suffix(name, suffix.as_ref()))
}

/// Match one name against one suffix (label-boundary anchored).
pub(crate) fn domain_matches_suffix(name: &str, suffix: &str) -> bool {
    let name = strip_root_dot(name);
    let suffix = strip_root_dot(suffix);
    if suffix.is_empty() || name.is_empty() {
        return false;
    }
    let name = name.to_ascii_lowercase();
    let suffix = suffix.to_ascii_lowercase();
    if suffix.starts_with('.') {
        // ".example.com" matches any subdomain but not the domain itself
        return name.len() > suffix.len() && name.ends_with(&suffix);
    }
    name == suffix
        || (name.len() > suffix.len()
            && name.ends_with(&suffix)
            && name.as_bytes().get(name.len() - suffix.len() - 1) == Some(&b'.'))
}

fn strip_root_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Check whether `address` falls inside any of `cidrs`.
///
/// Every CIDR is parsed before matching, so a malformed entry is reported
/// as [`ConfigError::InvalidCidr`] regardless of its position. An address
/// that does not parse, or belongs to a different family than a network,
/// simply does not match it.
pub fn network_contains<S: AsRef<str>>(address: &str, cidrs: &[S]) -> Result<bool, ConfigError> {
    let networks = cidrs
        .iter()
        .map(|c| c.as_ref().parse::<IpNetwork>())
        .collect::<Result<Vec<_>, _>>()?;
    let Ok(addr) = address.trim().parse::<IpAddr>() else {
        return Ok(false);
    };
    Ok(networks.iter().any(|net| net.contains(&addr)))
}

/// An IP network in CIDR notation (`10.0.0.0/8`, `2001:db8::/32`).
///
/// A bare address is a host network (`/32` or `/128`). Host bits below the
/// prefix are masked off, so `10.0.0.5/24` describes `10.0.0.0/24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix: u8,
}

impl IpNetwork {
    pub fn new(addr: IpAddr, prefix: u8) -> Option<Self> {
        if prefix > max_prefix(&addr) {
            return None;
        }
        Some(Self {
            addr: mask_addr(&addr, prefix),
            prefix,
        })
    }

    pub fn network(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// Whether `addr` is inside this network. Addresses of the other family
    /// are never contained.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        match (self.addr, addr) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                mask_addr(addr, self.prefix) == self.addr
            }
            _ => false,
        }
    }
}

impl FromStr for IpNetwork {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidCidr {
            cidr: s.to_string(),
        };
        let trimmed = s.trim();
        let (addr_part, prefix_part) = match trimmed.split_once('/') {
            Some((a, p)) => (a, Some(p)),
            None => (trimmed, None),
        };
        let addr: IpAddr = addr_part.parse().map_err(|_| invalid())?;
        let prefix = match prefix_part {
            Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => {
                p.parse::<u8>().map_err(|_| invalid())?
            }
            Some(_) => return Err(invalid()),
            None => max_prefix(&addr),
        };
        IpNetwork::new(addr, prefix).ok_or_else(invalid)
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

fn max_prefix(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Zero every bit of `addr` beyond the first `prefix` bits.
fn mask_addr(addr: &IpAddr, prefix: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(*v4);
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V4((bits & mask).into())
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(*v6);
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V6((bits & mask).into())
        }
    }
}
