//! Client identification for rate limiting.
//!
//! A client is keyed by the first public IP address found in
//! `X-Forwarded-For`, then `X-Real-IP`, then the connection address.
//! Private, loopback, and reserved addresses are skipped so a proxy or a
//! spoofed internal hop cannot become the bucket key.
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Identifier shared by every client without a usable public address.
pub const FALLBACK_CLIENT: &str = "0.0.0.0";

/// Rate-limit bucket key for one client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Resolve the identifier from the raw header values and peer address,
    /// in that priority order.
    pub fn from_headers(forwarded_for: Option<&str>, real_ip: Option<&str>, remote_addr: Option<IpAddr>) -> Self {
        let from_headers = [forwarded_for, real_ip]
            .into_iter()
            .flatten()
            .flat_map(|value| value.split(','))
            .filter_map(|candidate| candidate.trim().parse::<IpAddr>().ok())
            .find(|ip| !is_private_or_reserved(*ip));

        match from_headers.or(remote_addr.filter(|ip| !is_private_or_reserved(*ip))) {
            Some(ip) => Self(ip.to_string()),
            None => Self::fallback(),
        }
    }

    pub fn fallback() -> Self {
        Self(FALLBACK_CLIENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check if an IP address is private, reserved, or otherwise not a public client.
///
/// This covers:
/// - Loopback addresses (127.0.0.0/8, ::1)
/// - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
/// - Shared address space (100.64/10)
/// - Link-local addresses (169.254/16, fe80::/10)
/// - Multicast addresses (224/4, ff00::/8)
/// - Unspecified and "this network" addresses (0.0.0.0/8, ::)
/// - Reserved and broadcast (240/4)
/// - Documentation ranges (192.0.2/24, 198.51.100/24, 203.0.113/24, 2001:db8::/32)
/// - IPv6 unique local (fc00::/7)
/// - IPv4-mapped IPv6 addresses whose IPv4 part is any of the above
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_or_reserved_v4(v4),
        IpAddr::V6(v6) => is_private_or_reserved_v6(v6),
    }
}

fn is_private_or_reserved_v4(v4: Ipv4Addr) -> bool {
    let octets = v4.octets();
    v4.is_loopback()
        || v4.is_private()
        || v4.is_link_local()
        || v4.is_multicast()
        || v4.is_broadcast()
        || v4.is_unspecified()
        || v4.is_documentation()
        || octets[0] == 0
        || octets[0] >= 240
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
}

fn is_private_or_reserved_v6(v6: Ipv6Addr) -> bool {
    if let Some(v4) = v6.to_ipv4_mapped() {
        return is_private_or_reserved_v4(v4);
    }
    let segments = v6.segments();
    v6.is_loopback()
        || v6.is_multicast()
        || v6.is_unspecified()
        || (segments[0] & 0xfe00) == 0xfc00
        || (segments[0] & 0xffc0) == 0xfe80
        || (segments[0] == 0x2001 && segments[1] == 0x0db8)
}
