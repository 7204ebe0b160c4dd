//! Nameserver selection.
//!
//! The default list is the system resolvers from `/etc/resolv.conf`, followed
//! by a handful of public resolvers that are independent of the local network.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::debug;

use crate::error::ReconError;

pub const DNS_PORT: u16 = 53;

const RESOLV_CONF: &str = "/etc/resolv.conf";

const PUBLIC_NAMESERVERS: [IpAddr; 3] = [
    IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
    IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
    IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9)),
];

/// Parses `ip` or `ip:port` (`[v6]:port` for IPv6) into a socket address.
pub fn parse_nameserver(s: &str) -> Result<SocketAddr, ReconError> {
    let s = s.trim();
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| ReconError::InvalidNameserver(s.to_string()))
}

/// Extracts `nameserver` entries from resolv.conf content.
///
/// Zone-scoped IPv6 entries (`fe80::1%eth0`) are skipped.
pub fn parse_resolv_conf(content: &str) -> Vec<SocketAddr> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("nameserver"), Some(addr)) => addr.parse::<IpAddr>().ok(),
                _ => None,
            }
        })
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .collect()
}

/// System resolvers, empty when resolv.conf is missing or unreadable.
pub fn system_nameservers() -> Vec<SocketAddr> {
    match std::fs::read_to_string(RESOLV_CONF) {
        Ok(content) => parse_resolv_conf(&content),
        Err(e) => {
            debug!("Could not read {RESOLV_CONF}: {e}");
            Vec::new()
        }
    }
}

pub fn public_nameservers() -> Vec<SocketAddr> {
    PUBLIC_NAMESERVERS
        .iter()
        .map(|ip| SocketAddr::new(*ip, DNS_PORT))
        .collect()
}

/// System resolvers first, public fallbacks after, without duplicates.
pub fn default_nameservers() -> Vec<SocketAddr> {
    let mut servers: Vec<SocketAddr> = system_nameservers();
    for server in public_nameservers() {
        if !servers.contains(&server) {
            servers.push(server);
        }
    }
    servers
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
