//! # Subdomain Model
//!
//! Candidates fed to the scanner and the immutable records it emits.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::network::domain::Domain;

/// A hypothesized subdomain awaiting resolution and probing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubdomainCandidate {
    pub label: String,
    pub fqdn: Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubdomainStatus {
    /// Resolvable with at least one responsive service.
    Active,
    /// Resolvable, but nothing answered on the probed ports.
    Inactive,
}

/// Well-known services probed on every resolvable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceTag {
    Ftp,
    Smtp,
    Http,
    Imap,
    Https,
}

impl ServiceTag {
    pub const ALL: [ServiceTag; 5] = [
        ServiceTag::Http,
        ServiceTag::Https,
        ServiceTag::Smtp,
        ServiceTag::Imap,
        ServiceTag::Ftp,
    ];

    pub fn port(&self) -> u16 {
        match self {
            ServiceTag::Ftp => 21,
            ServiceTag::Smtp => 25,
            ServiceTag::Http => 80,
            ServiceTag::Imap => 143,
            ServiceTag::Https => 443,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceTag::Ftp => "FTP",
            ServiceTag::Smtp => "SMTP",
            ServiceTag::Http => "HTTP",
            ServiceTag::Imap => "IMAP",
            ServiceTag::Https => "HTTPS",
        }
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainRecord {
    pub fqdn: Domain,
    pub resolved_address: Option<IpAddr>,
    pub status: SubdomainStatus,
    pub services: BTreeSet<ServiceTag>,
    pub last_checked: DateTime<Utc>,
}

impl SubdomainRecord {
    /// Builds a record, deriving the status from the responsive services.
    pub fn new(fqdn: Domain, resolved_address: Option<IpAddr>, services: BTreeSet<ServiceTag>) -> Self {
        let status: SubdomainStatus = if services.is_empty() {
            SubdomainStatus::Inactive
        } else {
            SubdomainStatus::Active
        };

        Self {
            fqdn,
            resolved_address,
            status,
            services,
            last_checked: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubdomainStatus::Active
    }
}

/// Outcome of one `scan` invocation.
///
/// Subdomains are unique by fqdn and sorted by it; `total_found` always equals
/// their count.
#[derive(Debug, Clone)]
pub struct SubdomainResult {
    domain: Domain,
    scanned_at: DateTime<Utc>,
    subdomains: Vec<SubdomainRecord>,
    total_found: usize,
    wildcard_addresses: BTreeSet<IpAddr>,
    truncated: bool,
}

impl SubdomainResult {
    /// Deduplicates by fqdn (first occurrence wins) and sorts the records.
    pub fn new<I>(domain: Domain, records: I, wildcard_addresses: BTreeSet<IpAddr>, truncated: bool) -> Self
    where
        I: IntoIterator<Item = SubdomainRecord>,
    {
        let mut unique: BTreeMap<String, SubdomainRecord> = BTreeMap::new();
        for record in records {
            unique
                .entry(record.fqdn.as_str().to_string())
                .or_insert(record);
        }

        let subdomains: Vec<SubdomainRecord> = unique.into_values().collect();
        let total_found: usize = subdomains.len();

        Self {
            domain,
            scanned_at: Utc::now(),
            subdomains,
            total_found,
            wildcard_addresses,
            truncated,
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    pub fn subdomains(&self) -> &[SubdomainRecord] {
        &self.subdomains
    }

    pub fn total_found(&self) -> usize {
        self.total_found
    }

    pub fn active_count(&self) -> usize {
        self.subdomains.iter().filter(|s| s.is_active()).count()
    }

    /// Addresses a random, nonexistent label resolved to. Empty without wildcard DNS.
    pub fn wildcard_addresses(&self) -> &BTreeSet<IpAddr> {
        &self.wildcard_addresses
    }

    /// True when the deadline fired before every candidate settled.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
