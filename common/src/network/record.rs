//! # DNS Record Model
//!
//! Typed answers produced by a resolver and the aggregated, immutable
//! [`DnsResult`] of one `lookup_all` invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::QueryError;
use crate::network::domain::Domain;

/// The closed set of record types queried during an aggregation pass.
///
/// The declaration order is the canonical ordering of result maps and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Mx,
    Ns,
    Cname,
    Txt,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Cname,
        RecordType::Txt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
        }
    }

    /// Whether answers of this type carry a literal address.
    pub fn is_address(&self) -> bool {
        matches!(self, RecordType::A | RecordType::Aaaa)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single answer record.
///
/// `value` depends on the type: a literal IP for A/AAAA, `"priority hostname"`
/// for MX, a hostname for NS/CNAME, raw text for TXT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl DnsRecord {
    pub fn new(record_type: RecordType, value: impl Into<String>, ttl: Option<u32>) -> Self {
        Self {
            record_type,
            value: value.into(),
            ttl,
        }
    }

    /// Parses the value as an address for A/AAAA records.
    pub fn ip_addr(&self) -> Option<IpAddr> {
        if !self.record_type.is_address() {
            return None;
        }
        self.value.parse::<IpAddr>().ok()
    }
}

/// Outcome of one `lookup_all` invocation.
///
/// Every [`RecordType`] key is present in [`DnsResult::records`], empty when
/// the type returned nothing or failed. Failures are kept in
/// [`DnsResult::errors`].
#[derive(Debug, Clone)]
pub struct DnsResult {
    domain: Domain,
    queried_at: DateTime<Utc>,
    records: BTreeMap<RecordType, Vec<DnsRecord>>,
    errors: BTreeMap<RecordType, QueryError>,
    truncated: bool,
}

impl DnsResult {
    /// Merges per-type outcomes into a result.
    ///
    /// Types absent from `outcomes` were abandoned at the deadline and are
    /// recorded as [`QueryError::Timeout`]. Later duplicates of a type are ignored.
    pub fn new<I>(domain: Domain, outcomes: I, truncated: bool) -> Self
    where
        I: IntoIterator<Item = (RecordType, Result<Vec<DnsRecord>, QueryError>)>,
    {
        let mut records: BTreeMap<RecordType, Vec<DnsRecord>> = BTreeMap::new();
        let mut errors: BTreeMap<RecordType, QueryError> = BTreeMap::new();

        for (record_type, outcome) in outcomes {
            if records.contains_key(&record_type) {
                continue;
            }
            match outcome {
                Ok(answers) => {
                    records.insert(record_type, answers);
                }
                Err(e) => {
                    records.insert(record_type, Vec::new());
                    errors.insert(record_type, e);
                }
            }
        }

        for record_type in RecordType::ALL {
            records.entry(record_type).or_insert_with(|| {
                errors.insert(record_type, QueryError::Timeout);
                Vec::new()
            });
        }

        Self {
            domain,
            queried_at: Utc::now(),
            records,
            errors,
            truncated,
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn queried_at(&self) -> DateTime<Utc> {
        self.queried_at
    }

    pub fn records(&self) -> &BTreeMap<RecordType, Vec<DnsRecord>> {
        &self.records
    }

    pub fn records_of(&self, record_type: RecordType) -> &[DnsRecord] {
        self.records
            .get(&record_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn errors(&self) -> &BTreeMap<RecordType, QueryError> {
        &self.errors
    }

    pub fn error_of(&self, record_type: RecordType) -> Option<&QueryError> {
        self.errors.get(&record_type)
    }

    /// True when the deadline fired before every type settled.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn total_records(&self) -> usize {
        self.records.values().map(Vec::len).sum()
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
