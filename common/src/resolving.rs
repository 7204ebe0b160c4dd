//! # Network Boundaries
//!
//! Every network interaction of the engine goes through these two traits.
//! The engine depends on the abstraction only, so tests substitute
//! deterministic implementations for the UDP resolver and TCP prober.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::error::QueryError;
use crate::network::domain::Domain;
use crate::network::record::{DnsRecord, RecordType};
use crate::network::subdomain::ServiceTag;

/// Issues DNS queries of one record type.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the answers in the order the server sent them.
    ///
    /// An empty vector means the name exists but holds no record of this type.
    async fn resolve(&self, domain: &Domain, record_type: RecordType) -> Result<Vec<DnsRecord>, QueryError>;
}

/// Checks whether a well-known service answers on an address.
#[async_trait]
pub trait ServiceProber: Send + Sync {
    async fn probe(&self, addr: IpAddr, service: ServiceTag) -> bool;
}
