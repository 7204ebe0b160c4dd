use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sonar_common::error::QueryError;
use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, RecordType};
use sonar_common::network::subdomain::ServiceTag;
use sonar_common::resolving::{Resolver, ServiceProber};

pub fn domain(name: &str) -> anyhow::Result<Domain> {
    Ok(Domain::from_str(name)?)
}

/// Answers from a fixed table. Names or types absent from the table are NXDOMAIN.
#[derive(Default)]
pub struct StaticResolver {
    answers: HashMap<(String, RecordType), Result<Vec<DnsRecord>, QueryError>>,
    fallback: Option<QueryError>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every query missing from the table with `error` instead of NXDOMAIN.
    pub fn failing_with(error: QueryError) -> Self {
        Self {
            fallback: Some(error),
            ..Self::default()
        }
    }

    pub fn answer(mut self, name: &str, record_type: RecordType, values: &[(&str, u32)]) -> Self {
        let records: Vec<DnsRecord> = values
            .iter()
            .map(|(value, ttl)| DnsRecord::new(record_type, *value, Some(*ttl)))
            .collect();
        self.answers.insert((name.to_string(), record_type), Ok(records));
        self
    }

    pub fn fail(mut self, name: &str, record_type: RecordType, error: QueryError) -> Self {
        self.answers.insert((name.to_string(), record_type), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, domain: &Domain, record_type: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::task::yield_now().await;

        match self.answers.get(&(domain.as_str().to_string(), record_type)) {
            Some(answer) => answer.clone(),
            None => Err(self.fallback.clone().unwrap_or(QueryError::Nxdomain)),
        }
    }
}

/// Never answers.
pub struct HangingResolver;

#[async_trait]
impl Resolver for HangingResolver {
    async fn resolve(&self, _: &Domain, _: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        std::future::pending().await
    }
}

/// Answers from `inner` when it has an entry and never answers otherwise.
pub struct PartialResolver {
    pub inner: StaticResolver,
}

#[async_trait]
impl Resolver for PartialResolver {
    async fn resolve(&self, domain: &Domain, record_type: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        if !self.inner.answers.contains_key(&(domain.as_str().to_string(), record_type)) {
            return std::future::pending().await;
        }
        self.inner.resolve(domain, record_type).await
    }
}

/// Holds every query for `delay` and records the peak number of queries in flight.
pub struct SlowResolver {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowResolver {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for SlowResolver {
    async fn resolve(&self, _: &Domain, _: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        let now: usize = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Err(QueryError::Nxdomain)
    }
}

/// Reports a fixed set of services as responsive per address.
#[derive(Default)]
pub struct StaticProber {
    open: HashMap<IpAddr, BTreeSet<ServiceTag>>,
}

impl StaticProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(mut self, addr: &str, service: ServiceTag) -> Self {
        if let Ok(addr) = addr.parse::<IpAddr>() {
            self.open.entry(addr).or_default().insert(service);
        }
        self
    }
}

#[async_trait]
impl ServiceProber for StaticProber {
    async fn probe(&self, addr: IpAddr, service: ServiceTag) -> bool {
        self.open
            .get(&addr)
            .is_some_and(|services| services.contains(&service))
    }
}
