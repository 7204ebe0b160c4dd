//! # UDP Resolver Client
//!
//! Sends one query of one record type to the configured nameservers in order.
//!
//! * Every server gets up to [`ATTEMPTS_PER_SERVER`] attempts on timeout or transport errors.
//! * A refused or malformed reply moves straight on to the next server.
//! * An NXDOMAIN is authoritative and ends the query immediately.
//! * A reply with the TC bit is repeated over TCP against the same server.
//!
//! The whole operation is bounded by `timeout × attempts × servers`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::debug;

use sonar_common::config::Config;
use sonar_common::error::{QueryError, ReconError};
use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, RecordType};
use sonar_common::resolving::Resolver;
use sonar_protocols::dns::{self, Reply};

pub const ATTEMPTS_PER_SERVER: u32 = 2;

const MAX_UDP_PAYLOAD: usize = 4096;

/// How one attempt against one server failed.
enum Attempt {
    /// Timeout or transport failure; the same server gets another attempt.
    Retry(QueryError),
    /// The server replied; asking it again changes nothing.
    Answered(QueryError),
}

pub struct UdpResolver {
    nameservers: Vec<SocketAddr>,
    timeout: Duration,
}

impl UdpResolver {
    pub fn new(nameservers: Vec<SocketAddr>, timeout: Duration) -> Result<Self, ReconError> {
        if nameservers.is_empty() {
            return Err(ReconError::NoNameservers);
        }
        if timeout.is_zero() {
            return Err(ReconError::InvalidSetting("query timeout must be positive"));
        }
        Ok(Self { nameservers, timeout })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ReconError> {
        Self::new(cfg.nameservers.clone(), cfg.query_timeout)
    }

    /// Upper bound of a single [`Resolver::resolve`] call.
    pub fn overall_deadline(&self) -> Duration {
        self.timeout
            .saturating_mul(ATTEMPTS_PER_SERVER)
            .saturating_mul(self.nameservers.len() as u32)
    }

    async fn resolve_with_fallback(
        &self,
        domain: &Domain,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, QueryError> {
        let mut last_error: QueryError = QueryError::Timeout;

        for server in &self.nameservers {
            for attempt in 1..=ATTEMPTS_PER_SERVER {
                match self.query_server(*server, domain, record_type).await {
                    Ok(records) => return Ok(records),
                    Err(Attempt::Answered(QueryError::Nxdomain)) => return Err(QueryError::Nxdomain),
                    Err(Attempt::Answered(e)) => {
                        debug!("{record_type} {domain} via {server}: {e}, trying next server");
                        last_error = e;
                        break;
                    }
                    Err(Attempt::Retry(e)) => {
                        debug!("{record_type} {domain} via {server}: {e} (attempt {attempt}/{ATTEMPTS_PER_SERVER})");
                        last_error = e;
                    }
                }
            }
        }

        Err(last_error)
    }

    async fn query_server(
        &self,
        server: SocketAddr,
        domain: &Domain,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, Attempt> {
        let id: u16 = dns::next_transaction_id();
        let query: Vec<u8> = dns::create_query_packet(domain, record_type, id)
            .map_err(|e| Attempt::Answered(protocol_error(e)))?;

        let payload: Vec<u8> = timeout(self.timeout, exchange_udp(server, &query, id))
            .await
            .map_err(|_elapsed| Attempt::Retry(QueryError::Timeout))?
            .map_err(Attempt::Retry)?;

        let mut reply: Reply =
            dns::parse_reply(&payload, record_type).map_err(|e| Attempt::Answered(protocol_error(e)))?;

        if reply == Reply::Truncated {
            debug!("{record_type} {domain} via {server}: truncated over UDP, retrying over TCP");
            let payload: Vec<u8> = timeout(self.timeout, exchange_tcp(server, &query, id))
                .await
                .map_err(|_elapsed| Attempt::Retry(QueryError::Timeout))?
                .map_err(Attempt::Retry)?;
            reply = dns::parse_reply(&payload, record_type).map_err(|e| Attempt::Answered(protocol_error(e)))?;
        }

        let outcome: QueryError = match reply {
            Reply::Answers(records) => return Ok(records),
            Reply::NxDomain => QueryError::Nxdomain,
            Reply::Truncated => QueryError::ServerError("truncated reply over TCP".to_string()),
            Reply::Failure(code) => QueryError::ServerError(code),
        };
        Err(Attempt::Answered(outcome))
    }
}

#[async_trait]
impl Resolver for UdpResolver {
    async fn resolve(&self, domain: &Domain, record_type: RecordType) -> Result<Vec<DnsRecord>, QueryError> {
        timeout(self.overall_deadline(), self.resolve_with_fallback(domain, record_type))
            .await
            .unwrap_or(Err(QueryError::Timeout))
    }
}

/// Sends `query` and waits for the reply carrying the same transaction id.
async fn exchange_udp(server: SocketAddr, query: &[u8], id: u16) -> Result<Vec<u8>, QueryError> {
    let socket: UdpSocket = UdpSocket::bind(unspecified_for(&server))
        .await
        .map_err(transport_error)?;
    socket.connect(server).await.map_err(transport_error)?;
    socket.send(query).await.map_err(transport_error)?;

    let mut buffer: Vec<u8> = vec![0u8; MAX_UDP_PAYLOAD];
    loop {
        let len: usize = socket.recv(&mut buffer).await.map_err(transport_error)?;
        if dns::get_transaction_id(&buffer[..len]) == Some(id) {
            buffer.truncate(len);
            return Ok(buffer);
        }
        debug!("Ignoring reply with foreign transaction id from {server}");
    }
}

async fn exchange_tcp(server: SocketAddr, query: &[u8], id: u16) -> Result<Vec<u8>, QueryError> {
    let frame: Vec<u8> = dns::add_tcp_length(query).map_err(protocol_error)?;
    let mut stream: TcpStream = TcpStream::connect(server).await.map_err(transport_error)?;
    stream.write_all(&frame).await.map_err(transport_error)?;

    let mut len_bytes: [u8; 2] = [0u8; 2];
    stream.read_exact(&mut len_bytes).await.map_err(transport_error)?;
    let mut payload: Vec<u8> = vec![0u8; u16::from_be_bytes(len_bytes) as usize];
    stream.read_exact(&mut payload).await.map_err(transport_error)?;

    if dns::get_transaction_id(&payload) != Some(id) {
        return Err(QueryError::ServerError("foreign transaction id over TCP".to_string()));
    }
    Ok(payload)
}

fn unspecified_for(server: &SocketAddr) -> SocketAddr {
    let ip: IpAddr = match server {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

fn transport_error(e: std::io::Error) -> QueryError {
    QueryError::ServerError(format!("transport: {e}"))
}

fn protocol_error(e: anyhow::Error) -> QueryError {
    QueryError::ServerError(format!("{e:#}"))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
