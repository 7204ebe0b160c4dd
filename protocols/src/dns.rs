use anyhow::{Context, ensure};
use dns_parser::{Builder, Packet, QueryClass, QueryType, RData, ResponseCode};
use tracing::trace;

use sonar_common::network::domain::Domain;
use sonar_common::network::record::{DnsRecord, RecordType};

pub const DNS_HDR_LEN: usize = 12;

const FLAG_QR: u8 = 0x80;
const FLAG_TC: u8 = 0x02;
const FLAG_RD: u8 = 0x01;
const FLAG_RA: u8 = 0x80;
const CLASS_IN: u16 = 1;
const MAX_LABEL_LEN: u8 = 63;
const QUESTION_POINTER: [u8; 2] = [0xC0, DNS_HDR_LEN as u8];

/// A decoded reply, reduced to what the resolver acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// NOERROR. Answers of the queried type in server order, possibly none.
    Answers(Vec<DnsRecord>),
    /// NXDOMAIN: the name does not exist.
    NxDomain,
    /// The TC bit is set; the full reply needs a stream transport.
    Truncated,
    /// Any other response code.
    Failure(String),
}

pub fn next_transaction_id() -> u16 {
    rand::random::<u16>()
}

pub fn create_query_packet(domain: &Domain, record_type: RecordType, id: u16) -> anyhow::Result<Vec<u8>> {
    let mut builder: Builder = Builder::new_query(id, true);
    builder.add_question(domain.as_str(), false, query_type(record_type), QueryClass::IN);
    builder
        .build()
        .map_err(|_| anyhow::anyhow!("query for {domain} does not fit in one packet"))
}

/// Reads the transaction id without decoding the rest of the packet.
pub fn get_transaction_id(payload: &[u8]) -> Option<u16> {
    match payload {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

pub fn parse_reply(payload: &[u8], record_type: RecordType) -> anyhow::Result<Reply> {
    ensure!(payload.len() >= DNS_HDR_LEN, "reply shorter than a DNS header");
    ensure!(payload[2] & FLAG_QR != 0, "packet is not a reply");

    // Checked before decoding, a truncated body may not parse.
    if payload[2] & FLAG_TC != 0 {
        return Ok(Reply::Truncated);
    }

    let packet: Packet = Packet::parse(payload).context("failed to parse DNS reply")?;
    match packet.header.response_code {
        ResponseCode::NoError => {}
        ResponseCode::NameError => return Ok(Reply::NxDomain),
        code => return Ok(Reply::Failure(format!("{code:?}"))),
    }

    let (answers, chained): (Vec<DnsRecord>, Vec<DnsRecord>) = packet
        .answers
        .iter()
        .filter_map(|answer| to_record(&answer.data, answer.ttl))
        .partition(|record| record.record_type == record_type);

    if !chained.is_empty() {
        trace!("Skipped {} answers not of type {record_type}", chained.len());
    }
    Ok(Reply::Answers(answers))
}

/// Builds a reply to `query` carrying `answers` as `(type, ttl, rdata)`.
///
/// The question is echoed from the query, which must hold exactly one question
/// and nothing else. Used by in-process nameservers.
pub fn create_reply_packet(
    query: &[u8],
    rcode: u8,
    truncated: bool,
    answers: &[(RecordType, u32, Vec<u8>)],
) -> anyhow::Result<Vec<u8>> {
    ensure!(query.len() > DNS_HDR_LEN + 4, "query too short to echo");
    let answer_count: u16 = u16::try_from(answers.len()).context("too many answers")?;

    let mut buffer: Vec<u8> = Vec::with_capacity(512);
    buffer.extend_from_slice(&query[..2]);
    buffer.push(FLAG_QR | FLAG_RD | if truncated { FLAG_TC } else { 0 });
    buffer.push(FLAG_RA | (rcode & 0x0F));
    buffer.extend_from_slice(&1u16.to_be_bytes());
    buffer.extend_from_slice(&answer_count.to_be_bytes());
    buffer.extend_from_slice(&[0, 0, 0, 0]);
    buffer.extend_from_slice(&query[DNS_HDR_LEN..]);

    for (record_type, ttl, rdata) in answers {
        let rd_length: u16 = u16::try_from(rdata.len()).context("rdata too long")?;
        buffer.extend_from_slice(&QUESTION_POINTER);
        buffer.extend_from_slice(&type_code(*record_type).to_be_bytes());
        buffer.extend_from_slice(&CLASS_IN.to_be_bytes());
        buffer.extend_from_slice(&ttl.to_be_bytes());
        buffer.extend_from_slice(&rd_length.to_be_bytes());
        buffer.extend_from_slice(rdata);
    }

    Ok(buffer)
}

/// Encodes a name as uncompressed wire labels. Labels longer than 63 bytes are rejected.
pub fn encode_dns_name(name: &str) -> anyhow::Result<Vec<u8>> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        let len: u8 = u8::try_from(label.len()).context("label length does not fit one byte")?;
        ensure!(len <= MAX_LABEL_LEN, "label exceeds {MAX_LABEL_LEN} bytes");
        encoded.push(len);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    Ok(encoded)
}

fn to_record(data: &RData, ttl: u32) -> Option<DnsRecord> {
    let (record_type, value): (RecordType, String) = match data {
        RData::A(a) => (RecordType::A, a.0.to_string()),
        RData::AAAA(aaaa) => (RecordType::Aaaa, aaaa.0.to_string()),
        RData::MX(mx) => (RecordType::Mx, format!("{} {}", mx.preference, mx.exchange)),
        RData::NS(ns) => (RecordType::Ns, ns.0.to_string()),
        RData::CNAME(cname) => (RecordType::Cname, cname.0.to_string()),
        RData::TXT(txt) => (
            RecordType::Txt,
            txt.iter().map(String::from_utf8_lossy).collect::<String>(),
        ),
        _ => return None,
    };
    Some(DnsRecord::new(record_type, value, Some(ttl)))
}

fn query_type(record_type: RecordType) -> QueryType {
    match record_type {
        RecordType::A => QueryType::A,
        RecordType::Aaaa => QueryType::AAAA,
        RecordType::Mx => QueryType::MX,
        RecordType::Ns => QueryType::NS,
        RecordType::Cname => QueryType::CNAME,
        RecordType::Txt => QueryType::TXT,
    }
}

fn type_code(record_type: RecordType) -> u16 {
    match record_type {
        RecordType::A => 1,
        RecordType::Ns => 2,
        RecordType::Cname => 5,
        RecordType::Mx => 15,
        RecordType::Txt => 16,
        RecordType::Aaaa => 28,
    }
}

/// Prefixes a message with its 2-byte length for stream transports.
pub fn add_tcp_length(message: &[u8]) -> anyhow::Result<Vec<u8>> {
    let len: u16 = u16::try_from(message.len()).context("message too long for TCP framing")?;
    let mut frame: Vec<u8> = Vec::with_capacity(message.len() + 2);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(message);
    Ok(frame)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
