//! # Export Documents
//!
//! Structural mapping of results into the JSON exchange format read by
//! presentation layers. Keys are camelCase and timestamps ISO-8601.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::network::domain::Domain;
use crate::network::record::{DnsRecord, DnsResult, RecordType};
use crate::network::subdomain::{SubdomainRecord, SubdomainResult, SubdomainStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupExport<'a> {
    pub domain: &'a Domain,
    pub timestamp: String,
    pub records: &'a BTreeMap<RecordType, Vec<DnsRecord>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    pub user_agent: String,
    pub tool_info: &'a ToolInfo,
}

impl<'a> LookupExport<'a> {
    pub fn new(result: &'a DnsResult, tool_info: &'a ToolInfo) -> Self {
        Self {
            domain: result.domain(),
            timestamp: iso_8601(result.queried_at()),
            records: result.records(),
            truncated: result.truncated(),
            user_agent: tool_info.user_agent(),
            tool_info,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdomainExport {
    pub subdomain: String,
    pub ip: Option<String>,
    pub status: SubdomainStatus,
    pub services: Vec<String>,
    pub last_checked: String,
}

impl From<&SubdomainRecord> for SubdomainExport {
    fn from(record: &SubdomainRecord) -> Self {
        Self {
            subdomain: record.fqdn.to_string(),
            ip: record.resolved_address.map(|ip| ip.to_string()),
            status: record.status,
            services: record.services.iter().map(|s| s.to_string()).collect(),
            last_checked: iso_8601(record.last_checked),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanExport<'a> {
    pub domain: &'a Domain,
    pub subdomains: Vec<SubdomainExport>,
    pub total_found: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    pub user_agent: String,
    pub tool_info: &'a ToolInfo,
}

impl<'a> ScanExport<'a> {
    pub fn new(result: &'a SubdomainResult, tool_info: &'a ToolInfo) -> Self {
        Self {
            domain: result.domain(),
            subdomains: result.subdomains().iter().map(SubdomainExport::from).collect(),
            total_found: result.total_found(),
            truncated: result.truncated(),
            user_agent: tool_info.user_agent(),
            tool_info,
        }
    }
}

fn iso_8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
