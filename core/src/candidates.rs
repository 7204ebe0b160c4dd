//! # Candidate Generator
//!
//! Turns a wordlist into the lazy sequence of subdomain candidates to probe.
//! No network access happens here; calling [`Wordlist::candidates`] again
//! restarts the sequence from the first label.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use sonar_common::config::WordlistSource;
use sonar_common::error::ReconError;
use sonar_common::network::domain::Domain;
use sonar_common::network::subdomain::SubdomainCandidate;

const DEFAULT_WORDLIST: &[&str] = &[
    "www", "mail", "ftp", "api", "blog", "dev", "staging", "cdn", "admin", "portal",
    "shop", "store", "app", "apps", "m", "mobile", "test", "demo", "beta", "alpha",
    "docs", "help", "support", "status", "static", "assets", "img", "images", "media", "files",
    "download", "downloads", "upload", "vpn", "remote", "gateway", "proxy", "ns", "ns1", "ns2",
    "ns3", "dns", "mx", "mx1", "mx2", "smtp", "pop", "pop3", "imap", "webmail",
    "email", "exchange", "autodiscover", "owa", "login", "auth", "sso", "id", "accounts", "secure",
    "dashboard", "panel", "cpanel", "intranet", "internal", "corp", "git", "gitlab", "jenkins", "ci",
    "build", "jira", "wiki", "confluence", "grafana", "monitor", "metrics", "logs", "kibana", "db",
    "mysql", "sql", "redis", "backup", "old", "new", "web", "web1", "web2", "server",
    "host", "cloud", "s3", "origin", "edge", "news", "forum", "community", "events", "careers",
    "partners", "billing", "payments", "crm", "erp", "sandbox", "uat", "qa", "preprod", "prod",
];

/// An ordered, duplicate-free list of candidate labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wordlist {
    labels: Vec<String>,
}

impl Wordlist {
    /// Normalizes labels: trimmed, lowercased, blank lines and `#` comments
    /// dropped, first occurrence of a duplicate kept.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let labels: Vec<String> = labels
            .into_iter()
            .map(|label| label.as_ref().trim().trim_matches('.').to_ascii_lowercase())
            .filter(|label| !label.is_empty() && !label.starts_with('#'))
            .filter(|label| seen.insert(label.clone()))
            .collect();

        Self { labels }
    }

    pub fn builtin() -> Self {
        Self::new(DEFAULT_WORDLIST)
    }

    /// Reads one label per line.
    pub fn from_file(path: &Path) -> Result<Self, ReconError> {
        let content: String = std::fs::read_to_string(path).map_err(|source| ReconError::Wordlist {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(content.lines()))
    }

    pub fn from_source(source: &WordlistSource) -> Result<Self, ReconError> {
        match source {
            WordlistSource::Builtin => Ok(Self::builtin()),
            WordlistSource::File(path) => Self::from_file(path),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn candidates<'a>(&'a self, domain: &'a Domain) -> Candidates<'a> {
        Candidates {
            labels: self.labels.iter(),
            domain,
        }
    }
}

/// Lazy `label.domain` sequence. Labels that do not form a valid name are skipped.
pub struct Candidates<'a> {
    labels: std::slice::Iter<'a, String>,
    domain: &'a Domain,
}

impl Iterator for Candidates<'_> {
    type Item = SubdomainCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        for label in self.labels.by_ref() {
            match self.domain.child(label) {
                Ok(fqdn) => {
                    return Some(SubdomainCandidate {
                        label: label.clone(),
                        fqdn,
                    });
                }
                Err(e) => debug!("Skipping wordlist entry: {e}"),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.labels.len()))
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
