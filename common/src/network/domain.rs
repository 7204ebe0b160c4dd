//! # Domain Model
//!
//! Defines the validated input of every lookup and scan.
//!
//! A [`Domain`] is a fully-qualified name that has been checked against the
//! hostname grammar before any packet leaves the machine:
//! * Labels of 1 to 63 characters, alphanumeric or hyphen, never starting or ending with a hyphen.
//! * At most 253 characters in total.
//! * At least two labels.
//! * A TLD-like final label (alphabetic, or an IDNA `xn--` label).

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ReconError;

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const IDNA_PREFIX: &str = "xn--";

/// A validated, lowercase domain name without trailing dot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(String);

impl Domain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prepends `label` to this domain, validating the resulting name.
    pub fn child(&self, label: &str) -> Result<Domain, ReconError> {
        Domain::from_str(&format!("{label}.{}", self.0))
    }
}

impl FromStr for Domain {
    type Err = ReconError;

    /// Parses and normalizes a domain name.
    ///
    /// Surrounding whitespace and a single trailing dot are stripped and the
    /// name is lowercased before validation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed: &str = s.trim();
        let name: String = trimmed
            .strip_suffix('.')
            .unwrap_or(trimmed)
            .to_ascii_lowercase();

        if name.is_empty() {
            return Err(ReconError::invalid_domain(s, "empty name"));
        }

        if name.len() > MAX_NAME_LEN {
            return Err(ReconError::invalid_domain(
                s,
                format!("longer than {MAX_NAME_LEN} characters"),
            ));
        }

        let labels: Vec<&str> = name.split('.').collect();
        if labels.len() < 2 {
            return Err(ReconError::invalid_domain(s, "at least one dot is required"));
        }

        for label in &labels {
            check_label(label).map_err(|reason| ReconError::invalid_domain(s, reason))?;
        }

        if let Some(tld) = labels.last() {
            check_tld(tld).map_err(|reason| ReconError::invalid_domain(s, reason))?;
        }

        Ok(Domain(name))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Checks a single label against the hostname grammar.
fn check_label(label: &str) -> Result<(), String> {
    if label.is_empty() {
        return Err("empty label".to_string());
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(format!("label '{label}' is longer than {MAX_LABEL_LEN} characters"));
    }
    if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(format!("label '{label}' contains invalid characters"));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(format!("label '{label}' starts or ends with a hyphen"));
    }
    Ok(())
}

fn check_tld(tld: &str) -> Result<(), String> {
    let is_idna: bool = tld.starts_with(IDNA_PREFIX) && tld.len() > IDNA_PREFIX.len();
    let is_alphabetic: bool = tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic());

    if is_idna || is_alphabetic {
        Ok(())
    } else {
        Err(format!("'{tld}' is not a valid top-level label"))
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
