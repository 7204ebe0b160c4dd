//! # Sonar Common
//!
//! Shared vocabulary of the workspace: the reconnaissance data model, the error
//! taxonomy, configuration, and the capability traits the engine in
//! `sonar-core` is written against.
//!
//! * **[`network`]**: Domains, DNS records, subdomain results and nameservers.
//! * **[`resolving`]**: The [`resolving::Resolver`] and [`resolving::ServiceProber`] boundaries.
//! * **[`export`]**: The JSON documents handed to presentation layers.

pub mod config;
pub mod error;
pub mod export;
pub mod network;
pub mod resolving;
