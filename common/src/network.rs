pub mod domain;
pub mod nameserver;
pub mod record;
pub mod subdomain;
