//! Cross-crate tests of the lookup and scan engines against deterministic
//! collaborators.

pub mod support;

mod lookup;
mod scan;
