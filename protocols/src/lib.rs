//! Wire formats spoken by the engine.

pub mod dns;
