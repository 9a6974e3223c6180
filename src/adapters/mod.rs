//! Adapters - Concrete implementations of ports.

pub mod broadcast;
pub mod http;
