//! Application layer - Services driven through ports.

pub mod scanner;
