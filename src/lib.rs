//! Dirwatch - Directory change notifications over Server-Sent Events
//!
//! Hexagonal Architecture:
//! - domain/: Change events and their text format
//! - ports/: Trait definitions
//! - adapters/: Broadcast hub and HTTP/SSE surface
//! - application/: Polling scanner
//! - config: Environment configuration
//! - error: Error types

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::broadcast::{Broadcaster, Subscription};
pub use application::scanner::Scanner;
pub use config::WatchConfig;
pub use domain::events::{ChangeEvent, ChangeKind};
