//! Ports - Trait definitions at the seams between layers.

pub mod notifier;
