//! Shared types used across the gate

/// Error taxonomy
pub mod error;
