//! # Sunduq Support
//!
//! Shared helpers for the Sunduq container crates.
//!
//! This crate provides:
//! - Text rendering for resolution chains and service labels
//! - "Did you mean?" matching for unknown service identifiers

pub mod rendering;
