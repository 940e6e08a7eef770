//! Service lifetimes.
//!
//! A lifetime decides how often a registration's factory runs:
//! - [`Lifetime::Singleton`]: once per container, the result is cached
//! - [`Lifetime::Transient`]: on every resolve, nothing is cached
use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines how long a resolved service lives within a container.
///
/// # Examples
/// ```
/// use sunduq_container::lifetime::Lifetime;
///
/// assert!(Lifetime::Singleton.is_cached());
/// assert!(!Lifetime::Transient.is_cached());
/// assert_eq!(Lifetime::default(), Lifetime::Singleton);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// One instance shared by everything resolving the service.
    ///
    /// Built on first resolve and kept until the registration is replaced,
    /// removed, or the container is disposed. Child containers created after
    /// the first resolve inherit the built instance.
    ///
    /// # When to use
    /// - Question banks loaded once per session
    /// - Progress stores backed by persistent storage
    /// - Shared configuration
    #[default]
    Singleton,

    /// New instance created on every resolve call.
    ///
    /// Never cached and never torn down by the container.
    ///
    /// # When to use
    /// - Lightweight stateless helpers
    /// - Per-question view models
    Transient,
}

impl Lifetime {
    /// Returns `true` if resolved instances are cached in the registration.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}
