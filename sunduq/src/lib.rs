//! # Sunduq, a small dependency injection container
//!
//! Explicit factories, two lifetimes (singleton and transient), cycle
//! detection with readable chains, child containers for scoped overrides,
//! and coordinated teardown of cached services.
//!
//! ```rust
//! use sunduq::prelude::*;
//!
//! struct Storage;
//! struct ProgressTracker { storage: std::sync::Arc<Storage> }
//!
//! let container = Container::new();
//! container.register_singleton("storage", |_| Ok(Storage)).unwrap();
//! container
//!     .register_singleton("progressTracker", |c| {
//!         Ok(ProgressTracker { storage: c.resolve_as("storage")? })
//!     })
//!     .unwrap();
//!
//! let tracker = container.resolve_as::<ProgressTracker>("progressTracker").unwrap();
//! let storage = container.resolve_as::<Storage>("storage").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&tracker.storage, &storage));
//! ```

pub use sunduq_container::*;
pub use sunduq_support::*;
