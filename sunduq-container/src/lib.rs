//! Core container implementation for Sunduq DI.
//!
//! Factories are registered explicitly under a [`ServiceId`] and resolved on
//! demand. Resolution is recursive and synchronous; cycles are reported with
//! their full chain, singletons are built once per container, and cached
//! instances that implement [`Dispose`] are torn down by
//! [`Container::dispose`](container::Container::dispose).

pub mod container;
pub mod context;
pub mod dispose;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod registry;
pub mod settings;
mod stack;

pub use container::{Container, prelude};
pub use dispose::{Dispose, DisposalReport};
pub use error::{Result, SunduqError};
pub use key::ServiceId;
pub use lifetime::Lifetime;
pub use registry::{Factory, Instance};
