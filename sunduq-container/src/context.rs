//! Process-wide access to one application container.
//!
//! The container type itself is never a hidden singleton. Applications that
//! want global access install a container explicitly, once, at startup:
//!
//! ```rust,ignore
//! let container = Container::new();
//! register_services(&container)?;
//! sunduq_container::context::install(container)?;
//!
//! // anywhere later
//! let tracker = context::current()?.resolve_as::<ProgressTracker>("progressTracker")?;
//! ```

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::container::Container;
use crate::error::{Result, SunduqError};

static CURRENT: OnceCell<Arc<Container>> = OnceCell::new();

/// Installs `container` as the process-wide container.
///
/// Returns a shared handle to it.
///
/// # Errors
/// [`SunduqError::ContextAlreadyInstalled`] if a container was installed
/// before; the new container is dropped.
pub fn install(container: Container) -> Result<Arc<Container>> {
    let shared = Arc::new(container);
    CURRENT
        .set(shared.clone())
        .map_err(|_| SunduqError::ContextAlreadyInstalled)?;

    info!(registered = shared.len(), "Installed global container");
    Ok(shared)
}

/// The installed container.
///
/// # Errors
/// [`SunduqError::ContextNotInstalled`] before [`install`] ran.
pub fn current() -> Result<&'static Arc<Container>> {
    CURRENT.get().ok_or(SunduqError::ContextNotInstalled)
}

/// The installed container, if any.
pub fn try_current() -> Option<&'static Arc<Container>> {
    CURRENT.get()
}
