//! Teardown of cached instances.
//!
//! Services opt into teardown statically by implementing [`Dispose`] and
//! being registered through [`Factory::disposable`](crate::registry::Factory::disposable)
//! or [`Container::register_disposable_instance`](crate::container::Container::register_disposable_instance).
//! The container only ever tears down instances it cached, i.e. singletons.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{BoxError, DisposalCause, DisposalError};
use crate::key::ServiceId;

/// Capability of a service that holds resources needing explicit release.
///
/// # Examples
/// ```
/// use sunduq_container::dispose::Dispose;
/// use sunduq_container::error::BoxError;
///
/// struct ProgressStore;
///
/// impl Dispose for ProgressStore {
///     fn dispose(&self) -> Result<(), BoxError> {
///         // flush pending writes
///         Ok(())
///     }
/// }
/// ```
pub trait Dispose: Send + Sync {
    /// Releases the resources held by the service.
    fn dispose(&self) -> Result<(), BoxError>;
}

/// Outcome of a container disposal.
#[derive(Debug, Default)]
pub struct DisposalReport {
    /// Services whose teardown completed, in the order they ran.
    pub disposed: Vec<ServiceId>,
    /// Teardown hooks that failed or panicked.
    pub failures: Vec<DisposalError>,
}

impl DisposalReport {
    /// Returns `true` if every teardown hook succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of hooks that were invoked.
    pub fn attempted(&self) -> usize {
        self.disposed.len() + self.failures.len()
    }
}

/// Runs one teardown hook, turning errors and panics into a [`DisposalError`].
pub(crate) fn run_teardown(id: &ServiceId, hook: &dyn Dispose) -> Result<(), DisposalError> {
    let cause = match panic::catch_unwind(AssertUnwindSafe(|| hook.dispose())) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(source)) => DisposalCause::Failed(source),
        Err(payload) => DisposalCause::Panicked(panic_message(payload.as_ref())),
    };

    Err(DisposalError {
        id: id.clone(),
        cause,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
