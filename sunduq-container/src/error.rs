//! Error types for Sunduq container operations.
//!
//! Every failure names the service involved and, where it helps, the
//! services around it: the chain of a cycle, the consumer of a missing
//! dependency, registered identifiers that look like a typo'd one.

use std::fmt;

use sunduq_support::rendering::render_chain;

use crate::key::ServiceId;

/// Boxed error type produced by factories and teardown hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Sunduq operations.
#[derive(Debug, thiserror::Error)]
pub enum SunduqError {
    /// Requested service was never registered.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// Circular dependency detected during resolve.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// Service was already registered and no override was requested.
    #[error("{}", .0)]
    DuplicateRegistration(DuplicateRegistrationError),

    /// Resolved instance is not of the requested type.
    #[error("Type mismatch for {id}: expected {expected}")]
    TypeMismatch { id: ServiceId, expected: &'static str },

    /// Factory reported an error of its own during construction.
    #[error("Failed to construct {id}: {source}")]
    ConstructionFailed {
        id: ServiceId,
        #[source]
        source: BoxError,
    },

    /// A global container was installed twice.
    #[error("A global container is already installed")]
    ContextAlreadyInstalled,

    /// The global container was requested before being installed.
    #[error("No global container installed. Call context::install() at startup")]
    ContextNotInstalled,
}

impl SunduqError {
    /// Wraps an application error raised while building `id`.
    ///
    /// Factories use this to surface their own failures:
    ///
    /// ```rust,ignore
    /// container.register_singleton("questionBank", |_| {
    ///     QuestionBank::parse(RAW).map_err(|e| SunduqError::construction("questionBank", e))
    /// })?;
    /// ```
    pub fn construction(id: impl Into<ServiceId>, source: impl Into<BoxError>) -> Self {
        SunduqError::ConstructionFailed {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Error when a service was not registered.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The service that was requested
    pub requested: ServiceId,
    /// The service under construction that asked for it (if any)
    pub required_by: Option<ServiceId>,
    /// Registered identifiers that look similar
    pub suggestions: Vec<ServiceId>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to register {}?",
            self.requested
        )
    }
}

/// Error when a circular dependency is detected.
///
/// The chain runs from the first occurrence of the repeated service to the
/// repeat, in call order.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Example: `[A, B, C, A]`
    pub chain: Vec<ServiceId>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.chain.iter().map(ServiceId::label).collect();
        write!(f, "Circular dependency detected: {}", render_chain(&labels))
    }
}

/// Error when trying to register a service that already exists.
#[derive(Debug)]
pub struct DuplicateRegistrationError {
    pub id: ServiceId,
}

impl fmt::Display for DuplicateRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service already registered: {}", self.id)?;
        write!(
            f,
            "\n  Hint: Use register_with_override(.., true) to replace it explicitly"
        )
    }
}

/// Failure of a single teardown hook during disposal.
///
/// Never returned as an `Err`; collected into a
/// [`DisposalReport`](crate::dispose::DisposalReport) instead.
#[derive(Debug, thiserror::Error)]
#[error("Failed to dispose {id}: {cause}")]
pub struct DisposalError {
    pub id: ServiceId,
    pub cause: DisposalCause,
}

/// What went wrong inside a teardown hook.
#[derive(Debug, thiserror::Error)]
pub enum DisposalCause {
    /// The hook returned an error.
    #[error("{0}")]
    Failed(BoxError),

    /// The hook panicked.
    #[error("teardown panicked: {0}")]
    Panicked(String),
}

/// Convenient Result type for Sunduq operations.
pub type Result<T> = std::result::Result<T, SunduqError>;
