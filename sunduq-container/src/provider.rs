//! Provider trait: a module of related service registrations.
//!
//! Providers group registrations by concern so startup code stays short:
//!
//! ```rust
//! use sunduq_container::prelude::*;
//!
//! struct Questions(Vec<String>);
//! struct Progress { answered: usize }
//!
//! struct QuizProvider;
//!
//! impl Provider for QuizProvider {
//!     fn register(&self, container: &Container) -> Result<()> {
//!         container.register_instance("questions", Questions(vec!["What is a borrow?".into()]))?;
//!         container.register_transient("progress", |_| Ok(Progress { answered: 0 }))?;
//!         Ok(())
//!     }
//! }
//!
//! let container = Container::new();
//! container.add_provider(&QuizProvider).unwrap();
//! assert!(container.is_registered("questions"));
//! ```

use crate::container::Container;
use crate::error::Result;

/// A module that registers related services into a container.
///
/// # Design Philosophy
/// Split registrations by domain instead of one giant startup block:
///
/// ```rust,ignore
/// container.add_provider(&StorageProvider)?;
/// container.add_provider(&QuizProvider)?;
/// container.add_provider(&ProgressProvider)?;
/// ```
pub trait Provider: Send + Sync {
    /// Registers services into `container`.
    ///
    /// The first failing registration aborts the provider; registrations
    /// made before it stay in place.
    fn register(&self, container: &Container) -> Result<()>;

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SunduqError;

    struct TestProvider;

    impl Provider for TestProvider {
        fn register(&self, container: &Container) -> Result<()> {
            container.register_singleton("greeting", |_| Ok(String::from("hello")))?;
            container.register_transient("answer", |_| Ok(42i32))?;
            Ok(())
        }
    }

    #[test]
    fn provider_registers_services() {
        let container = Container::new();
        container.add_provider(&TestProvider).unwrap();

        assert_eq!(container.len(), 2);
        assert_eq!(*container.resolve_as::<i32>("answer").unwrap(), 42);
    }

    #[test]
    fn provider_errors_propagate() {
        let container = Container::new();
        container.add_provider(&TestProvider).unwrap();

        let err = container.add_provider(&TestProvider).unwrap_err();
        assert!(matches!(err, SunduqError::DuplicateRegistration(_)));
    }

    #[test]
    fn provider_has_name() {
        assert!(TestProvider.name().contains("TestProvider"));
    }
}
