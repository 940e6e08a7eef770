//! # The Container
//!
//! Registers factories, resolves object graphs on demand, and tears cached
//! instances down at shutdown.
//!
//! # Architecture
//! ```text
//! register*()  ──>  Registry  <──  resolve()  ──>  factory(&Container)
//!                      │               │                 │
//!                create_child()   ResolutionStack   resolve() ...
//!                      │
//!                      ▼
//!              Container (value copy)
//! ```
//!
//! # Examples
//! ```rust
//! use sunduq_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct QuestionBank {
//!     questions: Vec<&'static str>,
//! }
//!
//! struct QuizSession {
//!     bank: Arc<QuestionBank>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_singleton("questionBank", |_| {
//!         Ok(QuestionBank { questions: vec!["What does `?` do?"] })
//!     })
//!     .unwrap();
//! container
//!     .register_transient("quizSession", |c| {
//!         let bank = c.resolve_as::<QuestionBank>("questionBank")?;
//!         Ok(QuizSession { bank })
//!     })
//!     .unwrap();
//!
//! let session = container.resolve_as::<QuizSession>("quizSession").unwrap();
//! assert_eq!(session.bank.questions.len(), 1);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use sunduq_support::rendering::suggest_similar;
use tracing::{debug, info, instrument, trace, warn};

use crate::dispose::{Dispose, DisposalReport, run_teardown};
use crate::error::{NotRegisteredError, Result, SunduqError};
use crate::key::ServiceId;
use crate::lifetime::Lifetime;
use crate::provider::Provider;
use crate::registry::{Built, Factory, Instance, Lookup, Registry};
use crate::settings::{ContainerSettings, DisposeMode};
use crate::stack::{ResolutionStack, StackGuard};

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Dependency injection container.
///
/// Resolution is synchronous and meant for one thread at a time. The type is
/// `Send + Sync` so it can be shared (see [`crate::context`]), but it is
/// **not safe for concurrent resolution without external synchronization**:
/// the resolution stack belongs to the container, and overlapping `resolve`
/// calls from several threads can report cycles that do not exist.
pub struct Container {
    registry: Registry,
    stack: Mutex<ResolutionStack>,
    settings: ContainerSettings,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container with default settings.
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    /// Creates an empty container.
    pub fn with_settings(settings: ContainerSettings) -> Self {
        Self {
            registry: Registry::new(),
            stack: Mutex::new(ResolutionStack::default()),
            settings,
        }
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    // ── Registration ──

    /// Registers `factory` under `id` with the given lifetime.
    ///
    /// # Errors
    /// [`SunduqError::DuplicateRegistration`] if `id` is already registered.
    pub fn register(
        &self,
        id: impl Into<ServiceId>,
        factory: Factory,
        lifetime: Lifetime,
    ) -> Result<()> {
        self.registry.insert(id.into(), factory, lifetime, false)
    }

    /// Registers `factory` under `id`, replacing an existing registration when
    /// `allow_override` is true.
    ///
    /// This is the only way to replace a registration. A replaced singleton
    /// loses its cached instance without teardown.
    ///
    /// # Errors
    /// [`SunduqError::DuplicateRegistration`] if `id` is already registered
    /// and `allow_override` is false.
    pub fn register_with_override(
        &self,
        id: impl Into<ServiceId>,
        factory: Factory,
        lifetime: Lifetime,
        allow_override: bool,
    ) -> Result<()> {
        self.registry
            .insert(id.into(), factory, lifetime, allow_override)
    }

    /// Register a singleton factory.
    ///
    /// Called once on first resolve; every later resolve returns the same
    /// instance.
    pub fn register_singleton<T, F>(&self, id: impl Into<ServiceId>, factory: F) -> Result<()>
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(id, Factory::new(factory), Lifetime::Singleton)
    }

    /// Register a transient factory.
    ///
    /// Creates a new instance on every `resolve()` call.
    pub fn register_transient<T, F>(&self, id: impl Into<ServiceId>, factory: F) -> Result<()>
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.register(id, Factory::new(factory), Lifetime::Transient)
    }

    /// Register a pre-built value as a singleton.
    pub fn register_instance<T: Any + Send + Sync>(
        &self,
        id: impl Into<ServiceId>,
        value: T,
    ) -> Result<()> {
        self.registry.insert_built(id.into(), Built::plain(value))
    }

    /// Register a pre-built value as a singleton whose [`Dispose`] hook runs
    /// when the container is disposed.
    pub fn register_disposable_instance<T: Dispose + Any>(
        &self,
        id: impl Into<ServiceId>,
        value: T,
    ) -> Result<()> {
        self.registry.insert_built(id.into(), Built::disposable(value))
    }

    /// Runs a [`Provider`] module against this container.
    pub fn add_provider(&self, provider: &dyn Provider) -> Result<()> {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(self)
    }

    // ── Queries ──

    pub fn is_registered(&self, id: impl Into<ServiceId>) -> bool {
        self.registry.contains(&id.into())
    }

    /// Removes a registration. Returns whether it existed.
    ///
    /// A cached instance is dropped without teardown.
    pub fn unregister(&self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        let existed = self.registry.remove(&id);
        debug!(id = %id, existed, "Unregistered service");
        existed
    }

    /// Removes every registration without running teardown hooks.
    pub fn clear(&self) {
        debug!(registered = self.registry.len(), "Clearing container");
        self.registry.clear();
    }

    /// Snapshot of registered identifiers. The order is unspecified.
    pub fn registered_services(&self) -> Vec<ServiceId> {
        self.registry.ids()
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns true if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    // ── Resolution ──

    /// Resolve a service by identifier.
    ///
    /// ```rust,ignore
    /// let loader = container.resolve("questionLoader")?;
    /// ```
    ///
    /// # Errors
    /// - [`SunduqError::NotRegistered`]: nothing registered under `id`
    /// - [`SunduqError::CircularDependency`]: `id` is already being built
    ///   further up the current call tree
    /// - anything the factory (or its own dependencies) returned, unchanged
    pub fn resolve(&self, id: impl Into<ServiceId>) -> Result<Instance> {
        self.resolve_id(&id.into())
    }

    /// Resolve a service and downcast it to `T`.
    ///
    /// ```rust,ignore
    /// let loader: Arc<QuestionLoader> = container.resolve_as("questionLoader")?;
    /// ```
    pub fn resolve_as<T: Any + Send + Sync>(&self, id: impl Into<ServiceId>) -> Result<Arc<T>> {
        let id = id.into();
        let instance = self.resolve_id(&id)?;

        instance
            .downcast::<T>()
            .map_err(|_| SunduqError::TypeMismatch {
                id,
                expected: type_name::<T>(),
            })
    }

    #[instrument(level = "trace", skip_all, fields(id = %id))]
    fn resolve_id(&self, id: &ServiceId) -> Result<Instance> {
        let (factory, lifetime, generation) = match self.registry.lookup(id) {
            Some(Lookup::Cached(instance)) => {
                trace!("Singleton cache hit");
                return Ok(instance);
            }
            Some(Lookup::Build {
                factory,
                lifetime,
                generation,
            }) => (factory, lifetime, generation),
            None => return Err(self.not_registered(id)),
        };

        let _guard = StackGuard::enter(&self.stack, id)?;

        trace!(lifetime = %lifetime, "Constructing");
        let built = factory.build(self)?;
        let instance = built.instance.clone();

        if lifetime.is_cached() && !self.registry.store(id, generation, built) {
            debug!(id = %id, "Registration changed during construction, instance not cached");
        }

        Ok(instance)
    }

    fn not_registered(&self, id: &ServiceId) -> SunduqError {
        let required_by = self.stack.lock().current().cloned();

        let candidates = self.registry.ids();
        let labels: Vec<String> = candidates.iter().map(ServiceId::label).collect();
        let suggestions = suggest_similar(&id.label(), &labels, self.settings.max_suggestions)
            .into_iter()
            .map(|index| candidates[index].clone())
            .collect();

        SunduqError::NotRegistered(NotRegisteredError {
            requested: id.clone(),
            required_by,
            suggestions,
        })
    }

    // ── Composition ──

    /// Creates a child container holding a value copy of every registration.
    ///
    /// Singletons that are already built are inherited as built. After this
    /// call parent and child are independent: registrations, overrides and
    /// newly built singletons in one never show up in the other.
    ///
    /// Inherited singletons stay owned by the parent: disposing the child
    /// never runs their teardown.
    pub fn create_child(&self) -> Container {
        debug!(inherited = self.registry.len(), "Creating child container");
        Container {
            registry: self.registry.fork(),
            stack: Mutex::new(ResolutionStack::default()),
            settings: self.settings.clone(),
        }
    }

    // ── Teardown ──

    /// Runs the teardown hook of every instance this container built, then
    /// empties the registry (or, with [`DisposeMode::KeepRegistrations`],
    /// drops its own cached instances only).
    ///
    /// Hooks run newest instance first. A failing or panicking hook is
    /// logged and recorded in the report; it never stops the others.
    #[instrument(skip(self), name = "container_dispose")]
    pub fn dispose(&self) -> DisposalReport {
        let mut report = DisposalReport::default();

        for (id, hook) in self.registry.teardown_targets() {
            match run_teardown(&id, hook.as_ref()) {
                Ok(()) => {
                    trace!(id = %id, "Disposed");
                    report.disposed.push(id);
                }
                Err(failure) => {
                    warn!(id = %id, error = %failure.cause, "Teardown failed");
                    report.failures.push(failure);
                }
            }
        }

        match self.settings.dispose_mode {
            DisposeMode::Clear => self.registry.clear(),
            DisposeMode::KeepRegistrations => self.registry.forget_instances(),
        }

        info!(
            disposed = report.disposed.len(),
            failed = report.failures.len(),
            mode = %self.settings.dispose_mode,
            "Container disposed"
        );
        report
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .field("resolving", &self.stack.lock().depth())
            .field("settings", &self.settings)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::Container;
    pub use crate::dispose::{Dispose, DisposalReport};
    pub use crate::error::{BoxError, Result, SunduqError};
    pub use crate::key::ServiceId;
    pub use crate::lifetime::Lifetime;
    pub use crate::provider::Provider;
    pub use crate::registry::{Factory, Instance};
    pub use crate::settings::{ContainerSettings, DisposeMode};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
