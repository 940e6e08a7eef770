//! Service registry: stores all registrations of one container.
//!
//! The registry maps [`ServiceId`] to a [`Factory`], a [`Lifetime`] and,
//! for singletons, the instance once it has been built.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::container::Container;
use crate::dispose::Dispose;
use crate::error::{DuplicateRegistrationError, Result, SunduqError};
use crate::key::ServiceId;
use crate::lifetime::Lifetime;

/// A resolved, type-erased service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type alias for the erased factory closure.
///
/// Registrations copied into child containers share the same closure.
pub(crate) type FactoryFn = Arc<dyn Fn(&Container) -> Result<Built> + Send + Sync>;

// Stamps for registrations and cached instances. Shared by every container
// so values copied into children stay comparable.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// What a factory produced: the instance plus its teardown hook, if any.
#[derive(Clone)]
pub(crate) struct Built {
    pub instance: Instance,
    pub teardown: Option<Arc<dyn Dispose>>,
}

impl Built {
    pub(crate) fn plain<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            instance: Arc::new(value),
            teardown: None,
        }
    }

    pub(crate) fn disposable<T: Dispose + Any>(value: T) -> Self {
        let value = Arc::new(value);
        Self {
            instance: value.clone(),
            teardown: Some(value),
        }
    }
}

/// Knows how to build one service.
///
/// The closure receives the resolving [`Container`] so it can resolve its
/// own dependencies.
///
/// # Examples
/// ```
/// use sunduq_container::prelude::*;
///
/// struct Questions(Vec<&'static str>);
///
/// let factory = Factory::new(|_| Ok(Questions(vec!["What is ownership?"])));
/// let container = Container::new();
/// container.register("questions", factory, Lifetime::Singleton).unwrap();
/// ```
#[derive(Clone)]
pub struct Factory {
    build: FactoryFn,
}

impl Factory {
    /// Factory for a service without teardown.
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(move |container: &Container| -> Result<Built> {
                Ok(Built::plain(factory(container)?))
            }),
        }
    }

    /// Factory for a service whose [`Dispose`] hook the container runs when
    /// it is disposed.
    pub fn disposable<T, F>(factory: F) -> Self
    where
        T: Dispose + Any,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(move |container: &Container| -> Result<Built> {
                Ok(Built::disposable(factory(container)?))
            }),
        }
    }

    /// Factory that always hands out an already-built instance.
    fn prebuilt(built: Built) -> Self {
        Self {
            build: Arc::new(move |_: &Container| -> Result<Built> { Ok(built.clone()) }),
        }
    }

    pub(crate) fn build(&self, container: &Container) -> Result<Built> {
        (self.build)(container)
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory").finish_non_exhaustive()
    }
}

/// A built singleton together with the order it was cached in.
///
/// `owned` is false for instances inherited from a parent container. Only
/// the container that built an instance runs its teardown.
#[derive(Clone)]
pub(crate) struct Cached {
    pub built: Built,
    pub sequence: u64,
    pub owned: bool,
}

impl Cached {
    fn new(built: Built) -> Self {
        Self {
            built,
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            owned: true,
        }
    }

    fn inherited(&self) -> Self {
        Self {
            owned: false,
            ..self.clone()
        }
    }
}

/// Registration entry for a single service.
#[derive(Clone)]
pub(crate) struct Registration {
    pub factory: Factory,
    pub lifetime: Lifetime,
    pub cached: OnceCell<Cached>,
    pub generation: u64,
    /// Registered from a ready value; the factory cannot build a new one.
    pub prebuilt: bool,
}

impl Registration {
    fn new(factory: Factory, lifetime: Lifetime) -> Self {
        Self {
            factory,
            lifetime,
            cached: OnceCell::new(),
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            prebuilt: false,
        }
    }

    fn prebuilt(built: Built) -> Self {
        let mut registration = Self::new(Factory::prebuilt(built.clone()), Lifetime::Singleton);
        registration.prebuilt = true;
        // fresh cell, cannot already be set
        let _ = registration.cached.set(Cached::new(built));
        registration
    }

    /// Copy for a child container: same factory and generation, any built
    /// instance carried over as inherited.
    fn inherited(&self) -> Self {
        let cached = OnceCell::new();
        if let Some(existing) = self.cached.get() {
            let _ = cached.set(existing.inherited());
        }
        Self {
            factory: self.factory.clone(),
            lifetime: self.lifetime,
            cached,
            generation: self.generation,
            prebuilt: self.prebuilt,
        }
    }

    fn owns_instance(&self) -> bool {
        self.cached.get().is_some_and(|cached| cached.owned)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("lifetime", &self.lifetime)
            .field("built", &self.cached.get().is_some())
            .field("owned", &self.owns_instance())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Result of looking up a registration.
pub(crate) enum Lookup {
    /// Singleton already built.
    Cached(Instance),
    /// Needs construction through the factory.
    Build {
        factory: Factory,
        lifetime: Lifetime,
        generation: u64,
    },
}

/// Stores all service registrations of one container.
#[derive(Default)]
pub(crate) struct Registry {
    registrations: DashMap<ServiceId, Registration>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Independent value copy for a child container.
    ///
    /// Built singletons are carried over as built but stay owned by this
    /// registry, so the copy never tears them down.
    pub fn fork(&self) -> Self {
        let registrations = DashMap::with_capacity(self.registrations.len());
        for entry in self.registrations.iter() {
            registrations.insert(entry.key().clone(), entry.value().inherited());
        }
        Self { registrations }
    }

    /// Registers a factory under `id`.
    ///
    /// # Errors
    /// Returns [`SunduqError::DuplicateRegistration`] if the id is
    /// already registered and `allow_override` is false.
    pub fn insert(
        &self,
        id: ServiceId,
        factory: Factory,
        lifetime: Lifetime,
        allow_override: bool,
    ) -> Result<()> {
        self.insert_registration(id, Registration::new(factory, lifetime), allow_override)
    }

    /// Registers an already-built singleton under `id`.
    pub fn insert_built(&self, id: ServiceId, built: Built) -> Result<()> {
        self.insert_registration(id, Registration::prebuilt(built), false)
    }

    fn insert_registration(
        &self,
        id: ServiceId,
        registration: Registration,
        allow_override: bool,
    ) -> Result<()> {
        let lifetime = registration.lifetime;
        match self.registrations.entry(id) {
            Entry::Occupied(mut entry) => {
                if !allow_override {
                    return Err(SunduqError::DuplicateRegistration(
                        DuplicateRegistrationError {
                            id: entry.key().clone(),
                        },
                    ));
                }
                debug!(id = %entry.key(), lifetime = %lifetime, "Overrode registration");
                entry.insert(registration);
            }
            Entry::Vacant(entry) => {
                debug!(id = %entry.key(), lifetime = %lifetime, "Registered service");
                entry.insert(registration);
            }
        }
        Ok(())
    }

    /// Looks up what resolving `id` requires.
    ///
    /// Nothing stays locked after this returns, so the caller may run the
    /// factory, which can re-enter the registry.
    pub fn lookup(&self, id: &ServiceId) -> Option<Lookup> {
        let registration = self.registrations.get(id)?;

        if let Some(cached) = registration.cached.get() {
            return Some(Lookup::Cached(cached.built.instance.clone()));
        }

        Some(Lookup::Build {
            factory: registration.factory.clone(),
            lifetime: registration.lifetime,
            generation: registration.generation,
        })
    }

    /// Caches a freshly built singleton.
    ///
    /// Returns `false` when the registration was removed or replaced while
    /// its factory ran, in which case nothing is stored.
    pub fn store(&self, id: &ServiceId, generation: u64, built: Built) -> bool {
        match self.registrations.get(id) {
            Some(registration) if registration.generation == generation => {
                registration.cached.set(Cached::new(built)).is_ok()
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.registrations.contains_key(id)
    }

    pub fn remove(&self, id: &ServiceId) -> bool {
        self.registrations.remove(id).is_some()
    }

    pub fn clear(&self) {
        self.registrations.clear();
    }

    /// Snapshot of all registered identifiers, in no particular order.
    pub fn ids(&self) -> Vec<ServiceId> {
        self.registrations
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Owned built instances that carry a teardown hook, most recently built
    /// first.
    pub fn teardown_targets(&self) -> Vec<(ServiceId, Arc<dyn Dispose>)> {
        let mut targets: Vec<(u64, ServiceId, Arc<dyn Dispose>)> = self
            .registrations
            .iter()
            .filter_map(|entry| {
                let cached = entry.value().cached.get().filter(|cached| cached.owned)?;
                let hook = cached.built.teardown.clone()?;
                Some((cached.sequence, entry.key().clone(), hook))
            })
            .collect();

        targets.sort_by(|a, b| b.0.cmp(&a.0));
        targets.into_iter().map(|(_, id, hook)| (id, hook)).collect()
    }

    /// Drops every owned cached instance, keeping the registrations that
    /// can build a new one.
    ///
    /// Registrations of ready values are removed, as their only instance is
    /// gone. Inherited instances are left in place.
    pub fn forget_instances(&self) {
        self.registrations.retain(|id, registration| {
            if registration.prebuilt && registration.owns_instance() {
                debug!(id = %id, "Dropped registration of a disposed instance");
                return false;
            }
            if registration.owns_instance() {
                registration.cached.take();
            }
            true
        });
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("registered", &self.registrations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;

    fn dummy_factory() -> Factory {
        Factory::new(|_| Ok(42i32))
    }

    struct Store;

    impl Dispose for Store {
        fn dispose(&self) -> std::result::Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn register_and_lookup() {
        let reg = Registry::new();
        let id = ServiceId::named("questions");
        reg.insert(id.clone(), dummy_factory(), Lifetime::Singleton, false).unwrap();
        assert!(reg.contains(&id));
        assert!(matches!(reg.lookup(&id), Some(Lookup::Build { .. })));
        assert!(reg.lookup(&ServiceId::named("missing")).is_none());
    }

    #[test]
    fn duplicate_fails() {
        let reg = Registry::new();
        let id = ServiceId::named("questions");
        reg.insert(id.clone(), dummy_factory(), Lifetime::Singleton, false).unwrap();
        let err = reg.insert(id, dummy_factory(), Lifetime::Transient, false).unwrap_err();
        assert!(matches!(err, SunduqError::DuplicateRegistration(_)));
    }

    #[test]
    fn duplicate_with_override_ok() {
        let reg = Registry::new();
        let id = ServiceId::named("questions");
        reg.insert(id.clone(), dummy_factory(), Lifetime::Singleton, false).unwrap();
        assert!(reg.insert(id.clone(), dummy_factory(), Lifetime::Transient, true).is_ok());
        assert_eq!(reg.len(), 1);
        match reg.lookup(&id) {
            Some(Lookup::Build { lifetime, .. }) => assert_eq!(lifetime, Lifetime::Transient),
            _ => panic!("expected a registration to build"),
        }
    }

    #[test]
    fn prebuilt_is_cached() {
        let reg = Registry::new();
        let id = ServiceId::named("config");
        reg.insert_built(id.clone(), Built::plain(7u8)).unwrap();
        match reg.lookup(&id) {
            Some(Lookup::Cached(instance)) => assert_eq!(instance.downcast_ref::<u8>(), Some(&7)),
            _ => panic!("expected a cached instance"),
        }
    }

    #[test]
    fn store_ignores_replaced_registration() {
        let reg = Registry::new();
        let id = ServiceId::named("questions");
        reg.insert(id.clone(), dummy_factory(), Lifetime::Singleton, false).unwrap();
        let Some(Lookup::Build { generation, .. }) = reg.lookup(&id) else {
            panic!("expected a registration to build");
        };

        reg.insert(id.clone(), dummy_factory(), Lifetime::Singleton, true).unwrap();
        assert!(!reg.store(&id, generation, Built::plain(1i32)));
        assert!(matches!(reg.lookup(&id), Some(Lookup::Build { .. })));
    }

    #[test]
    fn store_sets_once() {
        let reg = Registry::new();
        let id = ServiceId::named("questions");
        reg.insert(id.clone(), dummy_factory(), Lifetime::Singleton, false).unwrap();
        let Some(Lookup::Build { generation, .. }) = reg.lookup(&id) else {
            panic!("expected a registration to build");
        };

        assert!(reg.store(&id, generation, Built::plain(1i32)));
        assert!(!reg.store(&id, generation, Built::plain(2i32)));
        match reg.lookup(&id) {
            Some(Lookup::Cached(instance)) => assert_eq!(instance.downcast_ref::<i32>(), Some(&1)),
            _ => panic!("expected a cached instance"),
        }
    }

    #[test]
    fn fork_is_independent() {
        let parent = Registry::new();
        parent.insert_built(ServiceId::named("a"), Built::plain(1i32)).unwrap();

        let child = parent.fork();
        child.insert(ServiceId::named("b"), dummy_factory(), Lifetime::Transient, false).unwrap();
        parent.remove(&ServiceId::named("a"));

        assert!(child.contains(&ServiceId::named("a")));
        assert!(!parent.contains(&ServiceId::named("b")));
    }

    #[test]
    fn teardown_targets_newest_first() {
        let reg = Registry::new();
        reg.insert_built(ServiceId::named("first"), Built::disposable(Store)).unwrap();
        reg.insert_built(ServiceId::named("plain"), Built::plain(0u8)).unwrap();
        reg.insert_built(ServiceId::named("second"), Built::disposable(Store)).unwrap();

        let ids: Vec<ServiceId> = reg.teardown_targets().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![ServiceId::named("second"), ServiceId::named("first")]);
    }

    #[test]
    fn forget_instances_keeps_buildable_registrations() {
        let reg = Registry::new();
        let id = ServiceId::named("store");
        reg.insert(id.clone(), Factory::disposable(|_| Ok(Store)), Lifetime::Singleton, false)
            .unwrap();
        let Some(Lookup::Build { generation, .. }) = reg.lookup(&id) else {
            panic!("expected a registration to build");
        };
        assert!(reg.store(&id, generation, Built::disposable(Store)));

        reg.forget_instances();
        assert!(reg.contains(&id));
        assert!(reg.teardown_targets().is_empty());
        assert!(matches!(reg.lookup(&id), Some(Lookup::Build { .. })));
    }

    #[test]
    fn forget_instances_drops_ready_values() {
        let reg = Registry::new();
        let id = ServiceId::named("connection");
        reg.insert_built(id.clone(), Built::disposable(Store)).unwrap();

        reg.forget_instances();
        assert!(!reg.contains(&id));
        assert!(reg.lookup(&id).is_none());
    }

    #[test]
    fn fork_inherits_without_ownership() {
        let parent = Registry::new();
        parent.insert_built(ServiceId::named("store"), Built::disposable(Store)).unwrap();

        let child = parent.fork();
        assert!(matches!(child.lookup(&ServiceId::named("store")), Some(Lookup::Cached(_))));
        assert!(child.teardown_targets().is_empty());
        assert_eq!(parent.teardown_targets().len(), 1);

        child.forget_instances();
        assert!(matches!(child.lookup(&ServiceId::named("store")), Some(Lookup::Cached(_))));
    }
}
