//! Service identifiers.
//!
//! [`ServiceId`] names a service within a container. It unifies the three
//! kinds of keys an application tends to use (plain names, unique symbols
//! and type tokens) behind one hashable, comparable type.

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use sunduq_support::rendering::shorten_type_name;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Uniquely identifies a service in a container.
///
/// The identifier carries no semantics besides equality and hashing.
///
/// # Examples
/// ```
/// use sunduq_container::key::ServiceId;
///
/// // Name key, also available through `From<&'static str>`
/// let loader = ServiceId::named("questionLoader");
/// assert_eq!(loader, ServiceId::from("questionLoader"));
///
/// // Symbols are unique even when the descriptions match
/// assert_ne!(ServiceId::symbol("Storage"), ServiceId::symbol("Storage"));
///
/// // Type tokens
/// assert_eq!(ServiceId::of::<String>(), ServiceId::of::<String>());
/// ```
#[derive(Clone)]
pub struct ServiceId {
    kind: IdKind,
}

#[derive(Clone)]
enum IdKind {
    Name(Cow<'static, str>),
    Symbol {
        serial: u64,
        description: Cow<'static, str>,
    },
    Type {
        type_id: TypeId,
        type_name: &'static str,
    },
}

impl ServiceId {
    /// Creates a name key.
    #[inline]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: IdKind::Name(name.into()),
        }
    }

    /// Creates a fresh symbol key.
    ///
    /// Every call returns an identifier distinct from all others; the
    /// description is only used for display.
    pub fn symbol(description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: IdKind::Symbol {
                serial: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
                description: description.into(),
            },
        }
    }

    /// Creates a type-token key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            kind: IdKind::Type {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
            },
        }
    }

    /// Returns the name for name keys.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            IdKind::Name(name) => Some(name.as_ref()),
            _ => None,
        }
    }

    /// Returns the [`TypeId`] for type-token keys.
    pub fn type_id(&self) -> Option<TypeId> {
        match self.kind {
            IdKind::Type { type_id, .. } => Some(type_id),
            _ => None,
        }
    }

    /// Returns `true` for keys created by [`ServiceId::symbol`].
    pub fn is_symbol(&self) -> bool {
        matches!(self.kind, IdKind::Symbol { .. })
    }

    /// Human-readable label used in logs and error messages.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for ServiceId {
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (IdKind::Name(a), IdKind::Name(b)) => a == b,
            (IdKind::Symbol { serial: a, .. }, IdKind::Symbol { serial: b, .. }) => a == b,
            (IdKind::Type { type_id: a, .. }, IdKind::Type { type_id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for ServiceId {}

// Hash only what equality looks at.
impl Hash for ServiceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.kind {
            IdKind::Name(name) => {
                state.write_u8(0);
                name.hash(state);
            }
            IdKind::Symbol { serial, .. } => {
                state.write_u8(1);
                serial.hash(state);
            }
            IdKind::Type { type_id, .. } => {
                state.write_u8(2);
                type_id.hash(state);
            }
        }
    }
}

impl From<&'static str> for ServiceId {
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(id: &ServiceId) -> Self {
        id.clone()
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IdKind::Name(name) => write!(f, "ServiceId({name:?})"),
            IdKind::Symbol {
                serial,
                description,
            } => write!(f, "ServiceId(Symbol({description}), serial={serial})"),
            IdKind::Type { type_name, .. } => write!(f, "ServiceId(type={type_name})"),
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IdKind::Name(name) => f.write_str(name),
            IdKind::Symbol { description, .. } => write!(f, "Symbol({description})"),
            IdKind::Type { type_name, .. } => f.write_str(&shorten_type_name(type_name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct QuestionLoader;

    #[test]
    fn name_keys_compare_by_value() {
        assert_eq!(ServiceId::named("loader"), ServiceId::named(String::from("loader")));
        assert_ne!(ServiceId::named("loader"), ServiceId::named("validator"));
    }

    #[test]
    fn symbols_are_unique() {
        let a = ServiceId::symbol("Storage");
        let b = ServiceId::symbol("Storage");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.is_symbol());
    }

    #[test]
    fn type_keys() {
        let key = ServiceId::of::<QuestionLoader>();
        assert_eq!(key, ServiceId::of::<QuestionLoader>());
        assert_ne!(key, ServiceId::of::<String>());
        assert_eq!(key.type_id(), Some(TypeId::of::<QuestionLoader>()));
        assert_eq!(key.to_string(), "QuestionLoader");
    }

    #[test]
    fn kinds_never_collide() {
        assert_ne!(ServiceId::named("String"), ServiceId::of::<String>());
        assert_ne!(ServiceId::named("Symbol(x)"), ServiceId::symbol("x"));
    }

    #[test]
    fn display_labels() {
        assert_eq!(ServiceId::named("progressTracker").label(), "progressTracker");
        assert_eq!(ServiceId::symbol("Storage").label(), "Symbol(Storage)");
    }

    #[test]
    fn key_in_hashmap() {
        use std::collections::HashMap;
        let symbol = ServiceId::symbol("clock");
        let mut map = HashMap::new();
        map.insert(ServiceId::named("loader"), 1);
        map.insert(symbol.clone(), 2);
        map.insert(ServiceId::of::<QuestionLoader>(), 3);
        assert_eq!(map.get(&ServiceId::from("loader")), Some(&1));
        assert_eq!(map.get(&symbol), Some(&2));
        assert_eq!(map.get(&ServiceId::of::<QuestionLoader>()), Some(&3));
        assert_eq!(map.get(&ServiceId::symbol("clock")), None);
    }

    #[test]
    fn unsized_type_key() {
        trait Storage {}
        let key = ServiceId::of::<dyn Storage>();
        assert!(key.label().contains("Storage"));
    }
}
