//! The dependency store: models, registrables, and their entries.
//!
//! The store is the leaf data structure everything else operates on. Each
//! registered id owns one [`Entry`]: its dependency list, the registrable
//! supplied at define time, the effective cache policy, and the memoized
//! build result. Models are type-erased so heterogeneous values can travel
//! through one positional argument list; callers recover concrete types with
//! [`Model::downcast_ref`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::resolver::descriptor::Descriptor;

/// A delivered model value: a cheaply clonable, type-erased handle.
#[derive(Clone)]
pub struct Model {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Model {
    /// Wrap a concrete value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Recover the concrete type, if `T` is what was stored.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Name of the concrete type stored at construction.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model<{}>", self.type_name)
    }
}

/// A model value as delivered positionally: `None` is the undefined model,
/// delivered for absent optional dependencies and produced by valueless
/// registrations.
pub type ModelValue = Option<Model>;

/// A factory: produces a model from its resolved dependencies, in dependency
/// order. Invoked again on every build when the entry's cache policy is off.
pub type FactoryFn = Box<dyn FnMut(Vec<ModelValue>) -> anyhow::Result<ModelValue> + Send>;

/// What was registered for an id, chosen explicitly at define time.
pub enum Registrable {
    /// A builder invoked with the entry's resolved dependencies.
    Factory(FactoryFn),
    /// A constant model, known at registration.
    Constant(Model),
    /// A valueless registration: the id is defined and participates in
    /// readiness checks, but always builds to the undefined model.
    Undefined,
}

impl Registrable {
    /// Register a factory closure.
    pub fn factory<F>(factory: F) -> Self
    where
        F: FnMut(Vec<ModelValue>) -> anyhow::Result<ModelValue> + Send + 'static,
    {
        Self::Factory(Box::new(factory))
    }

    /// Register an existing [`Model`] as a constant.
    pub fn constant(model: Model) -> Self {
        Self::Constant(model)
    }

    /// Register a concrete value as a constant, wrapping it in a [`Model`].
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::Constant(Model::new(value))
    }
}

impl fmt::Debug for Registrable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory(_) => f.write_str("Factory"),
            Self::Constant(model) => f.debug_tuple("Constant").field(model).finish(),
            Self::Undefined => f.write_str("Undefined"),
        }
    }
}

/// One registered id.
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) deps: Vec<Descriptor>,
    pub(crate) registrable: Registrable,
    /// Memoized build result. Presence flag, not value truthiness: `None`
    /// means never built, `Some(None)` means built to the undefined model.
    pub(crate) built: Option<ModelValue>,
    pub(crate) cache: bool,
}

impl Entry {
    /// Whether the entry's model is already known without building.
    pub(crate) fn has_model(&self) -> bool {
        matches!(self.registrable, Registrable::Constant(_)) || self.built.is_some()
    }

    /// The entry's model if it is already known: a constant registrable or a
    /// memoized build result.
    pub(crate) fn known_model(&self) -> Option<ModelValue> {
        if let Registrable::Constant(model) = &self.registrable {
            return Some(Some(model.clone()));
        }
        self.built.clone()
    }
}

/// The id-to-entry container owned by one provider.
///
/// A store can be constructed externally and handed to
/// [`Provider::with_store`], but it must be empty at that point: the provider
/// owns it exclusively for its lifetime, and external mutation would bypass
/// the readiness bookkeeping.
///
/// [`Provider::with_store`]: crate::Provider::with_store
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<String, Entry>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no id has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `id` has been registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.get_mut(id)
    }

    pub(crate) fn insert(&mut self, id: String, entry: Entry) {
        self.entries.insert(id, entry);
    }
}
