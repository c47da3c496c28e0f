//! The lazybind resolution engine.
//!
//! This module implements the core algorithm that reconciles out-of-order
//! registration and requests. Four responsibilities share one mutable store:
//!
//! - [`store`] - the id-to-entry mapping everything else operates on
//! - [`descriptor`] - dependency tokens and their parsed form
//! - [`readiness`] - which ids transitively block a dependency list
//! - [`pending`] - requests parked under the ids blocking them
//! - [`builder`] - depth-first construction and memoization
//!
//! # Resolution Process
//!
//! A [`Provider::require`] call first asks the readiness checker which of its
//! ids are unresolved. If none, it proceeds straight to building and the
//! success continuation fires before `require` returns. Otherwise the request
//! is parked under **every** unresolved root-cause id.
//!
//! A [`Provider::define`] call registers the entry, then removes that id's
//! pending bucket, if any. If the new entry's own dependency chain is still
//! incomplete, the whole bucket is refiled under those transitively
//! unresolved ids. Otherwise each parked request is re-checked individually:
//! requests still blocked on other ids stay filed under them, and fully
//! satisfied requests are built and delivered.
//!
//! A pending request therefore moves
//! `Unfiled -> Filed(ids) -> { Filed(other ids) | Delivered | Failed }`,
//! and is delivered or failed exactly once.
//!
//! # Concurrency
//!
//! Resolution is synchronous and single-threaded: `require` and `define` run
//! to completion before returning, with no suspension point inside the
//! algorithm. Both take `&mut self`, so one provider's bookkeeping can never
//! be interleaved; callers who share a provider across threads wrap it in a
//! `Mutex` and get serialization for free.

pub mod descriptor;
pub mod store;

mod builder;
mod pending;
mod readiness;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::core::{LazybindError, Result};
use pending::{FatalFn, PendingRequest, PendingSet, SuccessFn};

pub use descriptor::{DepToken, Descriptor, NO_DEPS, OPTIONAL_MARKER};
pub use store::{FactoryFn, Model, ModelValue, Registrable, Store};

use descriptor::parse_tokens;
use store::Entry;

/// Provider-level defaults.
#[derive(Debug, Clone, Copy)]
pub struct ProviderOptions {
    /// Default per-entry cache policy: memoize factory results after the
    /// first successful build.
    pub cache: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self { cache: true }
    }
}

/// Per-definition overrides, merged over the provider-level defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryOptions {
    /// Override the provider's cache policy for this entry.
    pub cache: Option<bool>,
}

/// The lazy, order-independent dependency-injection resolver.
///
/// Models are registered with [`define`](Provider::define) and requested with
/// [`require`](Provider::require), in any order. See the
/// [module documentation](self) for the resolution process.
///
/// # Examples
///
/// ```rust
/// use lazybind::{NO_DEPS, Provider, Registrable};
///
/// let mut provider = Provider::new();
/// provider.define("answer", NO_DEPS, Registrable::value(42_u32))?;
/// provider.require(["answer", "question?"], |models| {
///     assert_eq!(models[0].as_ref().unwrap().downcast_ref::<u32>(), Some(&42));
///     assert!(models[1].is_none()); // optional and never defined
/// })?;
/// # Ok::<(), lazybind::LazybindError>(())
/// ```
pub struct Provider {
    store: Store,
    pendings: PendingSet,
    options: ProviderOptions,
}

impl Provider {
    /// Create a provider with an internal store and default options.
    pub fn new() -> Self {
        Self::with_options(ProviderOptions::default())
    }

    /// Create a provider with an internal store and the given options.
    pub fn with_options(options: ProviderOptions) -> Self {
        Self {
            store: Store::new(),
            pendings: PendingSet::default(),
            options,
        }
    }

    /// Create a provider around an externally supplied store.
    ///
    /// The store must be empty: the provider owns it exclusively from here
    /// on, and entries it did not register itself would bypass the pending
    /// bookkeeping.
    ///
    /// # Errors
    ///
    /// [`LazybindError::InvalidArgument`] if the store already has entries.
    pub fn with_store(store: Store, options: ProviderOptions) -> Result<Self> {
        if !store.is_empty() {
            return Err(LazybindError::invalid_argument(
                "externally supplied store must be empty",
            ));
        }
        Ok(Self {
            store,
            pendings: PendingSet::default(),
            options,
        })
    }

    /// Whether `id` has been defined.
    pub fn is_defined(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    /// Ids that at least one parked request is currently blocked on, sorted.
    ///
    /// Useful for diagnosing a permanently undefined dependency, which leaves
    /// its dependents parked forever.
    pub fn pending_ids(&self) -> Vec<String> {
        self.pendings.blocked_ids()
    }

    /// Define the model `id` with the provider's default options.
    ///
    /// See [`define_with`](Provider::define_with).
    pub fn define<I, D, T>(&mut self, id: I, deps: D, registrable: Registrable) -> Result<()>
    where
        I: Into<String>,
        D: IntoIterator<Item = T>,
        T: Into<DepToken>,
    {
        self.define_with(id, deps, registrable, EntryOptions::default())
    }

    /// Define the model `id`: its dependency tokens, its registrable, and
    /// entry-level option overrides.
    ///
    /// If requests are parked on `id`, defining it re-evaluates them: fully
    /// satisfied requests are built and delivered before this call returns,
    /// and still-blocked requests are refiled under whatever ids now block
    /// them (including ids introduced transitively by this entry's own
    /// dependency chain).
    ///
    /// # Errors
    ///
    /// - [`LazybindError::DuplicateRegistration`] if `id` is already defined
    /// - [`LazybindError::InvalidArgument`] for an empty id or malformed token
    /// - [`LazybindError::CircularDependency`] if this definition closes a
    ///   cycle that a flushed request walks into
    /// - Build errors from delivered requests that supplied no `fatal`
    ///   handler propagate out of this call
    pub fn define_with<I, D, T>(
        &mut self,
        id: I,
        deps: D,
        registrable: Registrable,
        options: EntryOptions,
    ) -> Result<()>
    where
        I: Into<String>,
        D: IntoIterator<Item = T>,
        T: Into<DepToken>,
    {
        let id = id.into();
        if id.is_empty() {
            return Err(LazybindError::invalid_argument("model id must not be empty"));
        }
        if self.store.contains(&id) {
            return Err(LazybindError::DuplicateRegistration { id });
        }
        let deps = parse_tokens(deps)?;
        let cache = options.cache.unwrap_or(self.options.cache);
        tracing::debug!(id = %id, deps = deps.len(), cache, "defining model");
        self.store.insert(
            id.clone(),
            Entry {
                deps: deps.clone(),
                registrable,
                built: None,
                cache,
            },
        );

        let Some(bucket) = self.pendings.take_bucket(&id) else {
            return Ok(());
        };
        tracing::debug!(id = %id, parked = bucket.len(), "flushing pending requests");

        // The new entry may itself be blocked; if so, everything parked on it
        // is blocked on the same transitive root causes.
        let blocked = readiness::unresolved(&self.store, &deps)?;
        if !blocked.is_empty() {
            tracing::debug!(id = %id, refiled_under = ?blocked, "definition still blocked");
            self.pendings.refile(&bucket, &blocked);
            return Ok(());
        }

        for key in bucket {
            let request_deps = match self.pendings.deps_of(key) {
                Some(deps) => deps.to_vec(),
                // Already delivered through another bucket.
                None => continue,
            };
            // Defining this id may still leave the request blocked on other
            // ids; it stays filed under those buckets.
            let still_blocked = readiness::unresolved(&self.store, &request_deps)?;
            if !still_blocked.is_empty() {
                continue;
            }
            if let Some(request) = self.pendings.take_request(key) {
                self.deliver(request)?;
            }
        }
        Ok(())
    }

    /// Request models by id; `success` receives them positionally.
    ///
    /// If every required id (transitively) is already defined, the models are
    /// built and `success` fires before this call returns. Otherwise the
    /// request is parked until later `define` calls satisfy it.
    ///
    /// # Errors
    ///
    /// - [`LazybindError::InvalidArgument`] for a malformed token
    /// - [`LazybindError::CircularDependency`] if the dependency walk closes
    ///   a cycle
    /// - Build errors ([`LazybindError::FactoryError`] and friends) propagate
    ///   out of this call; use [`require_or_else`](Provider::require_or_else)
    ///   to receive them in a callback instead
    pub fn require<D, T, S>(&mut self, deps: D, success: S) -> Result<()>
    where
        D: IntoIterator<Item = T>,
        T: Into<DepToken>,
        S: FnOnce(Vec<ModelValue>) + Send + 'static,
    {
        let deps = parse_tokens(deps)?;
        self.require_inner(deps, Box::new(success), None)
    }

    /// Like [`require`](Provider::require), but build errors are routed to
    /// `fatal` instead of propagating. When `fatal` fires, `success` is
    /// guaranteed not to have been invoked.
    pub fn require_or_else<D, T, S, F>(&mut self, deps: D, success: S, fatal: F) -> Result<()>
    where
        D: IntoIterator<Item = T>,
        T: Into<DepToken>,
        S: FnOnce(Vec<ModelValue>) + Send + 'static,
        F: FnOnce(LazybindError) + Send + 'static,
    {
        let deps = parse_tokens(deps)?;
        self.require_inner(deps, Box::new(success), Some(Box::new(fatal)))
    }

    fn require_inner(
        &mut self,
        deps: Vec<Descriptor>,
        success: SuccessFn,
        fatal: Option<FatalFn>,
    ) -> Result<()> {
        let blocked = readiness::unresolved(&self.store, &deps)?;
        let request = PendingRequest {
            deps,
            success,
            fatal,
        };
        if blocked.is_empty() {
            return self.deliver(request);
        }
        let key = self.pendings.file(request, &blocked);
        tracing::debug!(key, blocked = ?blocked, "parking request");
        Ok(())
    }

    /// Build a satisfied request's models and fire its continuation.
    fn deliver(&mut self, request: PendingRequest) -> Result<()> {
        match builder::build(&mut self.store, &request.deps) {
            Ok(models) => {
                (request.success)(models);
                Ok(())
            }
            Err(error) => match request.fatal {
                Some(fatal) => {
                    tracing::debug!(error = %error, "routing build failure to fatal handler");
                    fatal(error);
                    Ok(())
                }
                None => Err(error),
            },
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("defined", &self.store.len())
            .field("pending", &self.pendings.len())
            .field("options", &self.options)
            .finish()
    }
}
