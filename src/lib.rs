//! lazybind - lazy, order-independent dependency injection
//!
//! A resolver for named "models": callers register models (constants or
//! factory functions with their own named dependencies) and request sets of
//! models by id. The resolver builds and delivers them once all required
//! dependencies exist, regardless of whether registration or the request
//! happened first.
//!
//! # Architecture Overview
//!
//! The crate is one cohesive resolution engine decomposed by responsibility:
//! - A **dependency store** maps each id to its registered entry (deps,
//!   registrable, cache policy, memoized result)
//! - A **descriptor parser** turns raw tokens (`"db"`, `"metrics?"`) into
//!   `{id, required}` descriptors
//! - A **readiness checker** walks a dependency list and reports the
//!   root-cause ids that transitively block it, detecting cycles on the way
//! - A **pending registry** parks blocked requests under every id blocking
//!   them; each `define` flushes or refiles the affected requests
//! - A **model builder** constructs positional argument lists depth-first and
//!   invokes factories exactly when needed, memoizing results
//!
//! ## Key Properties
//!
//! - **Order independence**: `require` before or after the matching `define`
//!   calls delivers the same values
//! - **Exactly-once delivery**: a request's success (or fatal) continuation
//!   fires exactly once, however many registrations it takes to unblock it
//! - **Optional dependencies**: a trailing `?` on a token means "deliver the
//!   undefined model instead of blocking if absent"
//! - **Memoization**: factory results are cached per entry unless the entry
//!   (or provider) opts out
//!
//! # Core Modules
//!
//! - [`core`] - error types shared across the crate
//! - [`resolver`] - the [`Provider`] and its store, readiness checker,
//!   builder, and pending-request registry
//! - [`bootstrap`] - thin adapter that wires an external module loader to a
//!   provider
//!
//! # Example
//!
//! ```rust
//! use lazybind::{Model, NO_DEPS, Provider, Registrable};
//!
//! let mut provider = Provider::new();
//!
//! // The request can arrive before any definition.
//! provider.require(["greeting"], |models| {
//!     let greeting = models[0].as_ref().unwrap();
//!     assert_eq!(greeting.downcast_ref::<String>().unwrap(), "hello world");
//! })?;
//!
//! provider.define("audience", NO_DEPS, Registrable::value("world".to_string()))?;
//! provider.define(
//!     "greeting",
//!     ["audience"],
//!     Registrable::factory(|deps| {
//!         let audience = deps[0].as_ref().unwrap();
//!         let audience = audience.downcast_ref::<String>().unwrap();
//!         Ok(Some(Model::new(format!("hello {audience}"))))
//!     }),
//! )?;
//! # Ok::<(), lazybind::LazybindError>(())
//! ```

pub mod bootstrap;
pub mod core;
pub mod resolver;

pub use crate::core::{LazybindError, Result};
pub use crate::resolver::{
    DepToken, Descriptor, EntryOptions, Model, ModelValue, NO_DEPS, Provider, ProviderOptions,
    Registrable, Store,
};
