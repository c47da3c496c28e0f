//! Error handling for lazybind.
//!
//! The error system is one strongly-typed enum, [`LazybindError`], so callers
//! can match precisely on the contract that was violated. Errors fall into
//! three groups:
//!
//! - **Caller mistakes**: [`LazybindError::InvalidArgument`],
//!   [`LazybindError::DuplicateRegistration`] - raised synchronously at the
//!   violating call and never recovered internally.
//! - **Graph problems**: [`LazybindError::CircularDependency`] - an id
//!   reappeared in its own ancestry chain while the readiness checker (or
//!   builder) was expanding it.
//! - **Build failures**: [`LazybindError::FactoryError`] wraps whatever a
//!   factory returned, with the original error attached as its source;
//!   [`LazybindError::MissingRequiredDependency`] is an internal-invariant
//!   violation (readiness checking should make it unreachable) surfaced
//!   rather than swallowed.
//!
//! Build failures are the only errors routed through a request's `fatal`
//! handler when one was supplied; everything else propagates out of the
//! violating `define`/`require` call.

use thiserror::Error;

/// The main error type for lazybind operations.
#[derive(Error, Debug)]
pub enum LazybindError {
    /// An argument violated the call contract.
    ///
    /// Covers empty or malformed ids, malformed dependency tokens, and a
    /// non-empty store handed to [`Provider::with_store`].
    ///
    /// [`Provider::with_store`]: crate::Provider::with_store
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the violated contract
        reason: String,
    },

    /// `define` was called twice for the same id.
    ///
    /// Exactly one definition may exist per id; there is no redefinition and
    /// no multiple-implementation selection.
    #[error("model '{id}' is already defined")]
    DuplicateRegistration {
        /// The id that was defined twice
        id: String,
    },

    /// A dependency cycle was detected.
    ///
    /// Raised synchronously out of `require`/`define` when an id reappears in
    /// its own ancestry chain during readiness checking, or at build time when
    /// a cycle is reachable only through optional edges.
    #[error("circular dependency detected at '{id}'")]
    CircularDependency {
        /// The id that reappeared in its own ancestry chain
        id: String,
    },

    /// A required dependency had no store entry at build time.
    ///
    /// Readiness checking excludes this path for normal requests, so hitting
    /// it means the store was mutated out from under a build in progress.
    #[error("required dependency '{id}' has no definition")]
    MissingRequiredDependency {
        /// The id of the missing dependency
        id: String,
    },

    /// A factory failed while building a model.
    ///
    /// Dependencies already built and cached before the failing factory
    /// remain cached; construction is not rolled back.
    #[error("factory for model '{id}' failed")]
    FactoryError {
        /// The id whose factory failed
        id: String,
        /// The error the factory returned
        #[source]
        source: anyhow::Error,
    },
}

impl LazybindError {
    /// Shorthand for [`LazybindError::InvalidArgument`].
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LazybindError>;
