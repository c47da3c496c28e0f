//! Core types shared across lazybind.
//!
//! Currently this is the error module; every fallible operation in the crate
//! returns [`Result`] with a [`LazybindError`] describing which contract was
//! violated.

pub mod error;

pub use error::{LazybindError, Result};
