//! Wiring between an external module loader and a [`Provider`].
//!
//! The loader itself lives outside this crate: it discovers modules (however
//! it likes - filesystem scan, static list, plugin host) and hands them over
//! as an ordered sequence of [`BootModule`]s. Each module may expose an
//! initializer; [`boot`] invokes the initializers with the provider as their
//! only argument, synchronously, in loader order, with no error isolation
//! between modules - the first failing initializer stops the boot and its
//! error propagates to the caller.

use std::path::PathBuf;

use crate::resolver::Provider;

/// A module initializer: registers definitions and requests on the provider.
pub type InitFn = Box<dyn FnOnce(&mut Provider) -> anyhow::Result<()> + Send>;

/// A loader-discovered module.
pub struct BootModule {
    /// Where the loader found the module; used for logging only.
    pub path: PathBuf,
    init: Option<InitFn>,
}

impl BootModule {
    /// A module that exposes an initializer.
    pub fn new<F>(path: impl Into<PathBuf>, init: F) -> Self
    where
        F: FnOnce(&mut Provider) -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            path: path.into(),
            init: Some(Box::new(init)),
        }
    }

    /// A module without an initializer; [`setup`] skips it.
    pub fn inert(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            init: None,
        }
    }
}

impl std::fmt::Debug for BootModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootModule")
            .field("path", &self.path)
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// Invoke one module's initializer with the provider. Modules without an
/// initializer are skipped.
pub fn setup(provider: &mut Provider, module: BootModule) -> anyhow::Result<()> {
    match module.init {
        Some(init) => {
            tracing::debug!(path = %module.path.display(), "initializing module");
            init(provider)
        }
        None => {
            tracing::trace!(path = %module.path.display(), "module has no initializer, skipping");
            Ok(())
        }
    }
}

/// Drive a loader-provided sequence of modules, in order.
pub fn boot<L>(modules: L, provider: &mut Provider) -> anyhow::Result<()>
where
    L: IntoIterator<Item = BootModule>,
{
    for module in modules {
        setup(provider, module)?;
    }
    Ok(())
}
