//! Model building: depth-first, synchronous construction of argument lists.
//!
//! Building assumes readiness was already checked: every required id has a
//! store entry (a missing one is surfaced as an internal-invariant error, not
//! swallowed). Values are resolved positionally, in dependency order, and a
//! factory failure stops construction immediately - factories positioned
//! after the failing one are never invoked, and nothing already cached is
//! rolled back.

use crate::core::{LazybindError, Result};
use crate::resolver::descriptor::Descriptor;
use crate::resolver::store::{ModelValue, Registrable, Store};

/// Resolve every descriptor in `deps` to its model value, building (and
/// memoizing, per entry policy) whatever is not yet known.
pub(crate) fn build(store: &mut Store, deps: &[Descriptor]) -> Result<Vec<ModelValue>> {
    let mut chain = Vec::new();
    build_args(store, deps, &mut chain)
}

fn build_args(
    store: &mut Store,
    deps: &[Descriptor],
    chain: &mut Vec<String>,
) -> Result<Vec<ModelValue>> {
    let mut args = Vec::with_capacity(deps.len());
    for dep in deps {
        args.push(resolve_one(store, dep, chain)?);
    }
    Ok(args)
}

fn resolve_one(store: &mut Store, dep: &Descriptor, chain: &mut Vec<String>) -> Result<ModelValue> {
    let Some(entry) = store.get(&dep.id) else {
        if dep.required {
            // Readiness checking excludes this path; surface, don't swallow.
            return Err(LazybindError::MissingRequiredDependency { id: dep.id.clone() });
        }
        return Ok(None);
    };
    if let Some(value) = entry.known_model() {
        return Ok(value);
    }

    // Readiness skips optional edges, so a cycle can still be reachable here.
    if chain.contains(&dep.id) {
        return Err(LazybindError::CircularDependency { id: dep.id.clone() });
    }

    let entry_deps = entry.deps.clone();
    chain.push(dep.id.clone());
    let args = build_args(store, &entry_deps, chain)?;
    let value = invoke(store, &dep.id, args)?;
    chain.pop();

    if let Some(entry) = store.get_mut(&dep.id) {
        if entry.cache {
            entry.built = Some(value.clone());
        }
    }
    Ok(value)
}

/// Invoke the registrable for `id` with its resolved dependencies.
///
/// The factory is taken out of the entry while it runs so the store stays
/// borrowable; it is restored before the result is inspected.
fn invoke(store: &mut Store, id: &str, args: Vec<ModelValue>) -> Result<ModelValue> {
    let mut factory = match store.get_mut(id) {
        Some(entry) => match std::mem::replace(&mut entry.registrable, Registrable::Undefined) {
            Registrable::Factory(factory) => factory,
            other => {
                // Constants were handled by known_model(); Undefined builds
                // to the undefined model.
                entry.registrable = other;
                return Ok(None);
            }
        },
        None => return Err(LazybindError::MissingRequiredDependency { id: id.to_string() }),
    };

    tracing::trace!(id = %id, args = args.len(), "invoking factory");
    let result = factory(args);
    if let Some(entry) = store.get_mut(id) {
        entry.registrable = Registrable::Factory(factory);
    }
    result.map_err(|source| LazybindError::FactoryError {
        id: id.to_string(),
        source,
    })
}
