//! Readiness checking: which ids transitively block a dependency list.
//!
//! The walk returns root-cause ids, not immediate ones: a request blocked
//! transitively on a grandchild id is filed directly under that grandchild,
//! so it is woken precisely when the grandchild is registered. A per-pass
//! `seen` memo keeps diamond-shaped graphs linear, and an ancestry chain
//! turns re-entry into a synchronous [`CircularDependency`] error.
//!
//! [`CircularDependency`]: crate::LazybindError::CircularDependency

use std::collections::HashMap;

use crate::core::{LazybindError, Result};
use crate::resolver::descriptor::Descriptor;
use crate::resolver::store::Store;

/// Return the de-duplicated set of unresolved ids blocking `deps`.
///
/// Empty means every required dependency (and its transitive closure) can be
/// built right now.
pub(crate) fn unresolved(store: &Store, deps: &[Descriptor]) -> Result<Vec<String>> {
    let mut seen = HashMap::new();
    let mut ancestry = Vec::new();
    walk(store, deps, &mut seen, &mut ancestry)
}

fn walk(
    store: &Store,
    deps: &[Descriptor],
    seen: &mut HashMap<String, bool>,
    ancestry: &mut Vec<String>,
) -> Result<Vec<String>> {
    let mut blocked = Vec::new();
    for dep in deps {
        // Optional dependencies never block.
        if !dep.required {
            continue;
        }
        if ancestry.contains(&dep.id) {
            return Err(LazybindError::CircularDependency { id: dep.id.clone() });
        }
        // Already classified during this pass.
        if seen.contains_key(&dep.id) {
            continue;
        }
        let Some(entry) = store.get(&dep.id) else {
            seen.insert(dep.id.clone(), false);
            blocked.push(dep.id.clone());
            continue;
        };
        seen.insert(dep.id.clone(), true);
        if entry.has_model() || entry.deps.is_empty() {
            continue;
        }
        ancestry.push(dep.id.clone());
        let nested = walk(store, &entry.deps, seen, ancestry)?;
        ancestry.pop();
        if nested.is_empty() {
            continue;
        }
        // Blocked on the nested root causes, not on this id itself.
        seen.insert(dep.id.clone(), false);
        blocked.extend(nested);
    }
    Ok(blocked)
}
