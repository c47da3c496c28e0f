//! The pending-request registry.
//!
//! Each blocked `require` is stored exactly once, keyed by a monotonically
//! increasing request key, and that key is indexed under every id the request
//! is currently blocked on. Single ownership is what makes delivery
//! exactly-once: flushing one bucket takes the request out of the registry,
//! and keys left behind in other buckets simply find nothing to deliver.
//!
//! Buckets are `BTreeSet`s, so flushing walks requests in filing order.

use std::collections::{BTreeSet, HashMap};

use crate::core::LazybindError;
use crate::resolver::descriptor::Descriptor;
use crate::resolver::store::ModelValue;

/// Success continuation: receives the built models, positionally.
pub(crate) type SuccessFn = Box<dyn FnOnce(Vec<ModelValue>) + Send>;

/// Fatal continuation: receives the build error instead of propagation.
pub(crate) type FatalFn = Box<dyn FnOnce(LazybindError) + Send>;

/// A `require` call waiting for its blocking ids to be defined.
pub(crate) struct PendingRequest {
    pub(crate) deps: Vec<Descriptor>,
    pub(crate) success: SuccessFn,
    pub(crate) fatal: Option<FatalFn>,
}

#[derive(Default)]
pub(crate) struct PendingSet {
    /// The single owning copy of each parked request.
    requests: HashMap<u64, PendingRequest>,
    /// Which request keys each unresolved id is blocking.
    buckets: HashMap<String, BTreeSet<u64>>,
    /// Source of fresh request keys, unique across the provider's lifetime.
    next_key: u64,
}

impl PendingSet {
    /// Park `request` under every id in `blocked`, returning its fresh key.
    pub(crate) fn file(&mut self, request: PendingRequest, blocked: &[String]) -> u64 {
        self.next_key += 1;
        let key = self.next_key;
        self.requests.insert(key, request);
        for id in blocked {
            self.buckets.entry(id.clone()).or_default().insert(key);
        }
        key
    }

    /// Remove and return the bucket for `id`, if any request is parked on it.
    pub(crate) fn take_bucket(&mut self, id: &str) -> Option<BTreeSet<u64>> {
        self.buckets.remove(id)
    }

    /// Re-index `keys` under every id in `blocked`, merging into existing
    /// buckets. Keys whose request has already been delivered are dropped.
    pub(crate) fn refile(&mut self, keys: &BTreeSet<u64>, blocked: &[String]) {
        for id in blocked {
            let bucket = self.buckets.entry(id.clone()).or_default();
            for key in keys {
                if self.requests.contains_key(key) {
                    bucket.insert(*key);
                }
            }
        }
    }

    /// The dependency list of a still-parked request.
    pub(crate) fn deps_of(&self, key: u64) -> Option<&[Descriptor]> {
        self.requests.get(&key).map(|request| request.deps.as_slice())
    }

    /// Take a request out of the registry for delivery. Returns `None` if it
    /// was already delivered through another bucket.
    pub(crate) fn take_request(&mut self, key: u64) -> Option<PendingRequest> {
        self.requests.remove(&key)
    }

    /// Ids at least one live request is still blocked on.
    pub(crate) fn blocked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .buckets
            .iter()
            .filter(|(_, keys)| keys.iter().any(|key| self.requests.contains_key(key)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of requests still parked.
    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }
}
