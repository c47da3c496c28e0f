//! Tests for the resolver module.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::*;

fn int_factory(value: i32, calls: &Arc<AtomicUsize>) -> Registrable {
    let calls = Arc::clone(calls);
    Registrable::factory(move |_deps| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Model::new(value)))
    })
}

fn delivered_ints(models: &[ModelValue]) -> Vec<Option<i32>> {
    models
        .iter()
        .map(|model| model.as_ref().and_then(|m| m.downcast_ref::<i32>().copied()))
        .collect()
}

#[test]
fn test_parse_required_token() {
    let descriptor = Descriptor::parse("db").unwrap();
    assert_eq!(descriptor.id, "db");
    assert!(descriptor.required);
}

#[test]
fn test_parse_optional_token() {
    let descriptor = Descriptor::parse("metrics?").unwrap();
    assert_eq!(descriptor.id, "metrics");
    assert!(!descriptor.required);
}

#[test]
fn test_parse_strips_only_trailing_marker() {
    // Only the last character is reserved; the rest of the id is opaque.
    let descriptor = Descriptor::parse("a??").unwrap();
    assert_eq!(descriptor.id, "a?");
    assert!(!descriptor.required);
}

#[test]
fn test_parse_rejects_empty_token() {
    assert!(matches!(
        Descriptor::parse(""),
        Err(LazybindError::InvalidArgument { .. })
    ));
    assert!(matches!(
        Descriptor::parse("?"),
        Err(LazybindError::InvalidArgument { .. })
    ));
}

#[test]
fn test_structured_descriptor_passthrough() {
    // A pre-built descriptor bypasses parsing: no marker stripping.
    let mut provider = Provider::new();
    provider
        .define("weird?", NO_DEPS, Registrable::value(1_i32))
        .unwrap();

    let delivered = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&delivered);
    provider
        .require([Descriptor::required("weird?")], move |models| {
            *sink.lock().unwrap() = Some(delivered_ints(&models));
        })
        .unwrap();
    assert_eq!(*delivered.lock().unwrap(), Some(vec![Some(1)]));
}

#[test]
fn test_structured_descriptor_rejects_empty_id() {
    let mut provider = Provider::new();
    let result = provider.require([Descriptor::required("")], |_| {});
    assert!(matches!(result, Err(LazybindError::InvalidArgument { .. })));
}

#[test]
fn test_define_rejects_duplicate_id() {
    let mut provider = Provider::new();
    provider.define("a", NO_DEPS, Registrable::value(1_i32)).unwrap();
    let result = provider.define("a", NO_DEPS, Registrable::value(2_i32));
    assert!(matches!(
        result,
        Err(LazybindError::DuplicateRegistration { id }) if id == "a"
    ));
}

#[test]
fn test_define_rejects_empty_id() {
    let mut provider = Provider::new();
    let result = provider.define("", NO_DEPS, Registrable::value(1_i32));
    assert!(matches!(result, Err(LazybindError::InvalidArgument { .. })));
}

#[test]
fn test_define_rejects_malformed_token_without_registering() {
    let mut provider = Provider::new();
    let result = provider.define("a", ["?"], Registrable::Undefined);
    assert!(matches!(result, Err(LazybindError::InvalidArgument { .. })));
    assert!(!provider.is_defined("a"));
}

#[test]
fn test_with_store_requires_empty_store() {
    let provider = Provider::with_store(Store::new(), ProviderOptions::default());
    assert!(provider.is_ok());

    let mut used = Store::new();
    used.insert(
        "a".to_string(),
        Entry {
            deps: Vec::new(),
            registrable: Registrable::Undefined,
            built: None,
            cache: true,
        },
    );
    let result = Provider::with_store(used, ProviderOptions::default());
    assert!(matches!(result, Err(LazybindError::InvalidArgument { .. })));
}

#[test]
fn test_unresolved_reports_absent_id() {
    let provider = Provider::new();
    let deps = [Descriptor::required("a")];
    let blocked = readiness::unresolved(&provider.store, &deps).unwrap();
    assert_eq!(blocked, vec!["a".to_string()]);
}

#[test]
fn test_unresolved_reports_root_cause_not_immediate_id() {
    // A request blocked transitively on a grandchild is filed directly under
    // the grandchild.
    let mut provider = Provider::new();
    provider
        .define("a", ["b"], Registrable::factory(|_| Ok(None)))
        .unwrap();
    let deps = [Descriptor::required("a")];
    let blocked = readiness::unresolved(&provider.store, &deps).unwrap();
    assert_eq!(blocked, vec!["b".to_string()]);
}

#[test]
fn test_unresolved_deduplicates_diamond() {
    let mut provider = Provider::new();
    provider
        .define("a", ["b", "c"], Registrable::factory(|_| Ok(None)))
        .unwrap();
    provider
        .define("b", ["d"], Registrable::factory(|_| Ok(None)))
        .unwrap();
    provider
        .define("c", ["d"], Registrable::factory(|_| Ok(None)))
        .unwrap();
    let deps = [Descriptor::required("a")];
    let blocked = readiness::unresolved(&provider.store, &deps).unwrap();
    assert_eq!(blocked, vec!["d".to_string()]);
}

#[test]
fn test_unresolved_skips_optional() {
    let provider = Provider::new();
    let deps = [Descriptor::optional("a"), Descriptor::required("b")];
    let blocked = readiness::unresolved(&provider.store, &deps).unwrap();
    assert_eq!(blocked, vec!["b".to_string()]);
}

#[test]
fn test_unresolved_treats_constant_as_resolved() {
    let mut provider = Provider::new();
    // A falsy-but-defined constant still counts as built: presence, not
    // truthiness.
    provider.define("zero", NO_DEPS, Registrable::value(0_i32)).unwrap();
    let deps = [Descriptor::required("zero")];
    let blocked = readiness::unresolved(&provider.store, &deps).unwrap();
    assert!(blocked.is_empty());
}

#[test]
fn test_undefined_result_is_memoized_as_built() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut provider = Provider::new();
    provider
        .define(
            "nothing",
            NO_DEPS,
            Registrable::factory(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }),
        )
        .unwrap();

    provider.require(["nothing"], |models| assert!(models[0].is_none())).unwrap();
    provider.require(["nothing"], |models| assert!(models[0].is_none())).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_require_detects_cycle_without_invoking_factories() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut provider = Provider::new();
    provider.define("a", ["b"], int_factory(1, &calls)).unwrap();
    provider.define("b", ["a"], int_factory(2, &calls)).unwrap();

    let result = provider.require(["a"], |_| panic!("success must not fire"));
    assert!(matches!(
        result,
        Err(LazybindError::CircularDependency { id }) if id == "a"
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_build_detects_cycle_through_optional_edge() {
    // Readiness skips optional edges, so the cycle is only reachable at
    // build time.
    let mut provider = Provider::new();
    provider
        .define("a", ["b?"], Registrable::factory(|_| Ok(None)))
        .unwrap();
    provider
        .define("b", ["a"], Registrable::factory(|_| Ok(None)))
        .unwrap();

    let result = provider.require(["a"], |_| panic!("success must not fire"));
    assert!(matches!(result, Err(LazybindError::CircularDependency { .. })));
}

#[test]
fn test_build_missing_required_is_surfaced() {
    let mut provider = Provider::new();
    let deps = [Descriptor::required("ghost")];
    let result = builder::build(&mut provider.store, &deps);
    assert!(matches!(
        result,
        Err(LazybindError::MissingRequiredDependency { id }) if id == "ghost"
    ));
}

#[test]
fn test_optional_dependency_resolves_to_undefined() {
    let mut provider = Provider::new();
    provider.define("a", NO_DEPS, Registrable::value(7_i32)).unwrap();

    let delivered = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&delivered);
    provider
        .require(["a", "missing?"], move |models| {
            *sink.lock().unwrap() = Some(delivered_ints(&models));
        })
        .unwrap();
    assert_eq!(*delivered.lock().unwrap(), Some(vec![Some(7), None]));
}

#[test]
fn test_cache_enabled_invokes_factory_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut provider = Provider::new();
    provider.define("x", NO_DEPS, int_factory(5, &calls)).unwrap();

    provider.require(["x"], |_| {}).unwrap();
    provider.require(["x"], |_| {}).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cache_disabled_rebuilds_every_time() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut provider = Provider::new();
    provider
        .define_with(
            "x",
            Vec::<DepToken>::new(),
            int_factory(5, &calls),
            EntryOptions { cache: Some(false) },
        )
        .unwrap();

    provider.require(["x"], |_| {}).unwrap();
    provider.require(["x"], |_| {}).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_provider_level_cache_default_applies() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut provider = Provider::with_options(ProviderOptions { cache: false });
    provider.define("x", NO_DEPS, int_factory(5, &calls)).unwrap();

    provider.require(["x"], |_| {}).unwrap();
    provider.require(["x"], |_| {}).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_undefined_registrable_marks_id_defined() {
    let mut provider = Provider::new();
    provider.define("flag", NO_DEPS, Registrable::Undefined).unwrap();
    assert!(provider.is_defined("flag"));

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    provider
        .require(["flag"], move |models| {
            assert!(models[0].is_none());
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[test]
fn test_factory_error_preserves_source() {
    let mut provider = Provider::new();
    provider
        .define(
            "boom",
            NO_DEPS,
            Registrable::factory(|_| Err(anyhow::anyhow!("out of widgets"))),
        )
        .unwrap();

    let result = provider.require(["boom"], |_| panic!("success must not fire"));
    match result {
        Err(LazybindError::FactoryError { id, source }) => {
            assert_eq!(id, "boom");
            assert_eq!(source.to_string(), "out of widgets");
        }
        other => panic!("expected FactoryError, got {other:?}"),
    }
}

#[test]
fn test_factory_failure_keeps_earlier_cached_values() {
    // Partial construction is not rolled back.
    let calls = Arc::new(AtomicUsize::new(0));
    let mut provider = Provider::new();
    provider.define("good", NO_DEPS, int_factory(1, &calls)).unwrap();
    provider
        .define(
            "bad",
            NO_DEPS,
            Registrable::factory(|_| Err(anyhow::anyhow!("nope"))),
        )
        .unwrap();

    assert!(provider.require(["good", "bad"], |_| {}).is_err());
    // "good" was built and cached before the failure; a later request reuses
    // the cached value.
    provider.require(["good"], |_| {}).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_blocked_request_parks_under_every_unresolved_id() {
    let mut provider = Provider::new();
    provider.require(["x", "y"], |_| {}).unwrap();
    assert_eq!(provider.pending_ids(), vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn test_partial_definition_keeps_request_parked() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let mut provider = Provider::new();
    provider
        .require(["x", "y"], move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    provider.define("x", NO_DEPS, Registrable::value(1_i32)).unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 0);
    assert_eq!(provider.pending_ids(), vec!["y".to_string()]);

    provider.define("y", NO_DEPS, Registrable::value(2_i32)).unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    assert!(provider.pending_ids().is_empty());
}

#[test]
fn test_define_refiles_bucket_under_entry_dependencies() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let mut provider = Provider::new();
    provider
        .require(["a"], move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    // Defining "a" with its own unresolved dep moves the request under "b".
    provider
        .define("a", ["b"], Registrable::factory(|_| Ok(Some(Model::new(1_i32)))))
        .unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 0);
    assert_eq!(provider.pending_ids(), vec!["b".to_string()]);

    provider.define("b", NO_DEPS, Registrable::value(2_i32)).unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[test]
fn test_define_without_waiters_returns_immediately() {
    let mut provider = Provider::new();
    provider.define("lonely", NO_DEPS, Registrable::value(1_i32)).unwrap();
    assert!(provider.pending_ids().is_empty());
}

#[test]
fn test_fatal_handler_receives_build_error() {
    let fatal_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fatal_calls);
    let mut provider = Provider::new();
    provider
        .define(
            "boom",
            NO_DEPS,
            Registrable::factory(|_| Err(anyhow::anyhow!("bang"))),
        )
        .unwrap();

    provider
        .require_or_else(
            ["boom"],
            |_| panic!("success must not fire"),
            move |error| {
                assert!(matches!(error, LazybindError::FactoryError { .. }));
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();
    assert_eq!(fatal_calls.load(Ordering::SeqCst), 1);
}
