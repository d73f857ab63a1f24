//! Error handling and edge case tests.

use pathstore::{Registry, StoreConfig, StoreError, Value};
use serde_json::json;

fn test_registry() -> Registry {
    // Keep tracing output visible when a test fails.
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
    Registry::new()
}

// --- Read Errors ---

#[test]
fn test_get_missing_intermediate() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"a": {}}))).unwrap();

    let err = store.get("a.b.c").unwrap_err();
    assert_eq!(
        err,
        StoreError::PathNotFound {
            namespace: "app".to_string(),
            path: "a.b.c".to_string(),
        }
    );

    // Reads never vivify.
    assert_eq!(store.root().to_json(), json!({"a": {}}));
}

#[test]
fn test_get_through_scalar() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"a": 1}))).unwrap();
    assert!(matches!(
        store.get("a.b"),
        Err(StoreError::PathNotFound { .. })
    ));
}

#[test]
fn test_get_array_out_of_range() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"xs": [1]}))).unwrap();
    assert_eq!(store.get("xs.0").unwrap(), Value::Int(1));
    assert!(store.get("xs.1").is_err());
    assert!(store.get("xs.first").is_err());
}

// --- Path & Namespace Errors ---

#[test]
fn test_empty_path_rejected_everywhere() {
    let registry = test_registry();
    let store = registry.store("app", Value::empty_object()).unwrap();

    assert_eq!(store.get("").unwrap_err(), StoreError::InvalidPath(String::new()));
    assert!(matches!(store.set_value("", 1), Err(StoreError::InvalidPath(_))));
    assert!(matches!(store.subscribe("", || {}), Err(StoreError::InvalidPath(_))));
    assert!(matches!(store.get("a..b"), Err(StoreError::InvalidPath(_))));
}

#[test]
fn test_empty_namespace_rejected() {
    let registry = test_registry();
    assert_eq!(
        registry.store("", Value::Null).unwrap_err(),
        StoreError::InvalidNamespace
    );
    assert!(matches!(
        registry.subscribe_all("", || {}),
        Err(StoreError::InvalidNamespace)
    ));
    assert!(matches!(
        registry.set("", "a", Value::Null),
        Err(StoreError::InvalidNamespace)
    ));
}

// --- Write Errors ---

#[test]
fn test_write_without_auto_vivify() {
    let _ = test_registry();
    let registry = Registry::with_config(StoreConfig {
        auto_vivify: false,
        ..Default::default()
    });
    let store = registry.store("app", Value::from(json!({"a": {}}))).unwrap();
    let root_before = store.root();

    let err = store.set_value("a.b.c", 1).unwrap_err();
    assert_eq!(
        err,
        StoreError::PathNotFound {
            namespace: "app".to_string(),
            path: "a.b".to_string(),
        }
    );
    assert!(store.root().same(&root_before));

    // Updaters fail before running when the parent is missing.
    let err = store
        .update("x.y", |_| panic!("updater must not run"))
        .unwrap_err();
    assert!(matches!(err, StoreError::PathNotFound { .. }));

    // Leaf creation under an existing parent is still allowed.
    store.set_value("a.b", 1).unwrap();
    assert_eq!(store.get("a.b").unwrap(), Value::Int(1));
}

#[test]
fn test_write_through_scalar_fails_cleanly() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"a": "text"}))).unwrap();
    let root_before = store.root();

    let err = store.set_value("a.b", 1).unwrap_err();
    assert_eq!(
        err,
        StoreError::NotContainer {
            namespace: "app".to_string(),
            path: "a".to_string(),
        }
    );
    assert!(store.root().same(&root_before));
    assert_eq!(store.version(), 0);
}

#[test]
fn test_updater_not_run_for_write_through_scalar() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"a": "text", "xs": [1]}))).unwrap();

    let err = store
        .update("a.b", |_| panic!("updater must not run"))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotContainer { .. }));

    let err = store
        .update("xs.3", |_| panic!("updater must not run"))
        .unwrap_err();
    assert!(matches!(err, StoreError::PathNotFound { .. }));
    assert_eq!(store.version(), 0);
}

#[test]
fn test_write_replaces_null_intermediate() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"a": null}))).unwrap();
    store.set_value("a.b", 1).unwrap();
    assert_eq!(store.root().to_json(), json!({"a": {"b": 1}}));
}

#[test]
fn test_array_write_bounds() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"xs": [1]}))).unwrap();

    store.set_value("xs.1", 2).unwrap();
    assert_eq!(store.get("xs").unwrap().to_json(), json!([1, 2]));

    assert!(matches!(
        store.set_value("xs.5", 3),
        Err(StoreError::PathNotFound { .. })
    ));
}

#[test]
fn test_non_canonical_index_rejected() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"xs": [1, 2]}))).unwrap();
    let fired = std::rc::Rc::new(std::cell::Cell::new(0));
    let flag = std::rc::Rc::clone(&fired);
    let _sub = store.subscribe("xs.1", move || flag.set(flag.get() + 1)).unwrap();

    assert!(store.get("xs.01").is_err());
    assert!(matches!(
        store.set_value("xs.01", 9),
        Err(StoreError::PathNotFound { .. })
    ));
    assert!(store.set_value("xs.+1", 9).is_err());
    assert_eq!(store.get("xs").unwrap().to_json(), json!([1, 2]));
    assert_eq!(fired.get(), 0);

    store.set_value("xs.1", 9).unwrap();
    assert_eq!(fired.get(), 1);
}

#[test]
fn test_failed_write_does_not_notify() {
    let registry = test_registry();
    let store = registry.store("app", Value::from(json!({"a": 1}))).unwrap();
    let fired = std::rc::Rc::new(std::cell::Cell::new(false));
    let flag = std::rc::Rc::clone(&fired);
    let _sub = store.subscribe_all(move || flag.set(true));

    assert!(store.set_value("a.b", 1).is_err());
    assert!(!fired.get());
}

// --- Messages ---

#[test]
fn test_error_messages() {
    assert_eq!(
        StoreError::PathNotFound {
            namespace: "app".to_string(),
            path: "a.b".to_string(),
        }
        .to_string(),
        "Path not found in namespace app: a.b"
    );
    assert_eq!(
        StoreError::InvalidPath("a..b".to_string()).to_string(),
        "Invalid path: \"a..b\""
    );
}
