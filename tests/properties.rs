//! Property tests for reads, writes and notification fan-out.

use pathstore::{Registry, Value};
use proptest::prelude::*;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn segment() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string)
}

fn path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 1..5)
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn is_prefix(prefix: &[String], path: &[String]) -> bool {
    prefix.len() <= path.len() && prefix == &path[..prefix.len()]
}

proptest! {
    #[test]
    fn prop_set_then_get(segments in path(), value in scalar()) {
        let registry = Registry::new();
        let store = registry.store("p", Value::empty_object()).unwrap();
        let dotted = segments.join(".");

        store.set_value(&dotted, value.clone()).unwrap();
        prop_assert!(store.get(&dotted).unwrap().same(&value));
    }

    #[test]
    fn prop_untouched_siblings_keep_identity(segments in path(), n in any::<i64>()) {
        let registry = Registry::new();
        let store = registry
            .store("p", Value::from(json!({"a": {"b": {}}, "b": [1, 2], "c": {"d": {}}, "d": {}})))
            .unwrap();
        let before = store.root();
        let dotted = segments.join(".");

        // Writes through scalars or arrays may fail; only successful ones count.
        if store.set_value(&dotted, n).is_ok() {
            let top = &segments[0];
            for (key, old) in before.as_object().unwrap() {
                let now = store.root().child(key).cloned();
                if key != top {
                    prop_assert!(now.unwrap().same(old), "sibling {} changed identity", key);
                }
            }
        }
    }

    #[test]
    fn prop_only_prefix_subscribers_fire(
        subscribed in prop::collection::vec(path(), 1..6),
        written in path(),
    ) {
        let registry = Registry::new();
        let store = registry.store("p", Value::empty_object()).unwrap();
        let fired: Rc<RefCell<Vec<usize>>> = Rc::default();

        let _subs: Vec<_> = subscribed
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let fired = Rc::clone(&fired);
                store.subscribe(&p.join("."), move || fired.borrow_mut().push(i)).unwrap()
            })
            .collect();

        // Drop whatever is there so the write always changes something.
        store.set_root(Value::empty_object());
        fired.borrow_mut().clear();

        store.set_value(&written.join("."), 1).unwrap();

        let mut expected: Vec<usize> = subscribed
            .iter()
            .enumerate()
            .filter(|(_, p)| is_prefix(p, &written))
            .map(|(i, _)| i)
            .collect();
        let mut got = fired.borrow().clone();
        expected.sort_unstable();
        got.sort_unstable();
        prop_assert_eq!(got, expected);
    }
}
