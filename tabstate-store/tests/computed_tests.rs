use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tabstate_store::{Store, StoreError};

fn as_i64(value: &Option<Value>) -> i64 {
    value.as_ref().and_then(Value::as_i64).unwrap_or(0)
}

// ── Recompute ────────────────────────────────────────────────────

#[test]
fn computes_immediately_on_registration() {
    let store = Store::new(json!({"a": 2, "b": 3}));
    store
        .computed("sum", &["a", "b"], |v| json!(as_i64(&v[0]) + as_i64(&v[1])))
        .unwrap();
    assert_eq!(store.get("sum"), Some(json!(5)));
}

#[test]
fn recomputes_when_dependency_changes() {
    let store = Store::new(json!({"a": 2, "b": 3}));
    store
        .computed("sum", &["a", "b"], |v| json!(as_i64(&v[0]) + as_i64(&v[1])))
        .unwrap();

    store.set("a", 10);
    assert_eq!(store.get("sum"), Some(json!(13)));
    store.set("b", 0);
    assert_eq!(store.get("sum"), Some(json!(10)));
}

#[test]
fn recomputes_when_something_beneath_dependency_changes() {
    let store = Store::new(json!({"cart": {"items": []}}));
    store
        .computed("cart_size", &["cart"], |v| {
            let items = v[0]
                .as_ref()
                .and_then(|cart| cart.get("items"))
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            json!(items)
        })
        .unwrap();

    store.set("cart.items", json!(["apple", "pear"]));
    assert_eq!(store.get("cart_size"), Some(json!(2)));
}

#[test]
fn missing_dependency_is_passed_as_none() {
    let store = Store::default();
    store
        .computed("present", &["nope"], |v| json!(v[0].is_some()))
        .unwrap();
    assert_eq!(store.get("present"), Some(json!(false)));
}

#[test]
fn chained_computed_values_propagate() {
    let store = Store::new(json!({"n": 1}));
    store
        .computed("double", &["n"], |v| json!(as_i64(&v[0]) * 2))
        .unwrap();
    store
        .computed("quad", &["double"], |v| json!(as_i64(&v[0]) * 2))
        .unwrap();

    store.set("n", 3);
    assert_eq!(store.get("double"), Some(json!(6)));
    assert_eq!(store.get("quad"), Some(json!(12)));
}

// ── Rejection ────────────────────────────────────────────────────

#[test]
fn direct_self_dependency_is_rejected() {
    let store = Store::default();
    let err = store.computed("x", &["x"], |_| json!(1)).unwrap_err();
    assert!(matches!(err, StoreError::ComputedCycle { ref path } if path == "x"));
}

#[test]
fn dependency_on_ancestor_or_descendant_is_rejected() {
    let store = Store::default();
    assert!(store.computed("a.b", &["a"], |_| json!(1)).is_err());
    assert!(store.computed("a", &["a.b"], |_| json!(1)).is_err());
    assert_eq!(store.computed_count(), 0);
}

#[test]
fn two_node_cycle_is_rejected() {
    let store = Store::default();
    store.computed("x", &["y"], |_| json!(1)).unwrap();
    let err = store.computed("y", &["x"], |_| json!(2)).unwrap_err();
    assert!(matches!(err, StoreError::ComputedCycle { .. }));
    assert_eq!(store.computed_count(), 1);
}

#[test]
fn longer_cycle_through_ancestor_is_rejected() {
    let store = Store::default();
    store.computed("b", &["a"], |_| json!(1)).unwrap();
    store.computed("c.total", &["b"], |_| json!(1)).unwrap();
    // c.total changing notifies listeners on "c", which feeds back into "a".
    assert!(store.computed("a", &["c"], |_| json!(1)).is_err());
}

#[test]
fn wildcard_dependency_is_rejected() {
    let store = Store::default();
    let err = store.computed("x", &["*"], |_| json!(1)).unwrap_err();
    assert!(matches!(err, StoreError::InvalidDependency(ref d) if d == "*"));
}

#[test]
fn siblings_are_not_cycles() {
    let store = Store::new(json!({"stats": {"a": 1}}));
    store
        .computed("stats_b", &["stats.a"], |v| json!(as_i64(&v[0]) + 1))
        .unwrap();
    assert_eq!(store.get("stats_b"), Some(json!(2)));
}

// ── Disposal ─────────────────────────────────────────────────────

#[test]
fn dispose_stops_recomputing_and_keeps_last_value() {
    let store = Store::new(json!({"n": 1}));
    let binding = store
        .computed("double", &["n"], |v| json!(as_i64(&v[0]) * 2))
        .unwrap();
    assert_eq!(binding.path(), "double");

    binding.dispose();
    binding.dispose();
    store.set("n", 5);

    assert_eq!(store.get("double"), Some(json!(2)));
    assert_eq!(store.computed_count(), 0);
    assert_eq!(store.subscriber_count("n"), 0);
}

#[test]
fn dispose_allows_previously_cyclic_registration() {
    let store = Store::default();
    let first = store.computed("x", &["y"], |_| json!(1)).unwrap();
    first.dispose();
    assert!(store.computed("y", &["x"], |_| json!(2)).is_ok());
}
