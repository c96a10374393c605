use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tabstate_store::{Store, StoreConfig};

// ── get ──────────────────────────────────────────────────────────

#[test]
fn get_whole_tree_with_empty_path() {
    let store = Store::new(json!({"a": 1}));
    assert_eq!(store.get(""), Some(json!({"a": 1})));
    assert_eq!(store.snapshot(), json!({"a": 1}));
}

#[test]
fn get_missing_returns_default() {
    let store = Store::new(json!({"a": {"b": 1}}));
    assert_eq!(store.get("a.c"), None);
    assert_eq!(store.get_or("x.y.z", json!("dflt")), json!("dflt"));
    assert_eq!(store.get_or("a.b", json!("dflt")), json!(1));
}

#[test]
fn get_null_is_present() {
    let store = Store::new(json!({"user": null}));
    assert_eq!(store.get_or("user", json!("dflt")), Value::Null);
}

#[test]
fn get_returns_independent_copy() {
    let store = Store::new(json!({"list": [1, 2]}));
    let mut copy = store.get("list").unwrap();
    copy.as_array_mut().unwrap().push(json!(3));
    assert_eq!(store.get("list"), Some(json!([1, 2])));
}

#[test]
fn get_as_typed() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct Settings {
        theme: String,
    }
    let store = Store::new(json!({"settings": {"theme": "dark"}}));
    assert_eq!(
        store.get_as::<Settings>("settings"),
        Some(Settings {
            theme: "dark".into()
        })
    );
    assert_eq!(store.get_as::<u32>("settings"), None);
}

#[test]
fn default_store_is_empty_mapping() {
    let store = Store::default();
    assert_eq!(store.snapshot(), json!({}));
    assert_eq!(store.history_len(), 1);
    assert_eq!(store.config(), &StoreConfig::default());
}

// ── set ──────────────────────────────────────────────────────────

#[test]
fn set_creates_intermediates() {
    let store = Store::default();
    store.set("a.b.c", 1);
    assert_eq!(store.snapshot(), json!({"a": {"b": {"c": 1}}}));
}

#[test]
fn set_overwrites_non_mapping_intermediate() {
    let store = Store::new(json!({"a": "scalar"}));
    store.set("a.b", true);
    assert_eq!(store.get("a"), Some(json!({"b": true})));
}

#[test]
fn set_past_sequence_end_appends_and_keeps_existing() {
    let store = Store::new(json!({"orders": [{"id": 1}, {"id": 2}]}));
    store.set("orders.1.status", "paid");
    store.set("orders.2", json!({"id": 3}));

    assert_eq!(
        store.get("orders"),
        Some(json!([{"id": 1}, {"id": 2, "status": "paid"}, {"id": 3}]))
    );
}

#[test]
fn set_far_past_sequence_end_pads_with_null() {
    let store = Store::new(json!({"orders": []}));
    store.set("orders.2.id", 7);
    assert_eq!(store.get("orders"), Some(json!([null, null, {"id": 7}])));
}

#[test]
fn set_is_chainable() {
    let store = Store::default();
    store.set("a", 1).set("b", 2);
    assert_eq!(store.snapshot(), json!({"a": 1, "b": 2}));
}

#[test]
fn set_whole_tree() {
    let store = Store::new(json!({"old": true}));
    store.set("", json!({"new": true}));
    assert_eq!(store.snapshot(), json!({"new": true}));
}

#[test]
fn set_serialized_value() {
    #[derive(Serialize)]
    struct Order {
        id: u32,
        total: f64,
    }
    let store = Store::default();
    store
        .set_serialized("orders.0", &Order { id: 7, total: 9.5 })
        .unwrap();
    assert_eq!(store.get("orders.0"), Some(json!({"id": 7, "total": 9.5})));
}

#[test]
fn clones_share_the_tree() {
    let store = Store::default();
    let other = store.clone();
    other.set("shared", 1);
    assert_eq!(store.get("shared"), Some(json!(1)));
}

// ── update ───────────────────────────────────────────────────────

#[test]
fn update_applies_in_order_with_one_snapshot_each() {
    let store = Store::default();
    store.update([("a", json!(1)), ("b", json!(2)), ("a", json!(3))]);
    assert_eq!(store.snapshot(), json!({"a": 3, "b": 2}));
    assert_eq!(store.history_len(), 4);
}

#[test]
fn update_accepts_json_map_iteration_order() {
    let store = Store::default();
    let map = json!({"z": 1, "a": 2});
    let entries = map.as_object().unwrap().clone();
    store.update(entries);
    assert_eq!(store.snapshot(), json!({"z": 1, "a": 2}));
}

#[test]
fn update_batched_records_one_snapshot() {
    let store = Store::default();
    store.update_batched([("a", json!(1)), ("b", json!(2))]);
    assert_eq!(store.snapshot(), json!({"a": 1, "b": 2}));
    assert_eq!(store.history_len(), 2);
}

#[test]
fn update_batched_empty_is_noop() {
    let store = Store::default();
    store.update_batched(Vec::<(String, Value)>::new());
    assert_eq!(store.history_len(), 1);
}

// ── delete ───────────────────────────────────────────────────────

#[test]
fn delete_existing_leaf() {
    let store = Store::new(json!({"a": {"b": 1, "c": 2}}));
    store.delete("a.b");
    assert_eq!(store.snapshot(), json!({"a": {"c": 2}}));
    assert_eq!(store.history_len(), 2);
}

#[test]
fn delete_missing_key_under_existing_parent_still_records() {
    let store = Store::new(json!({"a": {}}));
    store.delete("a.nope");
    assert_eq!(store.snapshot(), json!({"a": {}}));
    assert_eq!(store.history_len(), 2);
}

#[test]
fn delete_with_missing_parent_is_noop() {
    let store = Store::new(json!({"a": 1}));
    store.delete("x.y").delete("a.b");
    assert_eq!(store.snapshot(), json!({"a": 1}));
    assert_eq!(store.history_len(), 1);
}

#[test]
fn delete_sequence_element_keeps_later_indices() {
    let store = Store::new(json!({"xs": [10, 20, 30]}));
    store.delete("xs.0");
    assert_eq!(store.get("xs"), Some(json!([null, 20, 30])));
    assert_eq!(store.get("xs.2"), Some(json!(30)));
}

#[test]
fn delete_top_level_key() {
    let store = Store::new(json!({"a": 1, "b": 2}));
    store.delete("a");
    assert_eq!(store.snapshot(), json!({"b": 2}));
}
