use proptest::prelude::*;
use serde_json::{Value, json};
use tabstate_types::StatePath;

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parse_splits_on_dots() {
    let path = StatePath::parse("settings.theme");
    assert_eq!(path.segments(), ["settings", "theme"]);
    assert_eq!(path.to_dotted(), "settings.theme");
}

#[test]
fn empty_string_is_root() {
    assert!(StatePath::parse("").is_root());
    assert!(StatePath::parse(".").is_root());
    assert!(StatePath::root().is_empty());
}

#[test]
fn empty_segments_are_dropped() {
    assert_eq!(StatePath::parse("a..b.").to_dotted(), "a.b");
}

#[test]
fn display_matches_dotted() {
    assert_eq!(StatePath::parse("a.b.c").to_string(), "a.b.c");
}

// ── Navigation ───────────────────────────────────────────────────

#[test]
fn ancestors_are_nearest_first_without_root() {
    let ancestors: Vec<String> = StatePath::parse("a.b.c")
        .ancestors()
        .iter()
        .map(StatePath::to_dotted)
        .collect();
    assert_eq!(ancestors, ["a.b", "a"]);
}

#[test]
fn top_level_path_has_no_ancestors() {
    assert!(StatePath::parse("a").ancestors().is_empty());
    assert!(StatePath::root().ancestors().is_empty());
}

#[test]
fn parent_of_root_is_none() {
    assert_eq!(StatePath::root().parent(), None);
    assert_eq!(StatePath::parse("a").parent(), Some(StatePath::root()));
}

#[test]
fn ancestor_relation_is_strict() {
    let a = StatePath::parse("a");
    let ab = StatePath::parse("a.b");
    assert!(a.is_ancestor_of(&ab));
    assert!(!ab.is_ancestor_of(&a));
    assert!(!a.is_ancestor_of(&a));
    assert!(StatePath::root().is_ancestor_of(&a));
    assert!(!StatePath::parse("ab").is_ancestor_of(&StatePath::parse("a.b")));
}

#[test]
fn join() {
    let base = StatePath::parse("user");
    let joined = base.join(&StatePath::parse("profile.name"));
    assert_eq!(joined.to_dotted(), "user.profile.name");
    assert_eq!(StatePath::root().join(&base), base);
}

// ── lookup ───────────────────────────────────────────────────────

#[test]
fn lookup_nested_and_missing() {
    let tree = json!({"a": {"b": {"c": 1}}, "list": [10, 20]});
    assert_eq!(StatePath::parse("a.b.c").lookup(&tree), Some(&json!(1)));
    assert_eq!(StatePath::parse("list.1").lookup(&tree), Some(&json!(20)));
    assert_eq!(StatePath::parse("a.x.c").lookup(&tree), None);
    assert_eq!(StatePath::parse("a.b.c.d").lookup(&tree), None);
    assert_eq!(StatePath::parse("list.9").lookup(&tree), None);
    assert_eq!(StatePath::root().lookup(&tree), Some(&tree));
}

#[test]
fn lookup_distinguishes_null_from_missing() {
    let tree = json!({"a": null});
    assert_eq!(StatePath::parse("a").lookup(&tree), Some(&Value::Null));
    assert_eq!(StatePath::parse("b").lookup(&tree), None);
}

// ── assign ───────────────────────────────────────────────────────

#[test]
fn assign_creates_intermediates() {
    let mut tree = json!({});
    let previous = StatePath::parse("a.b.c").assign(&mut tree, json!(5));
    assert_eq!(previous, None);
    assert_eq!(tree, json!({"a": {"b": {"c": 5}}}));
}

#[test]
fn assign_overwrites_scalar_intermediates() {
    let mut tree = json!({"a": 3});
    StatePath::parse("a.b").assign(&mut tree, json!("x"));
    assert_eq!(tree, json!({"a": {"b": "x"}}));
}

#[test]
fn assign_returns_previous_value() {
    let mut tree = json!({"theme": "light"});
    let previous = StatePath::parse("theme").assign(&mut tree, json!("dark"));
    assert_eq!(previous, Some(json!("light")));
}

#[test]
fn assign_root_replaces_tree() {
    let mut tree = json!({"a": 1});
    StatePath::root().assign(&mut tree, json!({"b": 2}));
    assert_eq!(tree, json!({"b": 2}));
}

#[test]
fn assign_into_sequence_index() {
    let mut tree = json!({"list": [{"n": 1}, {"n": 2}]});
    StatePath::parse("list.1.n").assign(&mut tree, json!(9));
    assert_eq!(tree, json!({"list": [{"n": 1}, {"n": 9}]}));
}

#[test]
fn assign_at_sequence_end_appends() {
    let mut tree = json!({"list": [1]});
    let previous = StatePath::parse("list.1").assign(&mut tree, json!(2));
    assert_eq!(previous, None);
    assert_eq!(tree, json!({"list": [1, 2]}));
}

#[test]
fn assign_past_sequence_end_pads_with_null() {
    let mut tree = json!({"list": [1]});
    StatePath::parse("list.3").assign(&mut tree, json!(4));
    assert_eq!(tree, json!({"list": [1, null, null, 4]}));
}

#[test]
fn assign_through_new_sequence_element() {
    let mut tree = json!({"list": [{"n": 1}]});
    StatePath::parse("list.1.n").assign(&mut tree, json!(2));
    assert_eq!(tree, json!({"list": [{"n": 1}, {"n": 2}]}));
}

#[test]
fn assign_named_key_on_sequence_replaces_it() {
    let mut tree = json!({"list": [1]});
    StatePath::parse("list.name").assign(&mut tree, json!("x"));
    assert_eq!(tree, json!({"list": {"name": "x"}}));
}

// ── remove_from ──────────────────────────────────────────────────

#[test]
fn remove_existing_leaf() {
    let mut tree = json!({"a": {"b": 1, "c": 2}});
    let removed = StatePath::parse("a.b").remove_from(&mut tree);
    assert_eq!(removed, Some(json!(1)));
    assert_eq!(tree, json!({"a": {"c": 2}}));
}

#[test]
fn remove_with_missing_parent_is_noop() {
    let mut tree = json!({"a": 1});
    assert_eq!(StatePath::parse("x.y").remove_from(&mut tree), None);
    assert_eq!(StatePath::parse("a.y").remove_from(&mut tree), None);
    assert_eq!(tree, json!({"a": 1}));
}

#[test]
fn remove_sequence_element_leaves_null() {
    let mut tree = json!({"xs": [10, 20, 30]});
    let removed = StatePath::parse("xs.0").remove_from(&mut tree);
    assert_eq!(removed, Some(json!(10)));
    assert_eq!(tree, json!({"xs": [null, 20, 30]}));
    assert_eq!(StatePath::parse("xs.2").lookup(&tree), Some(&json!(30)));
    assert_eq!(StatePath::parse("xs.9").remove_from(&mut tree), None);
}

#[test]
fn remove_root_is_noop() {
    let mut tree = json!({"a": 1});
    assert_eq!(StatePath::root().remove_from(&mut tree), None);
    assert_eq!(tree, json!({"a": 1}));
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serializes_as_dotted_string() {
    let path = StatePath::parse("ui.sidebarOpen");
    assert_eq!(serde_json::to_string(&path).unwrap(), "\"ui.sidebarOpen\"");
    let back: StatePath = serde_json::from_str("\"ui.sidebarOpen\"").unwrap();
    assert_eq!(back, path);
}

// ── Properties ───────────────────────────────────────────────────

fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

proptest! {
    #[test]
    fn assign_then_lookup_returns_value(
        segments in prop::collection::vec(segment_strategy(), 1..5),
        n in any::<i64>(),
    ) {
        let path = StatePath::from_segments(segments);
        let mut tree = json!({"seed": true});
        path.assign(&mut tree, json!(n));
        prop_assert_eq!(path.lookup(&tree), Some(&json!(n)));
    }

    #[test]
    fn dotted_roundtrip(segments in prop::collection::vec(segment_strategy(), 0..6)) {
        let path = StatePath::from_segments(segments);
        prop_assert_eq!(StatePath::parse(&path.to_dotted()), path);
    }
}
