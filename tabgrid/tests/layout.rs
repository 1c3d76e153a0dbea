use std::collections::BTreeMap;

use tabgrid::column::{ColumnDescriptor, ColumnRegistry};
use tabgrid::config::GridConfig;
use tabgrid::error::ConfigError;
use tabgrid::layout::{LayoutFragment, merge_layout, order_key, visibility_key, widths_key};
use tabgrid::row::Record;

fn columns(keys: &[&str]) -> Vec<ColumnDescriptor<Record>> {
    keys.iter()
        .map(|key| ColumnDescriptor::new(*key, key.to_uppercase(), 100))
        .collect()
}

fn order(keys: &[&str]) -> Option<Vec<String>> {
    Some(keys.iter().map(|k| k.to_string()).collect())
}

#[test]
fn test_storage_keys() {
    assert_eq!(widths_key("users"), "users_columnWidths");
    assert_eq!(visibility_key("users"), "users_visibleColumns");
    assert_eq!(order_key("users"), "users_columnOrder");
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn test_registry_rejects_duplicate_keys() {
    let err = ColumnRegistry::try_new(columns(&["a", "b", "a"])).unwrap_err();
    assert_eq!(err, ConfigError::DuplicateKey { key: "a".into() });
}

#[test]
fn test_registry_rejects_bad_descriptors() {
    let err = ColumnRegistry::<Record>::try_new(vec![ColumnDescriptor::new("", "Empty", 10)])
        .unwrap_err();
    assert_eq!(err, ConfigError::EmptyKey { index: 0 });

    let err =
        ColumnRegistry::<Record>::try_new(vec![ColumnDescriptor::new("a", "A", 0)]).unwrap_err();
    assert_eq!(err, ConfigError::ZeroWidth { key: "a".into() });
}

#[test]
#[should_panic(expected = "duplicate column key")]
fn test_registry_new_panics_on_duplicates() {
    let _ = ColumnRegistry::new(columns(&["a", "a"]));
}

#[test]
fn test_computed_columns_are_not_editable() {
    let column = ColumnDescriptor::<Record>::new("total", "Total", 100).computed(|_| 1.0.into());
    assert!(column.is_computed());
    assert!(!column.is_editable());
}

// =============================================================================
// Merge
// =============================================================================

#[test]
fn test_merge_empty_fragment_gives_defaults() {
    let registry = ColumnRegistry::new(columns(&["a", "b", "c"]));
    let layout = merge_layout(&LayoutFragment::default(), &registry, &GridConfig::new("t"));
    assert_eq!(layout, registry.default_layout());
}

#[test]
fn test_merge_appends_new_column_once() {
    let registry = ColumnRegistry::<Record>::new(vec![
        ColumnDescriptor::new("a", "A", 100),
        ColumnDescriptor::new("b", "B", 100),
        ColumnDescriptor::new("c", "C", 100),
        ColumnDescriptor::new("d", "D", 120).hidden(),
    ]);
    let fragment = LayoutFragment {
        column_order: order(&["c", "a", "b"]),
        visible_columns: Some(BTreeMap::from([("b".to_string(), false)])),
        column_widths: Some(BTreeMap::from([("a".to_string(), 300)])),
    };

    let layout = merge_layout(&fragment, &registry, &GridConfig::new("t"));
    assert_eq!(layout.column_order, vec!["c", "a", "b", "d"]);
    assert_eq!(layout.column_order.iter().filter(|k| *k == "d").count(), 1);
    assert_eq!(layout.visible_columns.get("d"), Some(&false));
    assert_eq!(layout.visible_columns.get("b"), Some(&false));
    assert_eq!(layout.visible_columns.get("a"), Some(&true));
    assert_eq!(layout.column_widths.get("a"), Some(&300));
    assert_eq!(layout.column_widths.get("d"), Some(&120));
}

#[test]
fn test_merge_inserts_before_trailing_columns() {
    let registry = ColumnRegistry::new(columns(&["a", "b", "new", "edit", "delete"]))
        .with_trailing_columns(2);
    let fragment = LayoutFragment {
        column_order: order(&["b", "a", "edit", "delete"]),
        ..LayoutFragment::default()
    };

    let layout = merge_layout(&fragment, &registry, &GridConfig::new("t"));
    assert_eq!(layout.column_order, vec!["b", "a", "new", "edit", "delete"]);
}

#[test]
fn test_merge_drops_unknown_and_duplicate_keys() {
    let registry = ColumnRegistry::new(columns(&["a", "b"]));
    let fragment = LayoutFragment {
        column_order: order(&["gone", "b", "b", "a"]),
        column_widths: Some(BTreeMap::from([("gone".to_string(), 10)])),
        visible_columns: Some(BTreeMap::from([("gone".to_string(), true)])),
    };

    let layout = merge_layout(&fragment, &registry, &GridConfig::new("t"));
    assert_eq!(layout.column_order, vec!["b", "a"]);
    assert!(!layout.column_widths.contains_key("gone"));
    assert!(!layout.visible_columns.contains_key("gone"));
}

#[test]
fn test_merge_clamps_saved_widths() {
    let registry = ColumnRegistry::new(columns(&["a"]));
    let fragment = LayoutFragment {
        column_widths: Some(BTreeMap::from([("a".to_string(), 3)])),
        ..LayoutFragment::default()
    };
    let layout = merge_layout(&fragment, &registry, &GridConfig::new("t"));
    assert_eq!(layout.column_widths.get("a"), Some(&50));
}

#[test]
fn test_merge_all_hidden_restores_visibility() {
    let registry = ColumnRegistry::new(columns(&["a", "b"]));
    let fragment = LayoutFragment {
        visible_columns: Some(BTreeMap::from([
            ("a".to_string(), false),
            ("b".to_string(), false),
        ])),
        ..LayoutFragment::default()
    };
    let layout = merge_layout(&fragment, &registry, &GridConfig::new("t"));
    assert_eq!(layout.visible_order(), vec!["a", "b"]);
}

#[test]
fn test_fragment_serializes_camel_case() {
    let registry = ColumnRegistry::new(columns(&["a"]));
    let fragment = registry.default_layout().to_fragment();
    let json = serde_json::to_value(&fragment).unwrap();
    assert_eq!(json["columnOrder"], serde_json::json!(["a"]));
    assert_eq!(json["columnWidths"]["a"], 100);
    assert_eq!(json["visibleColumns"]["a"], true);

    let partial: LayoutFragment = serde_json::from_str(r#"{"columnOrder":["a"]}"#).unwrap();
    assert!(partial.column_widths.is_none());
    assert!(!partial.is_empty());
}
