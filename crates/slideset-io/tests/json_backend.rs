use std::collections::BTreeMap;

use slideset_io::backends::json::{from_json_str, load_tree, save_tree, to_json_string};
use slideset_io::{IoError, JsonAdapter, JsonWriteOptions, SaveDestination};
use slideset_table::{CreationInfo, LinkDefaults, LinkPolicy, Table, TableTree};
use slideset_testkit::{counts_table, mixed_table, tempdir};

fn sample_tree() -> TableTree {
    let mut tree = TableTree::new();
    let mut root = mixed_table();
    root.set_working_dir(Some("/data/experiment".into()));
    let mask = root.require_column("Mask").unwrap();
    root.set_link_defaults(mask, LinkDefaults::new("masks").with_extension("tif").with_counter(7))
        .unwrap();
    root.set_column_extra(mask, "channel", "2").unwrap();
    root.set_link_policy(LinkPolicy {
        counter_width: 5,
        separator: "_".to_string(),
        ..LinkPolicy::default()
    });
    let root = tree.insert_root(root);

    let mut child = counts_table(&[10, 20, 30]);
    child.set_name("Measure results");
    let mut params = BTreeMap::new();
    params.insert("Count".to_string(), "column \"Count\" via integer-i32".to_string());
    child.set_creation(Some(CreationInfo::new("Measure", params)));
    let child = tree.insert_child(root, child).unwrap();
    tree.insert_child(child, Table::new("empty")).unwrap();

    tree.insert_root(counts_table(&[]));
    tree
}

fn snapshot(tree: &TableTree) -> Vec<(String, Table)> {
    tree.walk_all()
        .into_iter()
        .map(|id| (tree.path_of(id).unwrap(), tree.get(id).unwrap().clone()))
        .collect()
}

#[test]
fn round_trip_preserves_tables_and_hierarchy() {
    let tree = sample_tree();
    let json = to_json_string(&tree).unwrap();
    let back = from_json_str(&json).unwrap();

    assert_eq!(back.roots().len(), 2);
    assert_eq!(snapshot(&back), snapshot(&tree));

    let results = back.find_path("mixed/Measure results").unwrap();
    let creation = back.get(results).unwrap().creation().unwrap();
    assert_eq!(creation.command, "Measure");
    assert_eq!(creation.parameters.len(), 1);

    let root = back.get(back.roots()[0]).unwrap();
    let mask = &root.columns()[root.require_column("Mask").unwrap()];
    assert_eq!(mask.link.counter, 7);
    assert_eq!(mask.link.extension.as_deref(), Some("tif"));
    assert_eq!(mask.extra["channel"], "2");
    assert_eq!(root.link_policy().counter_width, 5);
    assert_eq!(root.link_policy().separator, "_");

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["tables"][0]["link_policy"]["separator"], "_");
    assert!(value["tables"][1].get("link_policy").is_none());
}

#[test]
fn files_and_bytes_agree() {
    let dir = tempdir();
    let path = dir.path().join("tree.json");
    let tree = sample_tree();
    save_tree(&tree, &path).unwrap();

    let adapter = JsonAdapter::open_path(&path).unwrap();
    assert_eq!(adapter.path(), Some(path.as_path()));
    let bytes = adapter.save_to_bytes().unwrap();
    assert_eq!(bytes, std::fs::read(&path).unwrap());

    let compact = adapter
        .save_to(SaveDestination::Bytes, &JsonWriteOptions { pretty: false })
        .unwrap()
        .unwrap();
    assert!(!compact.contains(&b'\n'));
    let reparsed = JsonAdapter::open_bytes(&compact).unwrap().into_tree().unwrap();
    assert_eq!(snapshot(&reparsed), snapshot(&load_tree(&path).unwrap()));
}

#[test]
fn in_place_save_needs_a_known_path() {
    let adapter = JsonAdapter::from_tree(&sample_tree()).unwrap();
    assert!(matches!(
        adapter.save_to(SaveDestination::InPlace, &JsonWriteOptions::default()),
        Err(IoError::Backend { .. })
    ));
}

#[test]
fn newer_versions_are_rejected() {
    let err = from_json_str(r#"{ "version": 99, "tables": [] }"#).unwrap_err();
    assert!(matches!(err, IoError::Version { found: 99, .. }));
}

#[test]
fn bad_cell_text_names_its_location() {
    let json = r#"{
        "tables": [{
            "name": "t",
            "columns": [{ "name": "n", "kind": "integer", "subtype": "integer", "cells": ["1", "x"] }]
        }]
    }"#;
    match from_json_str(json).unwrap_err() {
        IoError::Cell { table, column, row, .. } => {
            assert_eq!((table.as_str(), column.as_str(), row), ("t", "n", 1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ragged_columns_are_rejected() {
    let json = r#"{
        "tables": [{
            "name": "t",
            "columns": [
                { "name": "a", "kind": "text", "subtype": "text", "cells": ["1", "2"] },
                { "name": "b", "kind": "text", "subtype": "text", "cells": ["1"] }
            ]
        }]
    }"#;
    assert!(matches!(
        from_json_str(json).unwrap_err(),
        IoError::Table { .. }
    ));
}
