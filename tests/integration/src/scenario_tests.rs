//! Scenario tests for the observable contract of the two commands
//!
//! Each test drives the library the same way the helper binary does:
//! evaluate text, resolve it, encode the result as JSON.

use isolate_format::{ConfigTable, ErrorKind, IsolateLoader};
use isolate_literal::eval_content;
use isolate_test_utils::TestIsolateTree;
use isolate_test_utils::manifests::{HOSTILE, LINUX_AND_DEFAULT, MULTI_VARIABLE, NO_CONDITIONS};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

fn resolve(tree: &TestIsolateTree, manifest: &str) -> Value {
    let configs = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), manifest)
        .unwrap();
    serde_json::to_value(ConfigTable::from_configs(&configs).unwrap()).unwrap()
}

#[rstest]
#[case("{'a': [1, -2, 0x10], 'b': (None, True, False)}", json!({"a": [1, -2, 16], "b": [null, true, false]}))]
#[case("'con' \"cat\"", json!("concat"))]
#[case("[]", json!([]))]
#[case("{}", json!({}))]
#[case("{'nested': {'deeper': [{'x': ''}]}}", json!({"nested": {"deeper": [{"x": ""}]}}))]
fn test_eval_content_wire_value(#[case] input: &str, #[case] expected: Value) {
    let value = eval_content(input).unwrap();
    assert_eq!(serde_json::to_value(&value).unwrap(), expected);
}

#[test]
fn test_name_references_never_evaluate() {
    for src in HOSTILE {
        let err = eval_content(src).unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::Parse | ErrorKind::Integrity),
            "{src}: {err}"
        );
    }
}

#[test]
fn test_no_conditions_scenario() {
    let tree = TestIsolateTree::new();
    let table = resolve(&tree, NO_CONDITIONS);
    assert_eq!(table["ConfigVariables"], json!([]));
    assert_eq!(table["ByConfig"].as_array().unwrap().len(), 1);
    assert_eq!(table["ByConfig"][0]["key"], json!([]));
}

#[test]
fn test_bound_and_unbound_records_differ_only_in_binding() {
    let tree = TestIsolateTree::new();
    let table = resolve(
        &tree,
        r#"{
          'conditions': [['OS=="linux"', {'variables': {'files': ['same']}}]],
          'variables': {'files': ['same']},
        }"#,
    );
    let entries = table["ByConfig"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["value"], entries[1]["value"]);
    assert_eq!(entries[0]["key"][0]["IsBound"], json!(true));
    assert_eq!(entries[1]["key"][0]["IsBound"], json!(false));
}

#[rstest]
#[case(NO_CONDITIONS)]
#[case(LINUX_AND_DEFAULT)]
#[case(MULTI_VARIABLE)]
fn test_key_length_matches_variables(#[case] manifest: &str) {
    let tree = TestIsolateTree::new();
    let table = resolve(&tree, manifest);
    let variables = table["ConfigVariables"].as_array().unwrap().len();
    for entry in table["ByConfig"].as_array().unwrap() {
        assert_eq!(entry["key"].as_array().unwrap().len(), variables);
    }
}

#[test]
fn test_read_only_sentinel_only_when_unspecified() {
    let tree = TestIsolateTree::new();
    let table = resolve(
        &tree,
        r#"{'conditions': [
            ['OS=="a"', {'variables': {'read_only': 0}}],
            ['OS=="b"', {'variables': {'read_only': None}}],
            ['OS=="c"', {'variables': {}}],
        ]}"#,
    );
    let read_only: Vec<(String, i64)> = table["ByConfig"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["key"][0]["Value"].as_str().unwrap().to_string(),
                e["value"]["ReadOnly"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        read_only,
        vec![
            ("a".to_string(), 0),
            ("b".to_string(), -1),
            ("c".to_string(), -1),
            (String::new(), -1),
        ]
    );
}

#[test]
fn test_malformed_manifest_produces_no_table() {
    let tree = TestIsolateTree::new();
    let err = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), "{'conditions': [['OS==', {}]]}")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}
