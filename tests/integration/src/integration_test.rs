//! End-to-end integration test for the manifest pipeline
//!
//! This test exercises the complete flow on the checked-in fixture tree:
//! literal evaluation -> include resolution -> per-configuration table ->
//! wire serialization.

use isolate_format::path::NormalizedPath;
use isolate_format::{ConfigTable, IsolateLoader, ReadOnly};
use isolate_literal::Value;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/isolate")
}

fn fixture_dir(name: &str) -> (PathBuf, String) {
    let dir = fixtures().join(name);
    let normalized = NormalizedPath::new(&dir).as_str().to_string();
    (dir, normalized)
}

fn browser_tests() -> (IsolateLoader, Value, PathBuf) {
    let (dir, _) = fixture_dir("browser_tests");
    let content = fs::read_to_string(dir.join("browser_tests.isolate")).unwrap();
    let loader = IsolateLoader::from_filesystem();
    let value = loader.evaluator().eval(&content).unwrap();
    (loader, value, dir)
}

fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_fixture_evaluates_as_literal() {
    let (_, value, _) = browser_tests();
    let includes = value.get("includes").and_then(Value::as_sequence).unwrap();
    assert_eq!(includes, &[Value::from("../base/base.isolate")]);
}

#[test]
fn test_resolved_table_shape() {
    let (loader, value, dir) = browser_tests();
    let configs = loader.load_isolate_as_config(&dir, &value).unwrap();
    let table = ConfigTable::from_configs(&configs).unwrap();

    assert_eq!(table.config_variables, vec!["OS", "chromeos"]);
    let keys: Vec<Vec<(String, bool)>> = table
        .by_config
        .iter()
        .map(|e| e.key.iter().map(|k| (k.value.clone(), k.is_bound)).collect())
        .collect();
    let b = |v: &str| (v.to_string(), true);
    let u = || (String::new(), false);
    assert_eq!(
        keys,
        vec![
            vec![b("linux"), b("1")],
            vec![b("linux"), u()],
            vec![b("mac"), u()],
            vec![b("win"), u()],
            vec![u(), u()],
        ]
    );
}

#[test]
fn test_global_entry_takes_command_from_include() {
    let (loader, value, dir) = browser_tests();
    let (_, base_dir) = fixture_dir("base");
    let configs = loader.load_isolate_as_config(&dir, &value).unwrap();
    let table = ConfigTable::from_configs(&configs).unwrap();

    let global = &table.by_config.last().unwrap().value;
    assert_eq!(global.command, vec!["python", "run_test_cases.py"]);
    assert_eq!(global.isolate_dir, base_dir);
    assert_eq!(global.read_only, 1);
    assert_eq!(
        global.files,
        vec![
            "../browser_tests/test_data/common/",
            "data/",
            "run_test_cases.py"
        ]
    );

    let win = &table.by_config[3].value;
    assert_eq!(win.read_only, 0);
    assert_eq!(win.files, vec!["<(PRODUCT_DIR)/base.dll"]);
}

#[test]
fn test_linux_chromeos_config() {
    let (loader, value, dir) = browser_tests();
    let (_, test_dir) = fixture_dir("browser_tests");
    let settings = loader
        .load_isolate_for_config(&dir, &value, &vars(&[("OS", "linux"), ("chromeos", "1")]))
        .unwrap();

    assert_eq!(settings.command, vec!["xvfb.py", "<(PRODUCT_DIR)/browser_tests"]);
    assert_eq!(settings.isolate_dir, test_dir);
    assert_eq!(settings.read_only, ReadOnly::new(1));
    assert_eq!(
        settings.files,
        vec![
            "../base/data/",
            "../base/run_test_cases.py",
            "../browser_tests/test_data/common/",
            "<(PRODUCT_DIR)/libbase.so",
            "xvfb.py",
        ]
    );
}

#[test]
fn test_mac_config() {
    let (loader, value, dir) = browser_tests();
    let (_, base_dir) = fixture_dir("base");
    let settings = loader
        .load_isolate_for_config(&dir, &value, &vars(&[("OS", "mac"), ("chromeos", "0")]))
        .unwrap();

    assert_eq!(settings.command, vec!["python", "run_test_cases.py"]);
    assert_eq!(settings.isolate_dir, base_dir);
    assert_eq!(settings.read_only, ReadOnly::new(2));
    assert_eq!(
        settings.files,
        vec![
            "../browser_tests/test_data/common/",
            "../browser_tests/test_data/mac/",
            "<(PRODUCT_DIR)/libbase.so",
            "data/",
            "run_test_cases.py",
        ]
    );
}

#[test]
fn test_wire_output_is_stable_across_runs() {
    let (loader, value, dir) = browser_tests();
    let first = serde_json::to_string(
        &ConfigTable::from_configs(&loader.load_isolate_as_config(&dir, &value).unwrap()).unwrap(),
    )
    .unwrap();
    let second = serde_json::to_string(
        &ConfigTable::from_configs(&loader.load_isolate_as_config(&dir, &value).unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(first, second);
}
