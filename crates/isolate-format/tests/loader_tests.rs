//! Loading manifests and their includes from a real directory tree.

use isolate_format::{
    ConfigName, ConfigTable, ConfigValue, Error, ErrorKind, IsolateLoader, ReadOnly,
};
use isolate_test_utils::TestIsolateTree;
use isolate_test_utils::manifests::{LINUX_AND_DEFAULT, MULTI_VARIABLE, NO_CONDITIONS};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn name(values: &[Option<&str>]) -> ConfigName {
    ConfigName::new(
        values
            .iter()
            .map(|v| match v {
                Some(v) => ConfigValue::bound(*v),
                None => ConfigValue::Unbound,
            })
            .collect(),
    )
}

#[test]
fn test_no_conditions_gives_single_global_entry() {
    let tree = TestIsolateTree::new();
    let configs = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), NO_CONDITIONS)
        .unwrap();
    let table = ConfigTable::from_configs(&configs).unwrap();

    assert!(table.config_variables.is_empty());
    assert_eq!(table.by_config.len(), 1);
    assert!(table.by_config[0].key.is_empty());
    assert_eq!(table.by_config[0].value.isolate_dir, tree.root_str());
    assert_eq!(table.by_config[0].value.read_only, -1);
}

#[test]
fn test_linux_and_default_differ_only_in_binding() {
    let tree = TestIsolateTree::new();
    let configs = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), LINUX_AND_DEFAULT)
        .unwrap();
    let table = ConfigTable::from_configs(&configs).unwrap();

    assert_eq!(table.config_variables, vec!["OS"]);
    assert_eq!(table.by_config.len(), 2);
    let (linux, default) = (&table.by_config[0], &table.by_config[1]);
    assert!(linux.key[0].is_bound);
    assert_eq!(linux.key[0].value, "linux");
    assert!(!default.key[0].is_bound);
    assert_eq!(default.key[0].value, "");

    assert_eq!(linux.value.command, vec!["./run_tests", "--verbose"]);
    assert_eq!(linux.value.files, vec!["data/", "run_tests"]);
    assert_eq!(linux.value.read_only, 1);
    assert_eq!(default.value.files, vec!["common.txt"]);
    assert_eq!(default.value.read_only, -1);
}

#[test]
fn test_multi_variable_bindings() {
    let tree = TestIsolateTree::new();
    let configs = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), MULTI_VARIABLE)
        .unwrap();

    assert_eq!(configs.config_variables().to_vec(), vec!["CPU", "OS"]);
    let keys: Vec<ConfigName> = configs.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![
            name(&[Some("arm"), Some("linux")]),
            name(&[Some("x64"), Some("linux")]),
            name(&[Some("x64"), Some("win")]),
            name(&[None, Some("mac")]),
            name(&[None, None]),
        ]
    );

    let mac = configs.get_exact_config(&name(&[None, Some("mac")])).unwrap();
    assert_eq!(mac.read_only, ReadOnly::new(2));
    assert_eq!(mac.files, vec!["foo.app/"]);
}

#[test]
fn test_every_key_matches_variable_count() {
    let tree = TestIsolateTree::new();
    let configs = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), MULTI_VARIABLE)
        .unwrap();
    let table = ConfigTable::from_configs(&configs).unwrap();
    for entry in &table.by_config {
        assert_eq!(entry.key.len(), table.config_variables.len());
    }
}

#[test]
fn test_includes_from_disk() {
    let tree = TestIsolateTree::new();
    tree.write_isolate(
        "base/base.isolate",
        r#"{
          'conditions': [
            ['OS=="win"', {'variables': {'files': ['win/helper.dll']}}],
          ],
          'variables': {'command': ['python', 'run.py'], 'files': ['run.py']},
        }"#,
    );
    tree.write_isolate(
        "base/extra.isolate",
        "{'variables': {'files': ['<(PRODUCT_DIR)/data.bin', 'extra/']}}",
    );
    tree.write_isolate(
        "tests/main.isolate",
        r#"{
          'includes': ['../base/base.isolate', '../base/extra.isolate'],
          'variables': {'files': ['test_data/']},
        }"#,
    );
    tree.assert_file_exists("base/base.isolate");
    tree.assert_file_exists("base/extra.isolate");

    let configs = IsolateLoader::from_filesystem()
        .load_content_as_config(&tree.path("tests"), &tree.read("tests/main.isolate"))
        .unwrap();

    let root = tree.root_str();
    assert_eq!(configs.config_variables().to_vec(), vec!["OS"]);

    let global = configs.get_exact_config(&name(&[None])).unwrap();
    assert_eq!(global.command, vec!["python", "run.py"]);
    assert_eq!(global.isolate_dir, format!("{root}/base"));
    assert_eq!(
        global.files,
        vec![
            "../base/extra/",
            "../tests/test_data/",
            "<(PRODUCT_DIR)/data.bin",
            "run.py"
        ]
    );

    let win = configs.get_exact_config(&name(&[Some("win")])).unwrap();
    assert_eq!(win.files, vec!["win/helper.dll"]);
    assert_eq!(win.isolate_dir, format!("{root}/base"));
}

#[test]
fn test_nested_includes_resolve_from_their_own_directory() {
    let tree = TestIsolateTree::new();
    tree.write_isolate("a/one.isolate", "{'includes': ['b/two.isolate']}");
    tree.write_isolate("a/b/two.isolate", "{'variables': {'files': ['two.txt']}}");

    let configs = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), "{'includes': ['a/one.isolate']}")
        .unwrap();
    let (_, global) = configs.iter().next().unwrap();
    assert_eq!(global.isolate_dir, format!("{}/a/b", tree.root_str()));
    assert_eq!(global.files, vec!["two.txt"]);
}

#[test]
fn test_include_cycle_on_disk() {
    let tree = TestIsolateTree::new();
    tree.write_isolate("loop.isolate", "{'includes': ['loop.isolate']}");

    let err = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), "{'includes': ['loop.isolate']}")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidManifest { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_missing_include_file() {
    let tree = TestIsolateTree::new();
    let err = IsolateLoader::from_filesystem()
        .load_content_as_config(tree.root(), "{'includes': ['nope.isolate']}")
        .unwrap_err();
    assert!(matches!(err, Error::Include { .. }));
    assert!(err.to_string().contains("nope.isolate"));
}

#[test]
fn test_load_for_config_merges_default_and_specific() {
    let tree = TestIsolateTree::new();
    let loader = IsolateLoader::from_filesystem();
    let value = loader.evaluator().eval(LINUX_AND_DEFAULT).unwrap();

    let vars: BTreeMap<String, String> =
        [("OS".to_string(), "linux".to_string())].into_iter().collect();
    let settings = loader
        .load_isolate_for_config(tree.root(), &value, &vars)
        .unwrap();
    assert_eq!(settings.command, vec!["./run_tests", "--verbose"]);
    assert_eq!(settings.files, vec!["common.txt", "data/", "run_tests"]);
    assert_eq!(settings.read_only, ReadOnly::new(1));

    let vars: BTreeMap<String, String> =
        [("OS".to_string(), "mac".to_string())].into_iter().collect();
    let settings = loader
        .load_isolate_for_config(tree.root(), &value, &vars)
        .unwrap();
    assert!(settings.command.is_empty());
    assert_eq!(settings.files, vec!["common.txt"]);
}

#[test]
fn test_load_for_config_reports_missing_variables() {
    let tree = TestIsolateTree::new();
    let loader = IsolateLoader::from_filesystem();
    let value = loader.evaluator().eval(MULTI_VARIABLE).unwrap();

    let vars: BTreeMap<String, String> =
        [("OS".to_string(), "linux".to_string())].into_iter().collect();
    let err = loader
        .load_isolate_for_config(tree.root(), &value, &vars)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);
    assert_eq!(
        err.to_string(),
        r#"These configuration variables were missing from the command line: ["CPU"]"#
    );
}
