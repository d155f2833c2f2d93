//! Canned manifest texts shared by test suites.

/// A manifest with no conditions at all.
pub const NO_CONDITIONS: &str = "{'conditions': []}";

/// One `OS=="linux"` block plus root variables that apply everywhere.
pub const LINUX_AND_DEFAULT: &str = r#"{
  'conditions': [
    ['OS=="linux"', {
      'variables': {
        'command': ['./run_tests', '--verbose'],
        'files': ['run_tests', 'data/'],
        'read_only': 1,
      },
    }],
  ],
  'variables': {
    'files': ['common.txt'],
  },
}"#;

/// Two variables, nested boolean conditions and a path variable entry.
pub const MULTI_VARIABLE: &str = r#"{
  'conditions': [
    ['OS=="linux" and (CPU=="x64" or CPU=="arm")', {
      'variables': {
        'files': ['<(PRODUCT_DIR)/libfoo.so'],
      },
    }],
    ['OS=="mac"', {
      'variables': {
        'command': ['./foo.app'],
        'files': ['foo.app/'],
        'read_only': 2,
      },
    }],
    ['OS=="win" and CPU=="x64"', {
      'variables': {
        'files': ['foo.exe'],
      },
    }],
  ],
}"#;

/// Manifest text that must never be evaluated.
pub const HOSTILE: &[&str] = &[
    "import os",
    "__import__('os').system('true')",
    "{'files': open('/etc/passwd').read()}",
    "[x for x in ()]",
    "(lambda: 1)()",
    "{}.__class__",
];
