#![allow(clippy::disallowed_methods)]

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use bindle::{BundleError, BundleOrchestrator, Config, RuntimeMode};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A throwaway project directory
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    fn file(&self, relative: &str, content: &str) -> &Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn bundle(&self, entry: &str, runtime: RuntimeMode) -> anyhow::Result<String> {
        let config = Config {
            runtime,
            ..Default::default()
        };
        BundleOrchestrator::new(config).bundle(&self.dir.path().join(entry))
    }

    /// Run `code` with node; `None` when node is not installed
    fn run(&self, code: &str) -> Option<Output> {
        if !node_available() {
            eprintln!("node not found on PATH, skipping bundle execution");
            return None;
        }
        let path = self.dir.path().join("__bundle__.js");
        fs::write(&path, code).unwrap();
        Some(Command::new("node").arg(&path).output().unwrap())
    }
}

fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "bundle failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn bundle_error(result: anyhow::Result<String>) -> anyhow::Error {
    match result {
        Ok(code) => panic!("expected bundling to fail, got:\n{code}"),
        Err(err) => err,
    }
}

/// Every literal passed to the loader parameter inside the bundle
fn require_literals(code: &str) -> Vec<String> {
    code.match_indices("require(\"")
        .map(|(start, matched)| {
            let rest = &code[start + matched.len()..];
            rest[..rest.find('"').unwrap()].to_owned()
        })
        .collect()
}

#[test]
fn test_linear_chain_runs_each_module_once_in_dependency_order() {
    let fixture = Fixture::new();
    fixture
        .file(
            "main.js",
            "const a = require('./a');\nconsole.log('main ' + a);\n",
        )
        .file(
            "a.js",
            "const b = require('./b');\nconsole.log('a');\nmodule.exports = 'a:' + b;\n",
        )
        .file(
            "b.js",
            "const c = require('./lib/c');\nconsole.log('b');\nmodule.exports = 'b:' + c;\n",
        )
        .file("lib/c.js", "console.log('c');\nmodule.exports = 'c';\n");

    let code = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();
    if let Some(output) = fixture.run(&code) {
        assert_eq!(stdout_of(&output), "c\nb\na\nmain a:b:c\n");
    }
}

#[test]
fn test_shared_module_is_cached_and_identity_equal() {
    let fixture = Fixture::new();
    fixture
        .file(
            "main.js",
            "const x = require('./x');\nconst y = require('./nested/y');\nconsole.log(x === y);\n",
        )
        .file("x.js", "module.exports = require('./shared/state');\n")
        .file("nested/y.js", "module.exports = require('../shared/state.js');\n")
        .file(
            "shared/state.js",
            "console.log('state evaluated');\nmodule.exports = { count: 0 };\n",
        );

    let code = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();

    let state_id = fixture.root().join("shared/state.js");
    let registration = format!("__bindle_modules__[\"{}\"]", state_id.display());
    assert_eq!(code.matches(&registration).count(), 1);

    if let Some(output) = fixture.run(&code) {
        assert_eq!(stdout_of(&output), "state evaluated\ntrue\n");
    }
}

#[test]
fn test_falsy_exports_are_still_cached() {
    let fixture = Fixture::new();
    fixture
        .file(
            "main.js",
            "const first = require('./zero');\nconst second = require('./zero');\nconsole.log(first, second);\n",
        )
        .file("zero.js", "console.log('zero evaluated');\nmodule.exports = 0;\n");

    for runtime in [RuntimeMode::Reentrant, RuntimeMode::CycleSafe] {
        let code = fixture.bundle("main.js", runtime).unwrap();
        if let Some(output) = fixture.run(&code) {
            assert_eq!(stdout_of(&output), "zero evaluated\n0 0\n", "{runtime}");
        }
    }
}

#[test]
fn test_every_call_site_uses_a_registered_canonical_id() {
    let fixture = Fixture::new();
    fixture
        .file(
            "src/main.js",
            "const util = require('./util');\nfunction lazy() { return require('../config.json'); }\nmodule.exports = [util, lazy];\n",
        )
        .file("src/util/index.js", "module.exports = require('left-pad');\n")
        .file("config.json", "{ \"debug\": false }\n")
        .file("node_modules/left-pad/package.json", "{ \"main\": \"pad.js\" }\n")
        .file("node_modules/left-pad/pad.js", "module.exports = (s) => s;\n");

    let code = fixture.bundle("src/main.js", RuntimeMode::Reentrant).unwrap();
    let root = fixture.root();

    let literals = require_literals(&code);
    assert_eq!(literals.len(), 3);
    for literal in &literals {
        assert!(Path::new(literal).is_absolute(), "{literal} is not canonical");
        assert!(literal.starts_with(root.to_str().unwrap()));
        let registration = format!("__bindle_modules__[\"{literal}\"]");
        assert!(code.contains(&registration), "{literal} is not registered");
    }
}

#[test]
fn test_json_module_exports_its_value() {
    let fixture = Fixture::new();
    fixture
        .file(
            "main.js",
            "const settings = require('./settings');\nconsole.log(settings.name, settings.tags.length);\n",
        )
        .file("settings.json", "{ \"name\": \"bindle\", \"tags\": [1, 2, 3] }\n");

    let code = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();
    if let Some(output) = fixture.run(&code) {
        assert_eq!(stdout_of(&output), "bindle 3\n");
    }
}

#[test]
fn test_json_module_keeps_engine_json_semantics() {
    let fixture = Fixture::new();
    fixture
        .file(
            "main.js",
            "const data = require('./data.json');\nconsole.log(Object.keys(data).length, data.big === Infinity);\n",
        )
        .file("data.json", "{ \"__proto__\": { \"x\": 1 }, \"big\": 1e400 }\n");

    let code = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();
    if let Some(output) = fixture.run(&code) {
        assert_eq!(stdout_of(&output), "2 true\n");
    }
}

#[test]
fn test_byte_order_mark_and_hashbang_are_dropped() {
    let fixture = Fixture::new();
    fixture
        .file("main.js", "console.log(require('./cli'));\n")
        .file("cli.js", "\u{feff}#!/usr/bin/env node\nmodule.exports = 'cli';\n");

    let code = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();
    assert!(!code.contains("#!"));
    if let Some(output) = fixture.run(&code) {
        assert_eq!(stdout_of(&output), "cli\n");
    }
}

#[test]
fn test_bundling_is_deterministic() {
    let fixture = Fixture::new();
    fixture
        .file(
            "main.js",
            "require('./a');\nrequire('./b');\nrequire('./c');\n",
        )
        .file("a.js", "require('./c');\nrequire('./d');\n")
        .file("b.js", "require('./d');\n")
        .file("c.js", "exports.c = true;\n")
        .file("d.js", "exports.d = true;\n");

    let first = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();
    let second = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_require_cycle_overflows_with_reentrant_runtime() {
    let fixture = Fixture::new();
    fixture
        .file("a.js", "const b = require('./b');\nmodule.exports = { name: 'a' };\n")
        .file("b.js", "const a = require('./a');\nmodule.exports = { name: 'b' };\n");

    let code = fixture.bundle("a.js", RuntimeMode::Reentrant).unwrap();
    if let Some(output) = fixture.run(&code) {
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("Maximum call stack size exceeded"),
            "unexpected stderr: {stderr}"
        );
    }
}

#[test]
fn test_require_cycle_sees_partial_exports_with_cycle_safe_runtime() {
    let fixture = Fixture::new();
    fixture
        .file(
            "a.js",
            "console.log('a start');\nconst b = require('./b');\nconsole.log('a sees b', JSON.stringify(b));\nmodule.exports = { name: 'a' };\n",
        )
        .file(
            "b.js",
            "console.log('b start');\nconst a = require('./a');\nconsole.log('b sees a', JSON.stringify(a));\nmodule.exports = { name: 'b' };\n",
        );

    let code = fixture.bundle("a.js", RuntimeMode::CycleSafe).unwrap();
    if let Some(output) = fixture.run(&code) {
        assert_eq!(
            stdout_of(&output),
            "a start\nb start\nb sees a {}\na sees b {\"name\":\"b\"}\n"
        );
    }
}

#[test]
fn test_bundle_defines_no_globals() {
    let fixture = Fixture::new();
    fixture.file("main.js", "var leaked = 1;\n");

    let mut code = fixture.bundle("main.js", RuntimeMode::Reentrant).unwrap();
    code.push_str(
        "\nconsole.log(typeof leaked, typeof __bindle_require__, typeof __bindle_modules__);\n",
    );
    if let Some(output) = fixture.run(&code) {
        assert_eq!(stdout_of(&output), "undefined undefined undefined\n");
    }
}

#[test]
fn test_missing_file_aborts_without_output() {
    let fixture = Fixture::new();
    fixture.file("main.js", "require('./present');\nrequire('./absent');\n");
    fixture.file("present.js", "");

    let output = fixture.root().join("dist/bundle.js");
    let err = BundleOrchestrator::new(Config::default())
        .bundle_to_file(&fixture.root().join("main.js"), &output)
        .unwrap_err();
    assert!(!output.exists());

    let bundle_err = err.downcast_ref::<BundleError>().unwrap();
    assert!(matches!(bundle_err, BundleError::Resolution { .. }));

    let root = fixture.root().display().to_string();
    insta::with_settings!({filters => vec![(root.as_str(), "[ROOT]")]}, {
        insta::assert_snapshot!("missing_file_error", bundle_err.to_string());
    });
}

#[test]
fn test_non_literal_require_aborts() {
    let fixture = Fixture::new();
    fixture.file(
        "main.js",
        "const name = process.argv[2];\nmodule.exports = require(name);\n",
    );

    let err = bundle_error(fixture.bundle("main.js", RuntimeMode::Reentrant));
    let bundle_err = err.downcast_ref::<BundleError>().unwrap();
    assert!(matches!(bundle_err, BundleError::UnsupportedImport { .. }));

    let root = fixture.root().display().to_string();
    insta::with_settings!({filters => vec![(root.as_str(), "[ROOT]")]}, {
        insta::assert_snapshot!("non_literal_require_error", bundle_err.to_string());
    });
}

#[test]
fn test_parse_error_in_dependency_aborts() {
    let fixture = Fixture::new();
    fixture
        .file("main.js", "require('./broken');\n")
        .file("broken.js", "module.exports = {\n");

    let err = bundle_error(fixture.bundle("main.js", RuntimeMode::Reentrant));
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::Parse { .. })
    ));
}
