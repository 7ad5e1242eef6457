use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crowd_core::scanner::Scanner;
use crowd_core::Error;

fn create_test_package(dir: &Path, name: &str, deps: &[&str]) {
    let pkg_dir = dir.join(name);
    fs::create_dir_all(&pkg_dir).unwrap();

    let deps_str = deps
        .iter()
        .map(|d| format!("\"{}\": \"^1.0.0\"", d))
        .collect::<Vec<_>>()
        .join(", ");

    let manifest = format!(
        r#"{{
  "name": "{}",
  "version": "1.0.0",
  "scripts": {{ "build": "tsc", "test": "jest" }},
  "dependencies": {{ {} }}
}}"#,
        name, deps_str
    );

    fs::write(pkg_dir.join("package.json"), manifest).unwrap();
}

#[test]
fn test_scan_packages() {
    let temp_dir = TempDir::new().unwrap();
    let packages_dir = temp_dir.path().join("packages");
    fs::create_dir_all(&packages_dir).unwrap();

    create_test_package(&packages_dir, "pkg-b", &["pkg-a", "lodash"]);
    create_test_package(&packages_dir, "pkg-a", &[]);

    let packages = Scanner::new(&packages_dir).scan().unwrap();

    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].name, "pkg-a");
    assert_eq!(packages[1].name, "pkg-b");
    assert_eq!(packages[1].deps.as_slice(), ["pkg-a", "lodash"]);
    assert_eq!(packages[1].version.as_deref(), Some("1.0.0"));
    assert_eq!(packages[1].get_script("build"), Some("tsc"));
    assert_eq!(packages[1].path, packages_dir.join("pkg-b"));
}

#[test]
fn test_scan_as_map() {
    let temp_dir = TempDir::new().unwrap();
    let packages_dir = temp_dir.path().join("packages");
    fs::create_dir_all(&packages_dir).unwrap();

    create_test_package(&packages_dir, "pkg-a", &[]);
    create_test_package(&packages_dir, "pkg-b", &["pkg-a"]);

    let map = Scanner::new(&packages_dir).scan_as_map().unwrap();

    assert_eq!(map.len(), 2);
    assert!(map.contains_key("pkg-a"));
    assert!(map.contains_key("pkg-b"));
}

#[test]
fn test_dev_dependencies_are_included() {
    let temp_dir = TempDir::new().unwrap();
    let pkg_dir = temp_dir.path().join("app");
    fs::create_dir_all(&pkg_dir).unwrap();
    fs::write(
        pkg_dir.join("package.json"),
        r#"{
  "name": "app",
  "private": true,
  "dependencies": { "lib": "*" },
  "devDependencies": { "test-utils": "*" },
  "peerDependencies": { "react": "*" }
}"#,
    )
    .unwrap();

    let packages = Scanner::new(temp_dir.path()).scan().unwrap();

    assert_eq!(packages.len(), 1);
    assert!(packages[0].private);
    assert_eq!(packages[0].deps.as_slice(), ["lib", "test-utils"]);
}

#[test]
fn test_ignores_node_modules_and_hidden_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let packages_dir = temp_dir.path().join("packages");
    fs::create_dir_all(&packages_dir).unwrap();

    create_test_package(&packages_dir, "pkg-a", &[]);
    create_test_package(&packages_dir, "node_modules", &[]);
    create_test_package(&packages_dir, ".cache", &[]);
    create_test_package(&packages_dir.join("pkg-a").join("node_modules"), "left-pad", &[]);

    let packages = Scanner::new(&packages_dir)
        .with_max_depth(4)
        .scan()
        .unwrap();

    let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["pkg-a"]);
}

#[test]
fn test_max_depth_limits_search() {
    let temp_dir = TempDir::new().unwrap();
    let packages_dir = temp_dir.path().join("packages");
    create_test_package(&packages_dir, "pkg-a", &[]);
    create_test_package(&packages_dir.join("group"), "nested", &[]);

    let shallow = Scanner::new(&packages_dir).scan().unwrap();
    assert_eq!(shallow.len(), 1);

    let deep = Scanner::new(&packages_dir).with_max_depth(3).scan().unwrap();
    let names: Vec<&str> = deep.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["nested", "pkg-a"]);
}

#[test]
fn test_manifest_in_packages_dir_itself_is_not_a_package() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("package.json"), r#"{"name": "root"}"#).unwrap();
    create_test_package(temp_dir.path(), "pkg-a", &[]);

    let packages = Scanner::new(temp_dir.path()).scan().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "pkg-a");
}

#[test]
fn test_workspace_root_as_packages_dir() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("package.json"),
        r#"{"name": "monorepo", "private": true, "scripts": {"build": "true"}}"#,
    )
    .unwrap();
    create_test_package(temp_dir.path(), "pkg-a", &[]);
    create_test_package(temp_dir.path(), "pkg-b", &["pkg-a"]);

    let map = Scanner::new(temp_dir.path())
        .with_max_depth(1)
        .scan_as_map()
        .unwrap();

    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["pkg-a", "pkg-b"]);
    assert!(!map.contains_key("monorepo"));
}

#[test]
fn test_missing_packages_dir() {
    let temp_dir = TempDir::new().unwrap();
    let scanner = Scanner::new(temp_dir.path().join("does-not-exist"));
    assert!(scanner.scan().unwrap().is_empty());
}

#[test]
fn test_duplicate_package_names() {
    let temp_dir = TempDir::new().unwrap();
    for dir in ["first", "second"] {
        let pkg_dir = temp_dir.path().join(dir);
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(pkg_dir.join("package.json"), r#"{"name": "same"}"#).unwrap();
    }

    let err = Scanner::new(temp_dir.path()).scan_as_map().unwrap_err();
    match err {
        Error::DuplicatePackage { name, first, second } => {
            assert_eq!(name, "same");
            assert_ne!(first, second);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let pkg_dir = temp_dir.path().join("broken");
    fs::create_dir_all(&pkg_dir).unwrap();
    fs::write(pkg_dir.join("package.json"), "{ not json").unwrap();

    let err = Scanner::new(temp_dir.path()).scan().unwrap_err();
    assert!(matches!(err, Error::Json { .. }));
}

#[test]
fn test_nameless_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let pkg_dir = temp_dir.path().join("anonymous");
    fs::create_dir_all(&pkg_dir).unwrap();
    fs::write(pkg_dir.join("package.json"), r#"{"version": "1.0.0"}"#).unwrap();

    let err = Scanner::new(temp_dir.path()).scan().unwrap_err();
    assert!(matches!(err, Error::InvalidManifest { .. }));
}
