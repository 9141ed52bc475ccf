//! Integration tests for locating the project build_runner runs in

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use brdemon_app::resolve::resolve_without_prompt;
use brdemon_app::ProjectRoots;
use brdemon_core::{infer_shell_command, ShellCommand};

fn create_package(path: &Path, flutter: bool) {
    fs::create_dir_all(path.join("lib")).unwrap();
    let sdk = if flutter {
        "  flutter:\n    sdk: flutter\n"
    } else {
        "  meta: ^1.9.0\n"
    };
    fs::write(
        path.join("pubspec.yaml"),
        format!("name: pkg\n\ndependencies:\n{}\ndev_dependencies:\n  build_runner: ^2.4.0\n", sdk),
    )
    .unwrap();
}

#[test]
fn test_active_file_inside_package_resolves_to_package() {
    let workspace = TempDir::new().unwrap();
    let pkg = workspace.path().join("packages/models");
    create_package(&pkg, false);
    let file = pkg.join("lib/user.dart");
    fs::write(&file, "class User {}\n").unwrap();

    let roots = ProjectRoots::new(&file, Some(workspace.path().to_path_buf()));
    let resolved = resolve_without_prompt(&roots).unwrap();

    assert_eq!(resolved, dunce::canonicalize(&pkg).unwrap());
    assert_eq!(roots.config_root(), resolved);
}

#[test]
fn test_outermost_package_under_workspace_wins() {
    let workspace = TempDir::new().unwrap();
    let outer = workspace.path().join("app");
    let inner = outer.join("example");
    create_package(&outer, true);
    create_package(&inner, true);
    fs::write(inner.join("lib/main.dart"), "void main() {}\n").unwrap();

    let roots = ProjectRoots::new(inner.join("lib/main.dart"), Some(workspace.path().to_path_buf()));

    assert_eq!(
        resolve_without_prompt(&roots).unwrap(),
        dunce::canonicalize(&outer).unwrap()
    );
}

#[test]
fn test_without_workspace_walks_upward() {
    let temp = TempDir::new().unwrap();
    create_package(temp.path(), false);
    let nested = temp.path().join("lib/src/deep");
    fs::create_dir_all(&nested).unwrap();

    let roots = ProjectRoots::new(&nested, None);

    assert_eq!(
        resolve_without_prompt(&roots).unwrap(),
        dunce::canonicalize(temp.path()).unwrap()
    );
}

#[test]
fn test_no_manifest_is_no_project() {
    let workspace = TempDir::new().unwrap();
    let roots = ProjectRoots::new(workspace.path(), Some(workspace.path().to_path_buf()));

    assert!(matches!(
        resolve_without_prompt(&roots),
        Err(brdemon_core::Error::NoProject { .. })
    ));
    assert_eq!(roots.config_root(), dunce::canonicalize(workspace.path()).unwrap());
}

#[test]
fn test_front_end_follows_manifest() {
    let temp = TempDir::new().unwrap();
    let dart_pkg = temp.path().join("dart_pkg");
    let flutter_pkg = temp.path().join("flutter_pkg");
    create_package(&dart_pkg, false);
    create_package(&flutter_pkg, true);

    assert_eq!(infer_shell_command(&dart_pkg), Some(ShellCommand::Dart));
    assert_eq!(infer_shell_command(&flutter_pkg), Some(ShellCommand::Flutter));
}
