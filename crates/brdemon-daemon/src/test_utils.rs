//! Test utilities for process-level tests
//!
//! Fake `dart`/`flutter` front ends are plain shell scripts; only available
//! on unix.

use std::fs;
use std::path::{Path, PathBuf};

/// Write a minimal `pubspec.yaml` into `dir`
pub fn write_pubspec(dir: &Path, flutter: bool) {
    fs::create_dir_all(dir).expect("create project dir");
    let content = if flutter {
        "name: fake_app\ndependencies:\n  flutter:\n    sdk: flutter\ndev_dependencies:\n  build_runner: ^2.4.0\n"
    } else {
        "name: fake_pkg\ndev_dependencies:\n  build_runner: ^2.4.0\n"
    };
    fs::write(dir.join("pubspec.yaml"), content).expect("write pubspec");
}

/// Write an executable shell script named `name` into `dir`
#[cfg(unix)]
pub fn write_fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("write fake tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    path
}

/// Write a fake watch launcher plus the worker it runs
///
/// The launcher runs `worker_body` as a foreground child (`sh worker.sh`) and
/// exits with the worker's status, mirroring how `flutter pub run` hosts a
/// Dart worker. A foreground child keeps its default SIGINT disposition, so
/// the worker can be interrupted on its own.
#[cfg(unix)]
pub fn write_fake_watch_tool(dir: &Path, name: &str, worker_body: &str) -> PathBuf {
    let worker = dir.join(format!("{}-worker.sh", name));
    fs::write(&worker, worker_body).expect("write fake worker");
    write_fake_tool(
        dir,
        name,
        &format!("sh '{}'\nexit $?\n", worker.display()),
    )
}

/// Worker that reports readiness, then idles until interrupted and exits 0
pub const GRACEFUL_WORKER: &str = "trap 'echo interrupted; exit 0' INT\n\
echo '[INFO] Starting Build'\n\
i=0\n\
while [ $i -lt 300 ]; do sleep 0.1; i=$((i+1)); done\n\
exit 0\n";

/// Worker that ignores SIGINT
pub const STUBBORN_WORKER: &str = "trap '' INT\n\
echo '[INFO] Starting Build'\n\
i=0\n\
while [ $i -lt 50 ]; do sleep 0.1; i=$((i+1)); done\n\
exit 0\n";

/// Worker that dies on its own after reporting readiness
pub const CRASHING_WORKER: &str = "echo '[INFO] Starting Build'\n\
echo '[SEVERE] Failed to build' >&2\n\
exit 78\n";
