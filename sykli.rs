//! Sykli CI pipeline for sample-app
//!
//! Run locally: sykli run
//! Or: cargo run --bin sykli --features sykli -- --emit | sykli run -

use sykli::{Condition, Pipeline, Template};

fn main() {
    let mut p = Pipeline::new();

    // === RESOURCES ===
    let src = p.dir(".");
    let cargo_registry = p.cache("cargo-registry");
    let cargo_git = p.cache("cargo-git");
    let target_cache = p.cache("target");

    // === TEMPLATE ===
    let rust = Template::new()
        .container("rust:1.85")
        .mount_dir(&src, "/src")
        .mount_cache(&cargo_registry, "/usr/local/cargo/registry")
        .mount_cache(&cargo_git, "/usr/local/cargo/git")
        .mount_cache(&target_cache, "/src/target")
        .workdir("/src");

    // === TASKS ===

    let _ = p
        .task("test")
        .from(&rust)
        .run("cargo test")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"]);

    let _ = p
        .task("lint")
        .from(&rust)
        .run("cargo clippy --all-targets -- -D warnings")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"]);

    let _ = p
        .task("fmt")
        .from(&rust)
        .run("cargo fmt -- --check")
        .inputs(&["**/*.rs"]);

    let _ = p
        .task("build")
        .from(&rust)
        .run("cargo build --release --bin sample-app")
        .inputs(&["**/*.rs", "Cargo.toml", "Cargo.lock"])
        .output("binary", "target/release/sample-app")
        .after(&["test", "lint", "fmt"]);

    // Boot the release binary, probe every endpoint, then check SIGTERM exits 0
    let _ = p
        .task("smoke-test")
        .from(&rust)
        .run(
            r#"#!/bin/bash
set -e

PORT=18000 ./target/release/sample-app > /tmp/sample-app.log 2>&1 &
APP_PID=$!
sleep 1

for path in / /health /ready /api/health/secrets /api/status; do
  curl -fsS "http://127.0.0.1:18000${path}" > /dev/null
done

curl -fsS http://127.0.0.1:18000/api/health/secrets | grep -q '"status":"degraded"'

kill -TERM "$APP_PID"
wait "$APP_PID" 2>/dev/null || STATUS=$?
if [ "${STATUS:-0}" != "0" ]; then
  echo "ERROR: sample-app exited with $STATUS after SIGTERM"
  cat /tmp/sample-app.log
  exit 1
fi
grep -q "Server closed" /tmp/sample-app.log

echo "Smoke test passed"
"#,
        )
        .input_from("build", "binary", "/src/target/release/sample-app")
        .when_cond(Condition::event("push").or(Condition::negate(Condition::branch("*"))))
        .timeout(120);

    p.emit();
}
