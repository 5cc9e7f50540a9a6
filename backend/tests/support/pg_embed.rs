//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! One cluster serves the whole test binary; each test gets a temporary
//! database with the embedded migrations applied. When `PG_RUNTIME_DIR` or
//! `PG_DATA_DIR` is unset, bootstrap points both at a per-process directory
//! under the target directory.
//!
//! Set `SKIP_TEST_CLUSTER=1` where the cluster cannot start; suites then
//! print a skip marker instead of failing.

use std::path::PathBuf;
use std::time::Duration;

use library_backend::outbound::persistence::run_pending_migrations;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;
use uuid::Uuid;

const BOOTSTRAP_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 500;

fn pg_embed_dirs() -> Result<(PathBuf, PathBuf), std::io::Error> {
    let target = std::env::var_os("CARGO_TARGET_DIR").map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("target"),
        PathBuf::from,
    );
    let base = target
        .join("pg-embed")
        .join(format!("library-{}-{}", std::process::id(), Uuid::new_v4().simple()));
    let runtime_dir = base.join("install");
    let data_dir = base.join("data");
    std::fs::create_dir_all(&runtime_dir)?;
    std::fs::create_dir_all(&data_dir)?;
    Ok((runtime_dir, data_dir))
}

/// The cluster shared by every test in this binary.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let mut overrides: Vec<(&str, Option<String>)> = Vec::new();
    if std::env::var_os("PG_RUNTIME_DIR").is_none() || std::env::var_os("PG_DATA_DIR").is_none() {
        let (runtime_dir, data_dir) = pg_embed_dirs().map_err(|err| err.to_string())?;
        overrides.push((
            "PG_RUNTIME_DIR",
            Some(runtime_dir.to_string_lossy().into_owned()),
        ));
        overrides.push(("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())));
    }
    let _env = env_lock::lock_env(overrides);

    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) if attempt < BOOTSTRAP_ATTEMPTS => {
                eprintln!("pg-embed: bootstrap attempt {attempt} failed, retrying: {err:?}");
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)));
                attempt += 1;
            }
            Err(err) => return Err(format!("{err:?}")),
        }
    }
}

/// A fresh database with every migration applied.
pub fn migrated_database(runtime: &Runtime) -> Result<TemporaryDatabase, String> {
    let name = format!("library_test_{}", Uuid::new_v4().simple());
    let database = shared_cluster()?
        .temporary_database(name.as_str())
        .map_err(|err| format!("create database: {err:?}"))?;
    runtime
        .block_on(run_pending_migrations(database.url().to_owned()))
        .map_err(|err| err.to_string())?;
    Ok(database)
}

fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip when `SKIP_TEST_CLUSTER` is truthy, otherwise fail loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
