//! Common test utilities for backup-hook integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use tokio::sync::Semaphore;

use backup_hook_core::{sign, HookConfig, Secret};
use backup_hook_service::{create_router, AppState, RunError, ScriptOutput, ScriptRunner};

/// Secret shared by the test server and the signing helpers.
pub const TEST_SECRET: &str = "test-callback-secret";

/// Script path handed to the runner.
pub const TEST_SCRIPT: &str = "docker-backup.sh";

/// How the spy answers.
#[derive(Debug, Clone)]
pub enum SpyOutcome {
    /// Exit 0 with this output.
    Succeed(&'static str),
    /// Exit non-zero with this output.
    Fail {
        /// Exit code.
        exit_code: i32,
        /// Output.
        output: &'static str,
    },
}

/// Runner that records every invocation instead of spawning a process.
#[derive(Debug)]
pub struct SpyRunner {
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    outcome: SpyOutcome,
}

impl SpyRunner {
    pub fn new(outcome: SpyOutcome) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome,
        }
    }

    /// Recorded `(script_path, args)` pairs, in call order.
    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ScriptRunner for SpyRunner {
    async fn run(&self, script_path: &Path, args: &[String]) -> Result<ScriptOutput, RunError> {
        self.calls
            .lock()
            .unwrap()
            .push((script_path.to_path_buf(), args.to_vec()));

        match &self.outcome {
            SpyOutcome::Succeed(output) => Ok(ScriptOutput {
                exit_code: Some(0),
                output: output.as_bytes().to_vec(),
            }),
            SpyOutcome::Fail { exit_code, output } => Err(RunError::Failed {
                exit_code: Some(*exit_code),
                output: output.as_bytes().to_vec(),
            }),
        }
    }
}

/// Runner that parks every run until the test opens the gate, tracking how
/// many runs overlap.
#[derive(Debug)]
pub struct GatedRunner {
    gate: Semaphore,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl GatedRunner {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Let `n` parked or future runs finish.
    pub fn open(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Poll until at least `n` runs have started.
    pub async fn wait_started(&self, n: usize) {
        while self.started() < n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl ScriptRunner for GatedRunner {
    async fn run(&self, _script_path: &Path, _args: &[String]) -> Result<ScriptOutput, RunError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let permit = self.gate.acquire().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        permit
            .map_err(|_| RunError::Io(std::io::Error::other("gate closed")))?
            .forget();

        Ok(ScriptOutput {
            exit_code: Some(0),
            output: b"done\n".to_vec(),
        })
    }
}

/// Sign `body` with the test secret.
pub fn test_signature(body: &[u8]) -> String {
    sign(body, &Secret::from(TEST_SECRET))
}

/// Base config used by every harness.
pub fn test_config() -> HookConfig {
    HookConfig::new(Secret::from(TEST_SECRET)).with_script_path(TEST_SCRIPT)
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The spy standing in for the backup script.
    pub runner: Arc<SpyRunner>,
}

impl TestHarness {
    /// Server in front of any runner.
    pub fn server_with_runner(config: HookConfig, runner: Arc<dyn ScriptRunner>) -> TestServer {
        TestServer::new(create_router(AppState::with_runner(config, runner)))
            .expect("Failed to create test server")
    }

    /// Harness whose script succeeds with a fixed output.
    pub fn new() -> Self {
        Self::with_outcome(SpyOutcome::Succeed("backup complete\n"))
    }

    /// Harness with a chosen spy outcome.
    pub fn with_outcome(outcome: SpyOutcome) -> Self {
        Self::with_config(test_config(), outcome)
    }

    /// Harness with a custom config.
    pub fn with_config(config: HookConfig, outcome: SpyOutcome) -> Self {
        let runner = Arc::new(SpyRunner::new(outcome));
        let state = AppState::with_runner(config, runner.clone());
        let server = TestServer::new(create_router(state)).expect("Failed to create test server");

        Self { server, runner }
    }

    /// `POST /backup` with `body` signed by the test secret.
    pub fn signed_post(&self, body: &[u8]) -> TestRequest {
        let signature = sign(body, &Secret::from(TEST_SECRET));
        self.post_with_signature(body, &signature)
    }

    /// `POST /backup` with an arbitrary signature header.
    pub fn post_with_signature(&self, body: &[u8], signature: &str) -> TestRequest {
        self.server
            .post("/backup")
            .bytes(Bytes::copy_from_slice(body))
            .add_header(
                signature_header(),
                HeaderValue::from_str(signature).expect("valid header value"),
            )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn signature_header() -> HeaderName {
    HeaderName::from_static("x-signature")
}
