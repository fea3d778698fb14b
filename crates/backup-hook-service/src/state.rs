//! Application state.

use std::sync::Arc;

use tokio::sync::Semaphore;

use backup_hook_core::HookConfig;

use crate::runner::{ProcessRunner, ScriptRunner};

/// Application state shared across handlers.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Hook configuration, including the shared secret.
    pub config: HookConfig,

    /// Runs the backup script.
    pub runner: Arc<dyn ScriptRunner>,

    /// One permit per concurrent script run, `max_concurrent_backups` total.
    ///
    /// Taken only after a request has been authenticated, so unsigned or
    /// slow clients never hold a slot.
    pub backup_slots: Arc<Semaphore>,
}

impl AppState {
    /// Create state that runs the script as a child process.
    #[must_use]
    pub fn new(config: HookConfig) -> Self {
        let runner = Arc::new(ProcessRunner::from_config(&config));

        tracing::info!(
            script_path = %config.script_path.display(),
            interpreter = ?config.interpreter,
            working_dir = %config.working_dir.display(),
            timeout_secs = config.script_timeout.as_secs(),
            "Backup script runner configured"
        );

        Self::with_runner(config, runner)
    }

    /// Script runs currently holding a slot.
    #[must_use]
    pub fn backups_in_flight(&self) -> usize {
        self.config
            .max_concurrent_backups
            .saturating_sub(self.backup_slots.available_permits())
    }

    /// Create state with a custom runner.
    #[must_use]
    pub fn with_runner(config: HookConfig, runner: Arc<dyn ScriptRunner>) -> Self {
        let permits = config.max_concurrent_backups.min(Semaphore::MAX_PERMITS);
        let backup_slots = Arc::new(Semaphore::new(permits));
        Self {
            config,
            runner,
            backup_slots,
        }
    }
}
