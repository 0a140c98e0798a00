// Inbound command dispatch and playback control actions
//
// Dispatch runs on the transport event-loop task, concurrently with the
// publish loop. Control actions are fire-and-forget: failures are
// logged, never retried, and never surface to the polling side.

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::process::Command;

use crate::data::{CommandMessage, MediaCommand};

/// Error raised when a control action cannot be carried out
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("no control command configured")]
    NotConfigured,

    #[error("failed to run control command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("control command exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("control command timed out after {0:?}")]
    Timeout(Duration),
}

/// Executes a named playback action against the OS.
///
/// Implementations are the platform boundary; the dispatcher never
/// cares how an action is carried out.
#[async_trait]
pub trait ControlActionExecutor: Send + Sync {
    async fn execute(&self, command: MediaCommand) -> Result<(), ControlError>;
}

/// Executor that invokes a configurable platform control command with
/// the action name appended as the last argument.
pub struct ScriptActionExecutor {
    command: Vec<String>,
    timeout: Duration,
}

impl ScriptActionExecutor {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        debug!("Creating ScriptActionExecutor: {:?}", command);
        Self { command, timeout }
    }
}

#[async_trait]
impl ControlActionExecutor for ScriptActionExecutor {
    async fn execute(&self, command: MediaCommand) -> Result<(), ControlError> {
        let action = match command.action_name() {
            Some(action) => action,
            None => {
                // Unknown never reaches the executor via the dispatcher
                warn!("Refusing to execute unknown control action");
                return Ok(());
            }
        };

        let program = self.command.first().ok_or(ControlError::NotConfigured)?;

        let mut cmd = Command::new(program);
        cmd.args(&self.command[1..]);
        cmd.arg(action);
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ControlError::Timeout(self.timeout))?
            .map_err(ControlError::Spawn)?;

        if !output.status.success() {
            return Err(ControlError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("Control action '{}' completed", action);
        Ok(())
    }
}

/// Maps inbound command messages to control actions.
///
/// Unparseable payloads and unrecognized actions are logged and
/// dropped; recognized actions are spawned so message delivery is
/// never blocked by a slow platform command.
pub struct CommandDispatcher {
    executor: Arc<dyn ControlActionExecutor>,
}

impl CommandDispatcher {
    pub fn new(executor: Arc<dyn ControlActionExecutor>) -> Self {
        Self { executor }
    }

    /// Handle one raw message from the command topic
    pub fn dispatch(&self, topic: &str, payload: &[u8]) {
        let message: CommandMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    "Dropping unparseable command on '{}': {} ({})",
                    topic,
                    e,
                    String::from_utf8_lossy(payload)
                );
                return;
            }
        };

        if message.action == MediaCommand::Unknown {
            warn!(
                "Dropping unrecognized command action on '{}': {}",
                topic,
                String::from_utf8_lossy(payload)
            );
            return;
        }

        info!("Dispatching control action '{}'", message.action);

        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            if let Err(e) = executor.execute(message.action).await {
                warn!("Control action '{}' failed: {}", message.action, e);
            }
        });
    }
}
