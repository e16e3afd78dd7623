use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::ActionError;

/// Operations that switch the managed power resource on and off.
///
/// Both may take noticeable wall-clock time, for example when several outlets
/// are switched one after another. Calling either while the resource is
/// already in the target state must be harmless.
#[async_trait]
pub trait PowerActions: Send + Sync {
    /// Switch the resource on
    ///
    /// # Errors
    /// Returns `ActionError` if the device could not be reached or refused
    async fn activate(&self) -> Result<(), ActionError>;

    /// Switch the resource off
    ///
    /// # Errors
    /// Returns `ActionError` if the device could not be reached or refused
    async fn deactivate(&self) -> Result<(), ActionError>;
}

/// Actions that only log, for dry runs and setups without a controllable device
#[derive(Debug, Default, Clone)]
pub struct LogActions;

#[async_trait]
impl PowerActions for LogActions {
    async fn activate(&self) -> Result<(), ActionError> {
        info!("Enabling system power (dry run)");
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), ActionError> {
        info!("Disabling system power (dry run)");
        Ok(())
    }
}

/// A single external command run as one actuation step
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CommandStep {
    /// Program to execute, looked up on `PATH`.
    pub program: String,

    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandStep {
    /// Create a step from a program and its arguments
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    #[instrument(skip(self), fields(program = %self.program))]
    async fn run(&self) -> Result<(), ActionError> {
        debug!("Running {:?}", self.args);
        let status = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| ActionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::CommandFailed {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// Staged actuation through external commands.
///
/// Steps run in order with `step_delay` between consecutive steps, so that
/// e.g. a preamp is powered before the amplifiers behind it. The first failing
/// step aborts the sequence.
#[derive(Debug, Clone)]
pub struct CommandActions {
    activate: Vec<CommandStep>,
    deactivate: Vec<CommandStep>,
    step_delay: Duration,
}

impl CommandActions {
    /// Create command actions from activation and deactivation steps
    pub fn new(
        activate: Vec<CommandStep>,
        deactivate: Vec<CommandStep>,
        step_delay: Duration,
    ) -> Self {
        Self {
            activate,
            deactivate,
            step_delay,
        }
    }

    async fn run_steps(&self, steps: &[CommandStep]) -> Result<(), ActionError> {
        for (index, step) in steps.iter().enumerate() {
            if index > 0 && !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            step.run().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PowerActions for CommandActions {
    async fn activate(&self) -> Result<(), ActionError> {
        info!("Enabling system power");
        self.run_steps(&self.activate).await
    }

    async fn deactivate(&self) -> Result<(), ActionError> {
        info!("Disabling system power");
        self.run_steps(&self.deactivate).await
    }
}
