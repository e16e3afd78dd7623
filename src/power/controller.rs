use std::{io, sync::Arc};

use futures::Stream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, instrument, warn};

use super::{
    ControllerSnapshot, DebounceConfig, DebounceTimer, PlaybackStatus, PlayerId, PowerActions,
    PowerError, PowerState,
    machine::{PendingTimer, PowerStateMachine, Transition},
};

enum Command {
    Update {
        player: PlayerId,
        status: PlaybackStatus,
        reply: oneshot::Sender<Result<PowerState, PowerError>>,
    },
    Remove {
        player: PlayerId,
        reply: oneshot::Sender<Result<PowerState, PowerError>>,
    },
    TimerFired {
        generation: u64,
    },
    Snapshot {
        reply: oneshot::Sender<ControllerSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running power controller.
///
/// All state lives on a single worker task; handles only send commands to it,
/// so updates from any number of tasks or threads are applied one at a time
/// in arrival order. Cloning the handle is cheap. The worker stops once every
/// handle is dropped or [`PowerController::shutdown`] is called.
///
/// Activation and deactivation run on the worker. Updates arriving while one
/// is in flight wait for it to finish; a Playing update queued behind a
/// deactivation therefore re-activates right after it completes.
#[derive(Clone)]
pub struct PowerController {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PowerState>,
}

impl PowerController {
    /// Spawn a controller worker on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn(
        debounce: DebounceConfig,
        actions: Arc<dyn PowerActions>,
        timer: Box<dyn DebounceTimer>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PowerState::Idle);

        let worker = ControllerWorker {
            machine: PowerStateMachine::new(),
            debounce,
            actions,
            timer,
            commands: commands_tx.downgrade(),
            state: state_tx,
        };
        tokio::spawn(worker.run(commands_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    /// Apply a status update for a player.
    ///
    /// Resolves once the update, including any activation it triggered, has
    /// been carried out, and returns the resulting power state.
    ///
    /// # Errors
    /// - `PowerError::ActivationFailure` if switching on failed; the controller
    ///   still considers the resource active
    /// - `PowerError::InvariantViolation` if the update conflicts with the pending timer
    /// - `PowerError::ControllerClosed` if the controller has shut down
    pub async fn update(
        &self,
        player: PlayerId,
        status: PlaybackStatus,
    ) -> Result<PowerState, PowerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Update {
            player,
            status,
            reply,
        })?;
        response.await.map_err(|_| PowerError::ControllerClosed)?
    }

    /// Apply a status update given as a raw status string.
    ///
    /// # Errors
    /// Returns `PowerError::InvalidStatus` without touching the controller if the
    /// string is not a known status, otherwise the same errors as [`Self::update`].
    pub async fn report(&self, player: PlayerId, status: &str) -> Result<PowerState, PowerError> {
        let status = status.parse::<PlaybackStatus>()?;
        self.update(player, status).await
    }

    /// Forget a player that disappeared.
    ///
    /// A player that reported a status before is released like a stop.
    /// Removing a player that never reported anything changes nothing.
    ///
    /// # Errors
    /// Same as [`Self::update`].
    pub async fn remove_player(&self, player: PlayerId) -> Result<PowerState, PowerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Remove { player, reply })?;
        response.await.map_err(|_| PowerError::ControllerClosed)?
    }

    /// Current state, active players and pending timer.
    ///
    /// # Errors
    /// Returns `PowerError::ControllerClosed` if the controller has shut down
    pub async fn snapshot(&self) -> Result<ControllerSnapshot, PowerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        response.await.map_err(|_| PowerError::ControllerClosed)
    }

    /// Most recently published power state
    pub fn state(&self) -> PowerState {
        *self.state.borrow()
    }

    /// Watch power state changes.
    ///
    /// The stream yields the current state immediately, then every change.
    pub fn watch_state(&self) -> impl Stream<Item = PowerState> + Send + use<> {
        WatchStream::new(self.state.clone())
    }

    /// Cancel any pending timer and stop the worker.
    ///
    /// The resource is left as it is; no deactivation runs. Calling this on a
    /// controller that already stopped does nothing.
    pub async fn shutdown(&self) {
        let (reply, response) = oneshot::channel();
        if self.send(Command::Shutdown { reply }).is_ok() {
            let _ = response.await;
        }
    }

    fn send(&self, command: Command) -> Result<(), PowerError> {
        self.commands
            .send(command)
            .map_err(|_| PowerError::ControllerClosed)
    }
}

struct ControllerWorker {
    machine: PowerStateMachine,
    debounce: DebounceConfig,
    actions: Arc<dyn PowerActions>,
    timer: Box<dyn DebounceTimer>,
    commands: mpsc::WeakUnboundedSender<Command>,
    state: watch::Sender<PowerState>,
}

impl ControllerWorker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!(
            "Power controller started (pause delay {:?}, stop delay {:?})",
            self.debounce.pause, self.debounce.stop
        );

        while let Some(command) = commands.recv().await {
            match command {
                Command::Update {
                    player,
                    status,
                    reply,
                } => {
                    let result = self.handle_update(player, status).await;
                    let _ = reply.send(result);
                }
                Command::Remove { player, reply } => {
                    let result = self.handle_remove(player).await;
                    let _ = reply.send(result);
                }
                Command::TimerFired { generation } => self.handle_timer_fired(generation).await,
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.machine.snapshot());
                }
                Command::Shutdown { reply } => {
                    self.stop();
                    let _ = reply.send(());
                    return;
                }
            }
        }

        self.stop();
    }

    #[instrument(skip(self, player), fields(player = %player))]
    async fn handle_update(
        &mut self,
        player: PlayerId,
        status: PlaybackStatus,
    ) -> Result<PowerState, PowerError> {
        info!("Player '{player}' status: {status}");

        let transition = self.machine.apply(player, status).inspect_err(|e| {
            error!("Rejected status update: {e}");
        })?;

        self.carry_out(transition).await
    }

    #[instrument(skip(self, player), fields(player = %player))]
    async fn handle_remove(&mut self, player: PlayerId) -> Result<PowerState, PowerError> {
        info!("Player '{player}' removed");

        let transition = self.machine.remove(&player).inspect_err(|e| {
            error!("Rejected player removal: {e}");
        })?;

        self.carry_out(transition).await
    }

    async fn carry_out(&mut self, transition: Transition) -> Result<PowerState, PowerError> {
        if transition.cancel.is_some() {
            self.timer.cancel();
        }

        if let Some(pending) = transition.arm {
            if let Err(e) = self.arm(pending) {
                error!("Failed to start {} shutdown timer, powering off now: {e}", pending.kind);
                self.handle_timer_fired(pending.generation).await;
                return Ok(self.machine.state());
            }
        }

        self.publish();

        if transition.activate {
            if let Err(e) = self.actions.activate().await {
                let e = PowerError::ActivationFailure(e);
                error!("{e}");
                return Err(e);
            }
        }

        Ok(self.machine.state())
    }

    async fn handle_timer_fired(&mut self, generation: u64) {
        if !self.machine.timer_fired(generation) {
            debug!("Ignoring stale shutdown timer #{generation}");
            return;
        }

        let result = self.actions.deactivate().await;
        self.machine.deactivated();
        self.publish();

        if let Err(e) = result {
            error!("{}", PowerError::DeactivationFailure(e));
        }
    }

    fn arm(&mut self, pending: PendingTimer) -> io::Result<()> {
        let delay = self.debounce.delay(pending.kind);
        debug!(
            "Starting {} ({:?}) shutdown timer #{}",
            pending.kind, delay, pending.generation
        );

        let commands = self.commands.clone();
        let generation = pending.generation;
        self.timer.start(
            delay,
            Box::new(move || {
                if let Some(commands) = commands.upgrade() {
                    let _ = commands.send(Command::TimerFired { generation });
                }
            }),
        )
    }

    fn stop(&mut self) {
        if self.machine.clear_pending().is_some() {
            warn!("Discarding pending shutdown timer");
        }
        self.timer.cancel();
        debug!("Power controller stopped");
    }

    fn publish(&self) {
        let state = self.machine.state();
        self.state.send_if_modified(|current| {
            if *current != state {
                *current = state;
                true
            } else {
                false
            }
        });
    }
}
