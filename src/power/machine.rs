use tracing::debug;

use super::{
    ControllerSnapshot, DebounceKind, PlaybackStatus, PlayerId, PowerError, PowerState,
    registry::PlayerRegistry,
};

/// Identity of an armed shutdown timer.
///
/// The generation increases with every arming, so a firing can be matched
/// against the timer that is currently pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    /// Which delay the timer was armed with
    pub kind: DebounceKind,
    /// Arming sequence number
    pub generation: u64,
}

/// Side effects requested by a status update
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Timer to cancel before anything else
    pub cancel: Option<PendingTimer>,
    /// Timer to arm
    pub arm: Option<PendingTimer>,
    /// Whether the resource must be switched on
    pub activate: bool,
}

impl Transition {
    /// Whether the update changed nothing outside the player set
    pub fn is_noop(&self) -> bool {
        self.cancel.is_none() && self.arm.is_none() && !self.activate
    }
}

/// Transition table aggregating player statuses into one power decision.
///
/// Performs no I/O. The owner carries out the returned [`Transition`] and
/// reports timer expiry back through [`PowerStateMachine::timer_fired`].
#[derive(Debug, Default)]
pub struct PowerStateMachine {
    state: PowerState,
    players: PlayerRegistry,
    pending: Option<PendingTimer>,
    next_generation: u64,
}

impl PowerStateMachine {
    /// Create a machine in the idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current power state
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Currently pending shutdown timer
    pub fn pending(&self) -> Option<PendingTimer> {
        self.pending
    }

    /// Point-in-time view of the machine
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            active_players: self.players.playing(),
            pending_timer: self.pending.map(|timer| timer.kind),
        }
    }

    /// Apply a status update for one player.
    ///
    /// The first Paused or Stopped heard from a player only records it; there
    /// is nothing playing to release.
    ///
    /// # Errors
    /// Returns `PowerError::InvariantViolation` when the update cannot be
    /// reconciled with the pending timer. Nothing is changed in that case.
    pub fn apply(
        &mut self,
        player: PlayerId,
        status: PlaybackStatus,
    ) -> Result<Transition, PowerError> {
        let previous = self.players.record(player.clone(), status);

        let result = match (status, previous) {
            (PlaybackStatus::Playing, _) => Ok(self.on_playing(&player)),
            (_, None) => {
                debug!("First report from '{player}' is {status}");
                Ok(Transition::default())
            }
            (PlaybackStatus::Paused, Some(_)) => self.on_paused(&player),
            (PlaybackStatus::Stopped, Some(_)) => self.on_stopped(&player),
        };

        if let (Err(_), Some(previous)) = (&result, previous) {
            self.players.record(player, previous);
        }
        result
    }

    /// Forget a player that went away.
    ///
    /// A known player is released like a stop. Removing a player that never
    /// reported a status changes nothing.
    ///
    /// # Errors
    /// Returns `PowerError::InvariantViolation` when the removal cannot be
    /// reconciled with the pending timer. The player is forgotten regardless.
    pub fn remove(&mut self, player: &PlayerId) -> Result<Transition, PowerError> {
        if self.players.forget(player).is_none() {
            debug!("Ignoring removal of unknown player '{player}'");
            return Ok(Transition::default());
        }

        debug!("Forgot player '{player}'");
        self.on_stopped(player)
    }

    /// Record that the timer with `generation` fired.
    ///
    /// Returns true if it is the pending timer, in which case the pending
    /// timer is cleared and the owner must deactivate. Stale firings return
    /// false and change nothing.
    pub fn timer_fired(&mut self, generation: u64) -> bool {
        match self.pending {
            Some(timer) if timer.generation == generation => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Record that deactivation has run
    pub fn deactivated(&mut self) {
        self.state = PowerState::Idle;
        self.pending = None;
    }

    /// Forget any pending timer, returning it so the owner can cancel it
    pub fn clear_pending(&mut self) -> Option<PendingTimer> {
        self.pending.take()
    }

    fn on_playing(&mut self, player: &PlayerId) -> Transition {
        debug!("Player '{player}' is active");

        let cancel = self.pending.take();
        if cancel.is_some() {
            debug!("Disabled shutdown timer");
        }

        let activate = self.state == PowerState::Idle;
        self.state = PowerState::Active;

        Transition {
            cancel,
            arm: None,
            activate,
        }
    }

    fn on_paused(&mut self, player: &PlayerId) -> Result<Transition, PowerError> {
        if self.players.any_playing() {
            return Ok(Transition::default());
        }

        match (self.state, self.pending) {
            (PowerState::Idle, _) | (PowerState::Paused, Some(_)) => Ok(Transition::default()),
            (PowerState::Active, None) => {
                let arm = self.arm(DebounceKind::Pause);
                self.state = PowerState::Paused;
                Ok(Transition {
                    arm: Some(arm),
                    ..Transition::default()
                })
            }
            (state, pending) => Err(PowerError::InvariantViolation(format!(
                "'{player}' paused while {state} with {} timer pending",
                pending.map_or("no".to_string(), |timer| timer.kind.to_string())
            ))),
        }
    }

    fn on_stopped(&mut self, player: &PlayerId) -> Result<Transition, PowerError> {
        if self.players.any_playing() {
            return Ok(Transition::default());
        }

        match (self.state, self.pending) {
            (PowerState::Idle, _) | (PowerState::Active, Some(_)) => Ok(Transition::default()),
            (PowerState::Paused, Some(long)) if long.kind == DebounceKind::Pause => {
                let arm = self.arm(DebounceKind::Stop);
                self.state = PowerState::Active;
                Ok(Transition {
                    cancel: Some(long),
                    arm: Some(arm),
                    activate: false,
                })
            }
            (PowerState::Active, None) => {
                let arm = self.arm(DebounceKind::Stop);
                Ok(Transition {
                    arm: Some(arm),
                    ..Transition::default()
                })
            }
            (state, pending) => Err(PowerError::InvariantViolation(format!(
                "'{player}' stopped while {state} with {} timer pending",
                pending.map_or("no".to_string(), |timer| timer.kind.to_string())
            ))),
        }
    }

    fn arm(&mut self, kind: DebounceKind) -> PendingTimer {
        self.next_generation += 1;
        let timer = PendingTimer {
            kind,
            generation: self.next_generation,
        };
        self.pending = Some(timer);
        timer
    }
}
