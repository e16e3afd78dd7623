use std::collections::HashMap;

use super::{PlaybackStatus, PlayerId};

/// Last reported status of every player the controller has heard from.
///
/// A player stays known until it is removed, so a Stopped from a player that
/// never reported anything can be told apart from one that just paused.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, PlaybackStatus>,
}

impl PlayerRegistry {
    /// Record a player's status, returning the previous one if it was known
    pub fn record(&mut self, player: PlayerId, status: PlaybackStatus) -> Option<PlaybackStatus> {
        self.players.insert(player, status)
    }

    /// Forget a player, returning its last status if it was known
    pub fn forget(&mut self, player: &PlayerId) -> Option<PlaybackStatus> {
        self.players.remove(player)
    }

    /// Whether any known player is playing
    pub fn any_playing(&self) -> bool {
        self.players
            .values()
            .any(|status| *status == PlaybackStatus::Playing)
    }

    /// Playing players in a stable order
    pub fn playing(&self) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, status)| **status == PlaybackStatus::Playing)
            .map(|(player, _)| player.clone())
            .collect();
        players.sort();
        players
    }
}
