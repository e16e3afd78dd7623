use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};
use zbus::Connection;

use super::MediaPlayer2PlayerProxy;
use crate::services::SourceError;
use crate::power::{PlayerId, PowerController, PowerError};

/// Forwards one player's playback status to the power controller
#[derive(Clone)]
pub struct PlayerMonitoring {
    connection: Connection,
    controller: PowerController,
}

impl PlayerMonitoring {
    /// Create a new player monitoring handler
    pub fn new(connection: Connection, controller: PowerController) -> Self {
        Self {
            connection,
            controller,
        }
    }

    /// Start monitoring a player's playback status
    pub fn start_monitoring(&self, player_id: PlayerId) -> JoinHandle<()> {
        let monitoring = self.clone();

        tokio::spawn(async move {
            if let Err(e) = monitoring.monitor_playback_status(player_id.clone()).await {
                warn!("Monitoring of player '{player_id}' failed: {e}");
            }
        })
    }

    #[instrument(skip(self), fields(bus_name = %player_id.bus_name()))]
    async fn monitor_playback_status(&self, player_id: PlayerId) -> Result<(), SourceError> {
        let player_proxy = MediaPlayer2PlayerProxy::builder(&self.connection)
            .destination(player_id.bus_name().to_string())?
            .build()
            .await?;

        let mut status_changes = player_proxy.receive_playback_status_changed().await;

        match player_proxy.playback_status().await {
            Ok(status) => self.forward(&player_id, &status).await,
            Err(e) => debug!("Could not read initial playback status: {e}"),
        }

        while let Some(signal) = status_changes.next().await {
            if let Ok(status) = signal.get().await {
                self.forward(&player_id, &status).await;
            }
        }

        debug!("Playback status updates stopped");
        Ok(())
    }

    async fn forward(&self, player_id: &PlayerId, status: &str) {
        match self.controller.report(player_id.clone(), status).await {
            Ok(_) => {}
            Err(e @ PowerError::InvalidStatus(_)) => warn!("Ignoring update: {e}"),
            Err(e) => error!("Status update for '{player_id}' failed: {e}"),
        }
    }
}
