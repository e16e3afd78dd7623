use std::{collections::HashMap, sync::Arc};

use futures::StreamExt;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, instrument};
use zbus::{Connection, fdo::DBusProxy};

use super::{
    MPRIS_BUS_PREFIX, MediaPlayer2PlayerProxy, MediaPlayer2Proxy, monitoring::PlayerMonitoring,
};
use crate::{
    power::{PlayerId, PowerController},
    services::{BusKind, SourceError},
};

/// A player found on the bus, as listed by [`MprisSource::list_players`]
#[derive(Debug, Clone)]
pub struct PlayerSummary {
    /// Bus name of the player
    pub id: PlayerId,
    /// Human-readable player name
    pub identity: String,
    /// Raw playback status as reported by the player
    pub status: String,
}

/// Feeds MPRIS players on a bus into a power controller.
///
/// Players already on the bus are picked up at start; later arrivals and
/// departures are followed through `NameOwnerChanged`. A player whose bus
/// name disappears is reported to the controller as removed.
#[derive(Clone)]
pub struct MprisSource {
    connection: Connection,
    controller: PowerController,
    monitoring: PlayerMonitoring,
    monitors: Arc<Mutex<HashMap<PlayerId, JoinHandle<()>>>>,
    ignored_patterns: Arc<Vec<String>>,
}

impl MprisSource {
    /// Connect to the given bus.
    ///
    /// Players whose bus name contains any of `ignored_players` are skipped.
    ///
    /// # Errors
    /// Returns `SourceError::InitializationFailed` if the bus connection fails
    pub async fn connect(
        bus: BusKind,
        controller: PowerController,
        ignored_players: Vec<String>,
    ) -> Result<Self, SourceError> {
        info!("Connecting to {bus} bus");
        let connection = bus.connect().await?;
        Ok(Self::with_connection(connection, controller, ignored_players))
    }

    /// Create a source on an existing connection
    pub fn with_connection(
        connection: Connection,
        controller: PowerController,
        ignored_players: Vec<String>,
    ) -> Self {
        let monitoring = PlayerMonitoring::new(connection.clone(), controller.clone());

        Self {
            connection,
            controller,
            monitoring,
            monitors: Arc::new(Mutex::new(HashMap::new())),
            ignored_patterns: Arc::new(ignored_players),
        }
    }

    /// Watch players until the bus connection goes away.
    ///
    /// # Errors
    /// Returns error if the signal subscription or the initial name listing fails
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), SourceError> {
        let dbus_proxy = DBusProxy::new(&self.connection)
            .await
            .map_err(|e| SourceError::InitializationFailed(format!("DBus proxy failed: {e}")))?;

        let mut name_owner_changed =
            dbus_proxy.receive_name_owner_changed().await.map_err(|e| {
                SourceError::InitializationFailed(format!("Signal subscription failed: {e}"))
            })?;

        self.discover_existing_players(&dbus_proxy).await?;

        info!("Monitoring for D-Bus signals");
        while let Some(signal) = name_owner_changed.next().await {
            let Ok(args) = signal.args() else { continue };

            if !args.name().starts_with(MPRIS_BUS_PREFIX) {
                continue;
            }

            let player_id = PlayerId::from_bus_name(args.name());

            if args.old_owner().is_some() {
                self.handle_player_removed(player_id.clone()).await;
            }

            if args.new_owner().is_some() {
                self.handle_player_added(player_id).await;
            }
        }

        debug!("Name monitoring ended");
        Ok(())
    }

    /// Stop monitoring all players
    pub async fn shutdown(&self) {
        let mut monitors = self.monitors.lock().await;
        for (_, handle) in monitors.drain() {
            handle.abort();
        }
    }

    /// List the MPRIS players currently on the bus with their status
    ///
    /// # Errors
    /// Returns error if the bus names cannot be listed
    pub async fn list_players(connection: &Connection) -> Result<Vec<PlayerSummary>, SourceError> {
        let dbus_proxy = DBusProxy::new(connection).await?;
        let names = dbus_proxy
            .list_names()
            .await
            .map_err(|e| SourceError::DbusError(e.into()))?;

        let mut players = Vec::new();
        for name in names.iter().filter(|n| n.starts_with(MPRIS_BUS_PREFIX)) {
            let player_id = PlayerId::from_bus_name(name);

            let base_proxy = MediaPlayer2Proxy::builder(connection)
                .destination(name.to_string())?
                .build()
                .await?;
            let player_proxy = MediaPlayer2PlayerProxy::builder(connection)
                .destination(name.to_string())?
                .build()
                .await?;

            let identity = base_proxy
                .identity()
                .await
                .unwrap_or_else(|_| player_id.bus_name().to_string());
            let status = player_proxy
                .playback_status()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());

            players.push(PlayerSummary {
                id: player_id,
                identity,
                status,
            });
        }

        Ok(players)
    }

    async fn discover_existing_players(&self, dbus_proxy: &DBusProxy<'_>) -> Result<(), SourceError> {
        info!("Fetching names from D-Bus");
        let names = dbus_proxy
            .list_names()
            .await
            .map_err(|e| SourceError::DbusError(e.into()))?;

        for name in names.iter().filter(|n| n.starts_with(MPRIS_BUS_PREFIX)) {
            self.handle_player_added(PlayerId::from_bus_name(name)).await;
        }

        Ok(())
    }

    #[instrument(skip(self), fields(bus_name = %player_id.bus_name()))]
    async fn handle_player_added(&self, player_id: PlayerId) {
        if self.should_ignore(player_id.bus_name()) {
            info!("Ignoring player based on configuration");
            return;
        }

        let mut monitors = self.monitors.lock().await;
        if monitors.contains_key(&player_id) {
            debug!("Player already monitored");
            return;
        }

        info!("Adding MPRIS player");
        let handle = self.monitoring.start_monitoring(player_id.clone());
        monitors.insert(player_id, handle);
    }

    #[instrument(skip(self), fields(bus_name = %player_id.bus_name()))]
    async fn handle_player_removed(&self, player_id: PlayerId) {
        let Some(handle) = self.monitors.lock().await.remove(&player_id) else {
            return;
        };

        info!("Removing MPRIS player");
        handle.abort();

        if let Err(e) = self.controller.remove_player(player_id).await {
            error!("Failed to remove player: {e}");
        }
    }

    fn should_ignore(&self, bus_name: &str) -> bool {
        self.ignored_patterns
            .iter()
            .any(|pattern| bus_name.contains(pattern))
    }
}
