//! gmrender-resurrect transport state source.
//!
//! gmrender-resurrect announces transport changes of each renderer instance
//! with a `State` signal on the system bus, carrying the UPnP state string
//! (`PLAYING`, `PAUSED_PLAYBACK`, `STOPPED`, ...). Every instance is treated
//! as its own player, identified by the object path the signal came from.

use futures::StreamExt;
use tracing::{debug, error, info, instrument, warn};
use zbus::{
    Connection, MatchRule, Message, MessageStream, message,
    zvariant::{Structure, Value},
};

use crate::{
    power::{PlayerId, PowerController, PowerError},
    services::{BusKind, SourceError},
};

#[cfg(test)]
mod tests;

/// Interface emitting the `State` signal
pub const GMRENDER_INTERFACE: &str = "com.hzeller.gmedia_resurrect.v1.Transport";

const GMRENDER_PATH_PREFIX: &str = "/com/hzeller/gmedia_resurrect/";

/// Object path of the renderer instance with the given UUID
pub fn instance_path(uuid: &str) -> String {
    format!("{GMRENDER_PATH_PREFIX}{}", uuid.replace('-', "_"))
}

/// Match rule for `State` signals, optionally restricted to one instance
///
/// # Errors
/// Returns `SourceError::DbusError` if the UUID does not form a valid object path
pub fn state_match_rule(uuid: Option<&str>) -> Result<MatchRule<'static>, SourceError> {
    let builder = MatchRule::builder()
        .msg_type(message::Type::Signal)
        .interface(GMRENDER_INTERFACE)?
        .member("State")?;

    let builder = match uuid {
        Some(uuid) => builder.path(instance_path(uuid))?,
        None => builder,
    };

    Ok(builder.build())
}

/// Feeds gmrender-resurrect transport states into a power controller
#[derive(Clone)]
pub struct GmrenderSource {
    connection: Connection,
    controller: PowerController,
    uuid: Option<String>,
}

impl GmrenderSource {
    /// Connect to the given bus.
    ///
    /// With `uuid`, only the renderer instance with that UUID is followed.
    ///
    /// # Errors
    /// Returns `SourceError::InitializationFailed` if the bus connection fails
    pub async fn connect(
        bus: BusKind,
        controller: PowerController,
        uuid: Option<String>,
    ) -> Result<Self, SourceError> {
        info!("Connecting to {bus} bus");
        let connection = bus.connect().await?;
        Ok(Self::with_connection(connection, controller, uuid))
    }

    /// Create a source on an existing connection
    pub fn with_connection(
        connection: Connection,
        controller: PowerController,
        uuid: Option<String>,
    ) -> Self {
        Self {
            connection,
            controller,
            uuid,
        }
    }

    /// Follow `State` signals until the bus connection goes away.
    ///
    /// # Errors
    /// Returns `SourceError::InitializationFailed` if the signal subscription fails
    #[instrument(skip(self), fields(uuid = ?self.uuid))]
    pub async fn run(&self) -> Result<(), SourceError> {
        let rule = state_match_rule(self.uuid.as_deref())?;
        let mut signals = MessageStream::for_match_rule(rule, &self.connection, None)
            .await
            .map_err(|e| {
                SourceError::InitializationFailed(format!("Signal subscription failed: {e}"))
            })?;

        info!("Monitoring for D-Bus signals");
        while let Some(message) = signals.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    warn!("Failed to receive signal: {e}");
                    continue;
                }
            };

            let header = message.header();
            let Some(path) = header.path() else { continue };
            let player = PlayerId::from(path.as_str());

            let Some(state) = transport_state(&message) else {
                warn!("Ignoring State signal without a state from '{player}'");
                continue;
            };

            debug!("Got signal from '{player}': State = '{state}'");
            self.forward(player, &state).await;
        }

        debug!("Signal stream ended");
        Ok(())
    }

    async fn forward(&self, player: PlayerId, state: &str) {
        match self.controller.report(player, state).await {
            Ok(_) => {}
            Err(e @ PowerError::InvalidStatus(_)) => debug!("Ignoring transport state: {e}"),
            Err(e) => error!("Transport state update failed: {e}"),
        }
    }
}

/// First argument of a `State` signal
fn transport_state(message: &Message) -> Option<String> {
    let body = message.body();
    let args: Structure<'_> = body.deserialize().ok()?;

    match args.fields().first()? {
        Value::Str(state) => Some(state.to_string()),
        _ => None,
    }
}
