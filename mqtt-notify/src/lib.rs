//! # MQTT alert publishing
//!
//! One-shot MQTT publisher. Every alert opens a fresh connection to the broker,
//! publishes a single message to the configured topic and disconnects; no session is
//! kept between alerts. The whole exchange is bounded by a deadline so a dead broker
//! cannot stall the caller indefinitely.

use anyhow::{bail, Context};
use framediff::prelude::v1::*;
use log::*;
use rumqttc::{Client, Event, MqttOptions, Outgoing, QoS};
use std::time::{Duration, Instant};

/// Broker and message settings for [`MqttPublisher`].
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Username, only applied when a password is also present.
    pub username: Option<String>,
    /// Password, only applied when a username is also present.
    pub password: Option<String>,
    /// Topic the alert is published to.
    pub topic: String,
    /// Message payload published on each alert.
    pub payload: String,
    /// Upper bound on one whole connect-publish-disconnect exchange.
    pub op_timeout: Duration,
}

/// Publishes one fixed message per alert over MQTT.
pub struct MqttPublisher {
    config: MqttConfig,
}

impl MqttPublisher {
    /// Create a publisher for the given broker and message.
    pub fn new(config: MqttConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> MqttOptions {
        let id = format!("motion2mqtt-{}", std::process::id());
        let mut options = MqttOptions::new(id, &self.config.host, self.config.port);
        options.set_keep_alive(Duration::from_secs(60));

        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            options.set_credentials(username.clone(), password.clone());
        }

        options
    }
}

impl Publisher for MqttPublisher {
    fn publish(&mut self) -> Result<()> {
        let (client, mut connection) = Client::new(self.options(), 10);

        client
            .publish(
                self.config.topic.as_str(),
                QoS::AtMostOnce,
                false,
                self.config.payload.as_bytes(),
            )
            .context("failed to queue the mqtt publish")?;
        client
            .disconnect()
            .context("failed to queue the mqtt disconnect")?;

        // The sync client performs no IO until the connection is driven, so pump events
        // until the disconnect goes out or the deadline passes. Both requests are queued
        // already, which keeps this a single bounded drain.
        let deadline = Instant::now() + self.config.op_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                bail!("mqtt exchange with {} timed out", self.config.host);
            }

            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) => {
                    debug!(
                        "published {:?} to {} on {}:{}",
                        self.config.payload, self.config.topic, self.config.host, self.config.port
                    );
                    return Ok(());
                }
                Ok(Ok(event)) => trace!("mqtt event: {:?}", event),
                Ok(Err(e)) => {
                    return Err(e)
                        .with_context(|| format!("mqtt exchange with {} failed", self.config.host))
                }
                Err(_) => bail!("mqtt exchange with {} timed out", self.config.host),
            }
        }
    }
}
