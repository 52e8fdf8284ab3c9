//! MQTT sink implementation (`rumqttc`-backed), gated by `mqtt.enabled` in
//! configuration.
//!
//! Mirrors the source's `send_to_mqtt(data, conf, log)` free function:
//! serialize the record as JSON, publish to the configured topic, log
//! failures without propagating them.

use std::time::Duration;

use async_trait::async_trait;
use growatt_core::{Record, config::MqttConfig};
use rumqttc::{AsyncClient, MqttOptions, QoS};

use crate::dispatch::{MqttSink, SinkError};

/// MQTT publisher backed by a background `rumqttc` event loop task.
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
}

impl MqttPublisher {
    /// Connects to the broker described by `config` and spawns the
    /// background event-loop task that drives the connection.
    ///
    /// # Panics
    ///
    /// Never called when `config.enabled` is false; callers are expected to
    /// check that themselves (see `main`'s sink construction).
    #[must_use]
    pub fn connect(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new("growatt-proxy", config.server.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if config.auth {
            options.set_credentials(config.user.clone(), config.pass.clone());
        }

        let (client, mut event_loop) = AsyncClient::new(options, 10);
        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(_) => {},
                    Err(err) => {
                        tracing::warn!(%err, "mqtt event loop error, retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    },
                }
            }
        });

        Self { client, topic: config.topic.clone() }
    }
}

#[async_trait]
impl MqttSink for MqttPublisher {
    async fn publish(&self, record: &Record) -> Result<(), SinkError> {
        let payload = serde_json::to_vec(record).map_err(|e| SinkError::Mqtt(e.to_string()))?;
        self.client
            .publish(&self.topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| SinkError::Mqtt(e.to_string()))
    }
}
