//! Structured-record fan-out to synchronous plugins, asynchronous plugins,
//! and the MQTT sink.
//!
//! The sink set is immutable after startup (see `growatt_core::plugin`); no
//! locking is required to read it.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use growatt_core::{AsyncPlugin, Record, SyncPlugin};
use thiserror::Error;

/// Narrow interface the MQTT sink implements, mirroring the source's
/// `send_to_mqtt(data, conf, log)` free function.
#[async_trait]
pub trait MqttSink: Send + Sync {
    /// Serializes `record` and publishes it to the configured topic.
    async fn publish(&self, record: &Record) -> Result<(), SinkError>;
}

/// Error raised by a sink. Always logged by [`Dispatch`], never propagated
/// to the session.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The MQTT client failed to publish.
    #[error("mqtt publish failed: {0}")]
    Mqtt(String),
}

/// Immutable set of sinks, constructed once at startup and shared by every
/// session.
pub struct Dispatch {
    sync_plugins: Vec<Arc<dyn SyncPlugin>>,
    async_plugins: Vec<Arc<dyn AsyncPlugin>>,
    mqtt: Option<Arc<dyn MqttSink>>,
}

impl Dispatch {
    /// Builds a dispatch sink set from the plugins constructed at startup
    /// (see `main`) and an optional MQTT publisher.
    #[must_use]
    pub fn new(
        sync_plugins: Vec<Arc<dyn SyncPlugin>>,
        async_plugins: Vec<Arc<dyn AsyncPlugin>>,
        mqtt: Option<Arc<dyn MqttSink>>,
    ) -> Self {
        Self { sync_plugins, async_plugins, mqtt }
    }

    /// Fans `record` out to every configured sink.
    ///
    /// Never blocks past enqueueing: synchronous plugins run on the shared
    /// `spawn_blocking` pool, asynchronous plugins and the MQTT publish run
    /// as independent tasks. A slow or failing sink never affects session
    /// forwarding.
    pub fn dispatch(&self, frame_bytes: Bytes, record: Record) {
        let record = Arc::new(record);

        for plugin in &self.sync_plugins {
            let plugin = Arc::clone(plugin);
            let frame_bytes = frame_bytes.clone();
            let record = Arc::clone(&record);
            tokio::task::spawn_blocking(move || plugin.data(&frame_bytes, &record));
        }

        for plugin in &self.async_plugins {
            let plugin = Arc::clone(plugin);
            let frame_bytes = frame_bytes.clone();
            let record = Arc::clone(&record);
            tokio::spawn(async move { plugin.data(&frame_bytes, &record).await });
        }

        if let Some(mqtt) = &self.mqtt {
            let mqtt = Arc::clone(mqtt);
            let record = Arc::clone(&record);
            tokio::spawn(async move {
                if let Err(err) = mqtt.publish(&record).await {
                    tracing::warn!(%err, "mqtt sink failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use growatt_core::Record;

    use super::*;

    struct CountingSyncPlugin(Arc<AtomicUsize>);

    impl SyncPlugin for CountingSyncPlugin {
        fn data(&self, _frame_bytes: &[u8], _record: &Record) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn sync_plugin_runs_on_dispatch() {
        let count = Arc::new(AtomicUsize::new(0));
        let plugin: Arc<dyn SyncPlugin> = Arc::new(CountingSyncPlugin(Arc::clone(&count)));
        let dispatch = Dispatch::new(vec![plugin], Vec::new(), None);

        let record = Record::new(
            "INV1".to_string(),
            "2024-01-01T00:00:00".to_string(),
            false,
            "DL1".to_string(),
            "INV1".to_string(),
        );
        dispatch.dispatch(Bytes::from_static(b"frame"), record);

        tokio::task::yield_now().await;
        // Give the spawn_blocking task a moment to run.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
