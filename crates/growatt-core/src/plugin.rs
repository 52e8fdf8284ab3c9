//! Plugin trait surface. Discovery and instantiation are an external,
//! startup-time concern (see `growatt_server`'s plugin loader); the core
//! only defines the two capability sets and invokes them generically.

use async_trait::async_trait;

use crate::record::Record;

/// A plugin invoked off the reactor, on the session's shared worker pool.
///
/// Implementations must not block longer than is acceptable for a shared
/// pool slot — a slow plugin delays other sessions' callbacks, but never
/// stalls packet forwarding, since the pool handoff is independent of the
/// reader tasks.
pub trait SyncPlugin: Send + Sync {
    /// Receives the decrypted frame bytes alongside the structured record
    /// derived from them.
    fn data(&self, frame_bytes: &[u8], record: &Record);
}

/// A plugin invoked as an independent async task.
///
/// Failures must be handled internally or logged by the implementation;
/// the dispatch layer does not propagate them anywhere.
#[async_trait]
pub trait AsyncPlugin: Send + Sync {
    /// Receives the decrypted frame bytes alongside the structured record
    /// derived from them.
    async fn data(&self, frame_bytes: &[u8], record: &Record);
}
