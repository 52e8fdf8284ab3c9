//! Dual-index session registry: `peer_address → Session` and
//! `datalogger_serial → Session`, lookup only.
//!
//! The Server owns this registry exclusively. All mutation is serialized on
//! the accept/cleanup task; the control channel only ever takes snapshot
//! reads (see §5's "Shared resources").

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use crate::session::Session;

/// The process-wide session registry.
///
/// The registry holds only lookup references — it never owns or closes a
/// session's sockets. Closing is driven by the session itself; the registry
/// is told about it afterward via [`SessionRegistry::remove`].
#[derive(Default)]
pub struct SessionRegistry {
    by_peer: HashMap<SocketAddr, Arc<Session>>,
    by_serial: HashMap<String, Arc<Session>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a newly started session, indexed by its peer address.
    pub fn insert(&mut self, session: Arc<Session>) {
        self.by_peer.insert(session.peer_addr(), session);
    }

    /// Registers the secondary `datalogger_serial` index once a session
    /// learns its serial from its first valid frame.
    ///
    /// Called again with the same serial is a no-op overwrite; called with
    /// a serial already owned by a different session replaces that index
    /// entry (the old session's primary `by_peer` entry is untouched).
    pub fn index_by_serial(&mut self, serial: String, session: Arc<Session>) {
        self.by_serial.insert(serial, session);
    }

    /// Indexes `peer`'s already-registered session under `serial`, once it
    /// has been learned from that session's traffic. A no-op if `peer` is
    /// no longer present (the session drained before its serial was
    /// reported back).
    pub fn index_learned_serial(&mut self, peer: SocketAddr, serial: String) {
        if let Some(session) = self.by_peer.get(&peer).cloned() {
            self.by_serial.insert(serial, session);
        }
    }

    /// Removes a session from both indices. Called once, from the Server's
    /// `session_done` handler, after the session has fully drained.
    pub fn remove(&mut self, peer: SocketAddr) {
        if let Some(session) = self.by_peer.remove(&peer) {
            if let Some(serial) = session.datalogger_serial() {
                // Only remove the serial index if it still points at this
                // session — a later session with the same serial must not
                // be evicted by an older one's cleanup.
                if self.by_serial.get(&serial).is_some_and(|s| Arc::ptr_eq(s, &session)) {
                    self.by_serial.remove(&serial);
                }
            }
        }
    }

    /// Looks up a session by datalogger serial, for command injection.
    #[must_use]
    pub fn get_by_serial(&self, serial: &str) -> Option<Arc<Session>> {
        self.by_serial.get(serial).cloned()
    }

    /// Snapshot of `(peer, datalogger_serial, inverter_serial)` for every
    /// live session, for the control channel's `list` command.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<(SocketAddr, Option<String>, Option<String>)> {
        self.by_peer
            .values()
            .map(|s| (s.peer_addr(), s.datalogger_serial(), s.inverter_serial()))
            .collect()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.by_peer.len()
    }
}
