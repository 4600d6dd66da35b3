use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::domain::item::normalize_uri;

/// Server connections shared across a command invocation, one per server.
///
/// Keys are normalized URIs, so `http://Server:8080/tfs/` and
/// `http://server:8080/tfs` reuse the same connection.
pub struct ConnectionPool<C> {
    connections: Mutex<HashMap<String, Arc<C>>>,
}

impl<C> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }
}

impl<C> ConnectionPool<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the connection for `uri`, opening it with `connect` on first use.
    ///
    /// The lock is held while connecting so two callers never open the same
    /// server twice.
    pub fn get_or_connect<F>(&self, uri: &str, connect: F) -> anyhow::Result<Arc<C>>
    where
        F: FnOnce(&str) -> anyhow::Result<C>,
    {
        let key = normalize_uri(uri);
        let mut connections = self.connections();
        if let Some(existing) = connections.get(&key) {
            return Ok(existing.clone());
        }

        debug!("Opening connection to {}", key);
        let connection = Arc::new(connect(&key)?);
        connections.insert(key, connection.clone());
        Ok(connection)
    }

    pub fn len(&self) -> usize {
        self.connections().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached connection, returning how many were open.
    pub fn close_all(&self) -> usize {
        let mut connections = self.connections();
        let closed = connections.len();
        connections.clear();
        if closed > 0 {
            debug!("Closed {} connection(s)", closed);
        }
        closed
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<String, Arc<C>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
