//! Device identities and the registry that maps them to queues.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::info;

use super::error::{DeliveryError, Result};
use super::queue::ClientQueue;

/// Longest accepted client identifier.
pub const MAX_CLIENT_ID_LEN: usize = 64;

/// Validated device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    /// Validate a raw identifier: non-empty, at most [`MAX_CLIENT_ID_LEN`]
    /// bytes, printable ASCII without whitespace.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(DeliveryError::malformed("client id is empty"));
        }
        if raw.len() > MAX_CLIENT_ID_LEN {
            return Err(DeliveryError::malformed(format!(
                "client id longer than {MAX_CLIENT_ID_LEN} bytes"
            )));
        }
        if !raw.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(DeliveryError::malformed(
                "client id must be printable ASCII without spaces",
            ));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One device known to the server.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    created_at: SystemTime,
    last_access: Mutex<SystemTime>,
    accesses: AtomicU64,
    queue: ClientQueue,
}

impl Client {
    fn new(id: ClientId) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            created_at: now,
            last_access: Mutex::new(now),
            accesses: AtomicU64::new(1),
            queue: ClientQueue::new(),
        }
    }

    fn record_access(&self) {
        self.accesses.fetch_add(1, Ordering::Relaxed);
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = SystemTime::now();
    }

    /// Device identifier.
    #[must_use]
    pub fn id(&self) -> &ClientId {
        &self.id
    }

    /// First contact.
    #[must_use]
    pub const fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Most recent registry lookup.
    #[must_use]
    pub fn last_access(&self) -> SystemTime {
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registry lookups, creation included.
    #[must_use]
    pub fn accesses(&self) -> u64 {
        self.accesses.load(Ordering::Relaxed)
    }

    /// Pending blocks for this device.
    #[must_use]
    pub const fn queue(&self) -> &ClientQueue {
        &self.queue
    }

    /// Serializable summary of this client.
    #[must_use]
    pub fn status(&self) -> ClientStatus {
        ClientStatus {
            id: self.id.to_string(),
            queue_size: self.queue.len(),
            created_ms: epoch_millis(self.created_at),
            last_access_ms: epoch_millis(self.last_access()),
            accesses: self.accesses(),
        }
    }
}

fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Status line for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStatus {
    /// Device identifier.
    pub id: String,
    /// Pending blocks.
    pub queue_size: usize,
    /// First contact, milliseconds since the Unix epoch.
    pub created_ms: u64,
    /// Latest lookup, milliseconds since the Unix epoch.
    pub last_access_ms: u64,
    /// Lookup count.
    pub accesses: u64,
}

/// Maps device ids to their clients.
///
/// The map lock is held only for lookup and insertion; each client's queue has
/// its own lock, so one device's long-poll never stalls another.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, Arc<Client>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `id`, registering it on first contact.
    pub fn get_or_create(&self, id: &ClientId) -> Arc<Client> {
        if let Ok(client) = self.get(id) {
            return client;
        }

        let mut clients = self
            .clients
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another request may have registered the id between the two locks.
        if let Some(client) = clients.get(id) {
            client.record_access();
            return Arc::clone(client);
        }
        info!(client = %id, "registering new client");
        let client = Arc::new(Client::new(id.clone()));
        clients.insert(id.clone(), Arc::clone(&client));
        client
    }

    /// Look up an existing client.
    pub fn get(&self, id: &ClientId) -> Result<Arc<Client>> {
        let clients = self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let client = clients
            .get(id)
            .ok_or_else(|| DeliveryError::UnknownClient {
                id: id.to_string(),
            })?;
        client.record_access();
        Ok(Arc::clone(client))
    }

    /// Every registered id, sorted.
    #[must_use]
    pub fn list_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Status of every registered client, sorted by id.
    ///
    /// Does not count as an access.
    #[must_use]
    pub fn statuses(&self) -> Vec<ClientStatus> {
        let mut statuses: Vec<ClientStatus> = self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|client| client.status())
            .collect();
        statuses.sort_by(|a, b| a.id.cmp(&b.id));
        statuses
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no client has registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ClientId {
        ClientId::parse(raw).unwrap()
    }

    #[test]
    fn client_id_validation() {
        assert!(ClientId::parse("IWBB-0042").is_ok());
        assert!(matches!(
            ClientId::parse(""),
            Err(DeliveryError::MalformedRequest { .. })
        ));
        assert!(ClientId::parse("has space").is_err());
        assert!(ClientId::parse(&"x".repeat(MAX_CLIENT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn get_or_create_returns_same_client() {
        let registry = ClientRegistry::new();
        let first = registry.get_or_create(&id("C1"));
        let second = registry.get_or_create(&id("C1"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(second.accesses(), 2);
    }

    #[test]
    fn get_unknown_client_is_not_found() {
        let registry = ClientRegistry::new();
        assert_eq!(
            registry.get(&id("ghost")).unwrap_err(),
            DeliveryError::UnknownClient {
                id: "ghost".to_owned()
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn list_ids_sorted() {
        let registry = ClientRegistry::new();
        registry.get_or_create(&id("b"));
        registry.get_or_create(&id("a"));
        assert_eq!(registry.list_ids(), vec![id("a"), id("b")]);
        let statuses = registry.statuses();
        assert_eq!(statuses[0].id, "a");
        assert_eq!(statuses[1].queue_size, 0);
    }
}
