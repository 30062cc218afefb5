//! Process-scoped delivery service handed to every request handler.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::instrument;

use super::assembler::{JobAssembler, MAX_BLOCK_BYTES};
use super::error::Result;
use super::metrics::{DeliveryMetrics, MetricsSnapshot};
use super::poll::{DEFAULT_POLL_TIMEOUT, DevicePoll, DeviceReply, serve_poll};
use super::queue::JobReceipt;
use super::registry::{Client, ClientId, ClientRegistry, ClientStatus};
use crate::protocol::program::{encode_program, erase_all, mock_drawing};
use crate::protocol::{BoardGeometry, CommandTransport, HardwareTransport, SimulatorTransport};

/// Delivery tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryConfig {
    /// Largest block payload the device accepts, header included.
    pub max_block_bytes: usize,
    /// How long a poll waits for work before answering empty.
    pub poll_timeout: Duration,
    /// Board drawing area.
    pub board: BoardGeometry,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_block_bytes: MAX_BLOCK_BYTES,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            board: BoardGeometry::default(),
        }
    }
}

/// Snapshot of every client plus the delivery counters.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// Registered clients, sorted by id.
    pub clients: Vec<ClientStatus>,
    /// Delivery counters.
    pub metrics: MetricsSnapshot,
}

/// Registry, assembler and counters for one server process.
#[derive(Debug)]
pub struct DeliveryService {
    registry: ClientRegistry,
    assembler: JobAssembler,
    config: DeliveryConfig,
    metrics: DeliveryMetrics,
}

impl DeliveryService {
    /// Build a service; fails if the block limit cannot hold a header.
    pub fn new(config: DeliveryConfig) -> Result<Self> {
        Ok(Self {
            registry: ClientRegistry::new(),
            assembler: JobAssembler::new(config.max_block_bytes)?,
            config,
            metrics: DeliveryMetrics::default(),
        })
    }

    /// Convenience for sharing across handlers.
    pub fn shared(config: DeliveryConfig) -> Result<Arc<Self>> {
        Self::new(config).map(Arc::new)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Client registry.
    #[must_use]
    pub const fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Answer a device poll. Blocks the calling thread for up to the poll timeout.
    ///
    /// Devices self-register on first contact.
    #[instrument(level = "debug", skip(self), fields(client = %request.client_id()))]
    pub fn poll(&self, request: &DevicePoll) -> DeviceReply {
        let client = self.registry.get_or_create(request.client_id());
        serve_poll(
            &client,
            request.ack(),
            self.config.poll_timeout,
            &self.metrics,
        )
    }

    /// Enqueue a raw instruction stream for `id`, registering the client if needed.
    #[instrument(level = "debug", skip(self, raw), fields(bytes = raw.len()))]
    pub fn enqueue_job(&self, id: &ClientId, raw: &[u8]) -> Result<JobReceipt> {
        let client = self.registry.get_or_create(id);
        self.enqueue_to(&client, raw)
    }

    /// Enqueue a raw instruction stream for an already-resolved client.
    ///
    /// Chunking happens before the queue lock is taken; the append itself is
    /// one critical section.
    pub fn enqueue_to(&self, client: &Client, raw: &[u8]) -> Result<JobReceipt> {
        let job = self.assembler.assemble(raw)?;
        let receipt = client.queue().enqueue_job(&job);
        self.metrics.record_job(receipt.blocks);
        Ok(receipt)
    }

    /// Discard every pending block of a registered client.
    #[instrument(level = "debug", skip(self))]
    pub fn clear_queue(&self, id: &ClientId) -> Result<usize> {
        let client = self.registry.get(id)?;
        let cleared = client.queue().clear();
        self.metrics.record_cleared(cleared);
        Ok(cleared)
    }

    /// Enqueue the erase-all program for a registered client.
    #[instrument(level = "debug", skip(self))]
    pub fn erase(&self, id: &ClientId) -> Result<JobReceipt> {
        let client = self.registry.get(id)?;
        let raw = encode_program(&mut self.hardware(), erase_all(self.config.board));
        self.enqueue_to(&client, &raw)
    }

    /// Enqueue a mock drawing of the given size for a registered client.
    #[instrument(level = "debug", skip(self))]
    pub fn add_mock_data(&self, id: &ClientId, size: u32) -> Result<JobReceipt> {
        let client = self.registry.get(id)?;
        let raw = encode_program(&mut self.hardware(), mock_drawing(size));
        self.enqueue_to(&client, &raw)
    }

    /// Render a registered client's pending blocks through the simulator as SVG.
    pub fn preview(&self, id: &ClientId) -> Result<String> {
        let client = self.registry.get(id)?;
        let mut simulator = SimulatorTransport::new(self.config.board);
        for block in client.queue().pending() {
            simulator.replay(block.payload());
        }
        Ok(simulator.render().unwrap_or_default())
    }

    /// Status of every client and the delivery counters.
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            clients: self.registry.statuses(),
            metrics: self.metrics.snapshot(),
        }
    }

    fn hardware(&self) -> HardwareTransport {
        HardwareTransport::new(self.config.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryError;

    fn service() -> DeliveryService {
        DeliveryService::new(DeliveryConfig {
            poll_timeout: Duration::from_millis(20),
            ..DeliveryConfig::default()
        })
        .unwrap()
    }

    fn id(raw: &str) -> ClientId {
        ClientId::parse(raw).unwrap()
    }

    #[test]
    fn control_actions_require_registered_client() {
        let service = service();
        assert!(matches!(
            service.clear_queue(&id("nobody")),
            Err(DeliveryError::UnknownClient { .. })
        ));
        assert!(matches!(
            service.erase(&id("nobody")),
            Err(DeliveryError::UnknownClient { .. })
        ));
        assert!(service.registry().is_empty());
    }

    #[test]
    fn erase_and_mock_enqueue_jobs() {
        let service = service();
        service.poll(&DevicePoll::new(id("dev"), None));

        let erase = service.erase(&id("dev")).unwrap();
        assert_eq!(erase.first_block, 1);
        let mock = service.add_mock_data(&id("dev"), 1).unwrap();
        assert_eq!(mock.first_block, erase.last_block + 1);

        let status = service.status();
        assert_eq!(status.clients[0].queue_size, erase.blocks + mock.blocks);
        assert_eq!(status.metrics.jobs_enqueued, 2);
        assert_eq!(status.metrics.empty_polls, 1);
    }

    #[test]
    fn preview_renders_pending_strokes() {
        let service = service();
        service.poll(&DevicePoll::new(id("dev"), None));
        service.add_mock_data(&id("dev"), 0).unwrap();

        let svg = service.preview(&id("dev")).unwrap();
        assert_eq!(svg.matches("<line").count(), 1);
    }

    #[test]
    fn tiny_block_limit_is_rejected() {
        let result = DeliveryService::new(DeliveryConfig {
            max_block_bytes: 4,
            ..DeliveryConfig::default()
        });
        assert!(matches!(
            result,
            Err(DeliveryError::BlockLimitTooSmall { .. })
        ));
    }
}
