//! Device poll protocol.
//!
//! A device identifies itself, optionally reports the highest block it has
//! applied, and receives either the next pending block verbatim or the short
//! "nothing to do" sentinel. Waiting out the timeout is the steady state, not
//! an error.

use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info};

use super::block::{Block, BlockNumber};
use super::error::{DeliveryError, Result};
use super::metrics::DeliveryMetrics;
use super::registry::{Client, ClientId};

/// Body sent when no block became available; firmware treats any body under
/// six bytes as "poll again later".
pub const EMPTY_REPLY: &[u8] = b"OK";

/// Long-poll window used by the reference firmware setup.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Parsed device poll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePoll {
    client_id: ClientId,
    ack: Option<BlockNumber>,
}

impl DevicePoll {
    /// Build a poll from already-validated parts.
    #[must_use]
    pub const fn new(client_id: ClientId, ack: Option<BlockNumber>) -> Self {
        Self { client_id, ack }
    }

    /// Validate the raw query arguments of a poll.
    ///
    /// The client id is required. An absent or empty ack means "nothing
    /// applied yet"; anything else must be a non-negative integer.
    pub fn parse(client_id: Option<&str>, ack: Option<&str>) -> Result<Self> {
        let client_id = client_id.ok_or_else(|| DeliveryError::malformed("missing client id"))?;
        let client_id = ClientId::parse(client_id)?;

        let ack = match ack.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map(BlockNumber::new)
                    .map_err(|_| {
                        DeliveryError::malformed(format!("invalid block number {raw:?}"))
                    })?,
            ),
        };

        Ok(Self { client_id, ack })
    }

    /// Device identifier.
    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Highest block the device reports as applied.
    #[must_use]
    pub const fn ack(&self) -> Option<BlockNumber> {
        self.ack
    }
}

/// Answer to a device poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceReply {
    /// Next pending block, sent verbatim.
    Block(Block),
    /// Nothing became available within the poll window.
    Empty,
}

impl DeviceReply {
    /// Response body bytes.
    #[must_use]
    pub fn body(&self) -> Bytes {
        match self {
            Self::Block(block) => block.payload().clone(),
            Self::Empty => Bytes::from_static(EMPTY_REPLY),
        }
    }

    /// Delivered block number, if any.
    #[must_use]
    pub fn block_number(&self) -> Option<BlockNumber> {
        match self {
            Self::Block(block) => Some(block.number()),
            Self::Empty => None,
        }
    }
}

/// Process one poll against `client`: apply the ack, then wait for the head block.
///
/// The ack and the peek take the queue lock separately; delivery order is
/// still non-decreasing because the queue only ever loses its head.
pub fn serve_poll(
    client: &Client,
    ack: Option<BlockNumber>,
    timeout: Duration,
    metrics: &DeliveryMetrics,
) -> DeviceReply {
    if let Some(number) = ack {
        let removed = client.queue().acknowledge_up_to(number);
        metrics.record_acknowledged(removed);
    }

    let started = Instant::now();
    let reply = match client.queue().peek_next(timeout) {
        Ok(block) => {
            info!(
                client = %client.id(),
                block = %block.number(),
                bytes = block.len(),
                "delivering block"
            );
            DeviceReply::Block(block)
        }
        Err(DeliveryError::NoWork) => {
            debug!(client = %client.id(), "no work; sending empty reply");
            DeviceReply::Empty
        }
        Err(err) => {
            debug!(client = %client.id(), error = %err, "peek failed; sending empty reply");
            DeviceReply::Empty
        }
    };
    metrics.record_poll(matches!(reply, DeviceReply::Block(_)), started.elapsed());
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_missing_and_empty_ack() {
        let poll = DevicePoll::parse(Some("C1"), None).unwrap();
        assert_eq!(poll.client_id().as_str(), "C1");
        assert_eq!(poll.ack(), None);
        assert_eq!(DevicePoll::parse(Some("C1"), Some("")).unwrap().ack(), None);
        assert_eq!(
            DevicePoll::parse(Some("C1"), Some("12")).unwrap().ack(),
            Some(BlockNumber::new(12))
        );
    }

    #[test]
    fn parse_rejects_bad_arguments() {
        assert!(matches!(
            DevicePoll::parse(None, Some("1")),
            Err(DeliveryError::MalformedRequest { .. })
        ));
        assert!(matches!(
            DevicePoll::parse(Some("C1"), Some("-1")),
            Err(DeliveryError::MalformedRequest { .. })
        ));
        assert!(matches!(
            DevicePoll::parse(Some("C1"), Some("abc")),
            Err(DeliveryError::MalformedRequest { .. })
        ));
    }

    #[test]
    fn empty_reply_is_sentinel() {
        assert_eq!(DeviceReply::Empty.body().as_ref(), b"OK");
        assert!(DeviceReply::Empty.body().len() < 6);
        assert_eq!(DeviceReply::Empty.block_number(), None);
    }
}
