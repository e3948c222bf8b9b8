use std::sync::Arc;

use ibc_link_types::events::{SendPacket, WriteAcknowledgement};
use ibc_link_types::height::Height;
use ibc_link_types::identifier::{ClientId, ConnectionId};
use ibc_link_types::packet::Packet;

use crate::chain::requests::QueryPacketEventsRequest;
use crate::chain::ChainHandle;
use crate::error::Error;

/// A packet together with the source-chain height its send event was
/// committed at. The commit height drives the proof height chosen when
/// the packet is relayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacketWithMetadata {
    pub packet: Packet,
    pub height: Height,
}

impl From<SendPacket> for PacketWithMetadata {
    fn from(event: SendPacket) -> Self {
        Self {
            packet: event.packet,
            height: event.height,
        }
    }
}

/// An acknowledgment, the packet it answers, and the height of the
/// ack-write event on the acknowledging chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AckWithMetadata {
    pub acknowledgement: Vec<u8>,
    pub original_packet: Packet,
    pub height: Height,
}

impl From<WriteAcknowledgement> for AckWithMetadata {
    fn from(event: WriteAcknowledgement) -> Self {
        Self {
            acknowledgement: event.ack,
            original_packet: event.packet,
            height: event.height,
        }
    }
}

/// Options for the outbound-event queries of an endpoint.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOpts {
    pub min_height: Option<Height>,
}

/// One side of a link: a shared chain handle plus the ids of the light
/// client and connection this link operates through on that chain.
/// A view over on-chain state; owns nothing on-chain itself.
#[derive(Clone)]
pub struct Endpoint {
    pub chain: Arc<dyn ChainHandle>,
    pub client_id: ClientId,
    pub connection_id: ConnectionId,
}

impl Endpoint {
    pub fn new(
        chain: Arc<dyn ChainHandle>,
        client_id: ClientId,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            chain,
            client_id,
            connection_id,
        }
    }

    /// Packets sent from this endpoint's chain, tagged with their commit
    /// heights.
    pub async fn query_sent_packets(
        &self,
        opts: QueryOpts,
    ) -> Result<Vec<PacketWithMetadata>, Error> {
        let events = self
            .chain
            .query_sent_packets(QueryPacketEventsRequest::since(opts.min_height))
            .await?;

        Ok(events.into_iter().map(PacketWithMetadata::from).collect())
    }

    /// Acknowledgments written on this endpoint's chain, tagged with
    /// their write heights.
    pub async fn query_written_acks(&self, opts: QueryOpts) -> Result<Vec<AckWithMetadata>, Error> {
        let events = self
            .chain
            .query_written_acks(QueryPacketEventsRequest::since(opts.min_height))
            .await?;

        Ok(events.into_iter().map(AckWithMetadata::from).collect())
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("chain", &self.chain.id())
            .field("client_id", &self.client_id)
            .field("connection_id", &self.connection_id)
            .finish()
    }
}
