use serde_derive::{Deserialize, Serialize};

use ibc_link_types::height::Height;
use ibc_link_types::identifier::{ChannelId, PortId};
use ibc_link_types::packet::Sequence;

/// Bounds an outbound-event query to events at or above `min_height`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPacketEventsRequest {
    pub min_height: Option<Height>,
}

impl QueryPacketEventsRequest {
    pub fn since(min_height: Option<Height>) -> Self {
        Self { min_height }
    }
}

/// Asks a destination chain which of `sequences` it has not yet received
/// on the given channel end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryUnreceivedPacketsRequest {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub packet_commitment_sequences: Vec<Sequence>,
}

/// Asks the chain that originally sent packets which of `sequences` it
/// has not yet seen an acknowledgment for (the packet commitment is
/// still outstanding).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryUnreceivedAcksRequest {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub packet_ack_sequences: Vec<Sequence>,
}
