use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::height::Height;
use crate::packet::Packet;

/// A packet was committed for sending; emitted on the source chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPacket {
    pub packet: Packet,
    pub height: Height,
}

/// A packet was received; emitted on the destination chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivePacket {
    pub packet: Packet,
    pub height: Height,
}

/// An acknowledgment was written for a received packet; emitted on the
/// destination chain alongside [`ReceivePacket`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAcknowledgement {
    pub packet: Packet,
    pub ack: Vec<u8>,
    pub height: Height,
}

/// An acknowledgment was consumed on the original sending chain,
/// releasing the packet commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgePacket {
    pub packet: Packet,
    pub height: Height,
}

/// The transaction-log events the relay pipeline consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IbcEvent {
    SendPacket(SendPacket),
    ReceivePacket(ReceivePacket),
    WriteAcknowledgement(WriteAcknowledgement),
    AcknowledgePacket(AcknowledgePacket),
}

impl IbcEvent {
    pub fn height(&self) -> Height {
        match self {
            IbcEvent::SendPacket(ev) => ev.height,
            IbcEvent::ReceivePacket(ev) => ev.height,
            IbcEvent::WriteAcknowledgement(ev) => ev.height,
            IbcEvent::AcknowledgePacket(ev) => ev.height,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            IbcEvent::SendPacket(_) => "send_packet",
            IbcEvent::ReceivePacket(_) => "recv_packet",
            IbcEvent::WriteAcknowledgement(_) => "write_acknowledgement",
            IbcEvent::AcknowledgePacket(_) => "acknowledge_packet",
        }
    }
}

impl fmt::Display for IbcEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IbcEvent::SendPacket(ev) => write!(f, "send_packet({})", ev.packet),
            IbcEvent::ReceivePacket(ev) => write!(f, "recv_packet({})", ev.packet),
            IbcEvent::WriteAcknowledgement(ev) => {
                write!(f, "write_acknowledgement({})", ev.packet)
            }
            IbcEvent::AcknowledgePacket(ev) => write!(f, "acknowledge_packet({})", ev.packet),
        }
    }
}

/// Pulls the acknowledgments written by a batch of receive transactions
/// out of the emitted events, preserving emission order.
pub fn extract_write_acks(events: Vec<IbcEvent>) -> Vec<WriteAcknowledgement> {
    events
        .into_iter()
        .filter_map(|event| match event {
            IbcEvent::WriteAcknowledgement(ack) => Some(ack),
            _ => None,
        })
        .collect()
}
