//! Domain representations of the transactions the relayer submits.
//!
//! Shapes follow the IBC v1 message definitions; wire encoding is left
//! to the chain transport.

use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::channel::ChannelEnd;
use crate::client::{ClientState, ConsensusState};
use crate::commitment::CommitmentProofBytes;
use crate::connection;
use crate::header::Header;
use crate::height::Height;
use crate::identifier::{ChannelId, ClientId, ConnectionId, PortId};
use crate::packet::Packet;
use crate::proofs::Proofs;
use crate::signer::Signer;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateClient {
    pub client_state: ClientState,
    pub consensus_state: ConsensusState,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateClient {
    pub client_id: ClientId,
    pub header: Header,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnectionOpenInit {
    pub client_id: ClientId,
    pub counterparty: connection::Counterparty,
    pub version: String,
    pub delay_period: Duration,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnectionOpenTry {
    pub client_id: ClientId,
    pub client_state: Option<ClientState>,
    pub counterparty: connection::Counterparty,
    pub counterparty_versions: Vec<String>,
    pub proofs: Proofs,
    pub delay_period: Duration,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnectionOpenAck {
    pub connection_id: ConnectionId,
    pub counterparty_connection_id: ConnectionId,
    pub client_state: Option<ClientState>,
    pub proofs: Proofs,
    pub version: String,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgConnectionOpenConfirm {
    pub connection_id: ConnectionId,
    pub proofs: Proofs,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChannelOpenInit {
    pub port_id: PortId,
    pub channel: ChannelEnd,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChannelOpenTry {
    pub port_id: PortId,
    pub channel: ChannelEnd,
    pub counterparty_version: String,
    pub proofs: Proofs,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChannelOpenAck {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_channel_id: ChannelId,
    pub counterparty_version: String,
    pub proofs: Proofs,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgChannelOpenConfirm {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub proofs: Proofs,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRecvPacket {
    pub packet: Packet,
    pub proof: CommitmentProofBytes,
    pub proof_height: Height,
    pub signer: Signer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAcknowledgement {
    pub packet: Packet,
    pub acknowledgement: Vec<u8>,
    pub proof: CommitmentProofBytes,
    pub proof_height: Height,
    pub signer: Signer,
}
