//! Assembles the proof bundles each message variant of the handshakes
//! and the packet data plane requires, by querying the proving chain.
//!
//! All proofs are generated for a single `height`: the height of the
//! proving chain that the destination's light client has already been
//! taught. Callers are responsible for updating the destination client
//! to `height` before submitting anything carrying these proofs.

use ibc_link_types::client::ClientState;
use ibc_link_types::commitment::CommitmentProofBytes;
use ibc_link_types::height::Height;
use ibc_link_types::identifier::{ChannelId, ClientId, ConnectionId, PortId};
use ibc_link_types::packet::Packet;
use ibc_link_types::proofs::{ConsensusProof, Proofs};

use crate::chain::ChainHandle;
use crate::error::Error;

/// The proof-carrying connection-handshake messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionMsgType {
    OpenTry,
    OpenAck,
    OpenConfirm,
}

/// Builds the proofs for a connection-handshake message from `chain`
/// (the chain hosting the connection end being proven) at `height`.
///
/// Try and Ack additionally carry and prove the proving chain's client
/// state for the destination together with one of its consensus states,
/// so the destination can check the proving chain's view of it; Confirm
/// only needs the connection end itself.
pub async fn build_connection_proofs_and_client_state(
    chain: &dyn ChainHandle,
    msg_type: ConnectionMsgType,
    connection_id: &ConnectionId,
    client_id: &ClientId,
    height: Height,
) -> Result<(Option<ClientState>, Proofs), Error> {
    let object_proof = chain.proven_connection(connection_id, height).await?;

    let (client_state, client_proof, consensus_proof) = match msg_type {
        ConnectionMsgType::OpenTry | ConnectionMsgType::OpenAck => {
            let client_proof = chain.proven_client_state(client_id, height).await?;

            let client_state = chain.query_client_state(client_id).await?;
            let consensus_height = client_state.latest_height;
            let consensus_bytes = chain
                .proven_client_consensus(client_id, consensus_height, height)
                .await?;
            let consensus_proof = ConsensusProof::new(consensus_bytes, consensus_height)
                .map_err(Error::validation)?;

            (Some(client_state), Some(client_proof), Some(consensus_proof))
        }
        ConnectionMsgType::OpenConfirm => (None, None, None),
    };

    let proofs = Proofs::new(object_proof, client_proof, consensus_proof, height)
        .map_err(Error::validation)?;

    Ok((client_state, proofs))
}

/// Builds the proof of a channel end for the channel-handshake
/// messages, from the chain hosting it, at `height`.
pub async fn build_channel_proofs(
    chain: &dyn ChainHandle,
    port_id: &PortId,
    channel_id: &ChannelId,
    height: Height,
) -> Result<Proofs, Error> {
    let object_proof = chain.proven_channel(port_id, channel_id, height).await?;

    Proofs::new(object_proof, None, None, height).map_err(Error::validation)
}

/// Proof of the packet commitment on the sending chain, for a
/// `MsgRecvPacket` submitted with proof height `height`.
pub async fn build_packet_proof(
    chain: &dyn ChainHandle,
    packet: &Packet,
    height: Height,
) -> Result<CommitmentProofBytes, Error> {
    chain
        .proven_packet_commitment(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
            height,
        )
        .await
}

/// Proof of the written acknowledgment on the receiving chain, for a
/// `MsgAcknowledgement` submitted with proof height `height`.
///
/// Acknowledgments are stored under the coordinates the packet was
/// received at, i.e. its destination port and channel.
pub async fn build_ack_proof(
    chain: &dyn ChainHandle,
    packet: &Packet,
    height: Height,
) -> Result<CommitmentProofBytes, Error> {
    chain
        .proven_packet_acknowledgement(
            &packet.destination_port,
            &packet.destination_channel,
            packet.sequence,
            height,
        )
        .await
}
