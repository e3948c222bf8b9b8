//! The error surface of a single chain client.

use flex_error::{define_error, TraceError};

use ibc_link_types::error::ValidationError;
use ibc_link_types::height::Height;
use ibc_link_types::identifier::{ChainId, ChannelId, ClientId, ConnectionId, PortId};
use ibc_link_types::packet::Sequence;

define_error! {
    Error {
        Rpc
            {
                chain_id: ChainId,
                detail: String,
            }
            |e| { format!("RPC error on chain {}: {}", e.chain_id, e.detail) },

        Decode
            { detail: String }
            |e| { format!("error decoding chain response: {}", e.detail) },

        MissingHeader
            {
                chain_id: ChainId,
                height: Height,
            }
            |e| { format!("chain {} has no header at height {}", e.chain_id, e.height) },

        MissingClientState
            { client_id: ClientId }
            |e| { format!("no client state found for client {}", e.client_id) },

        MissingConsensusState
            {
                client_id: ClientId,
                height: Height,
            }
            |e| {
                format!("client {} has no consensus state at height {}",
                    e.client_id, e.height)
            },

        MissingConnection
            { connection_id: ConnectionId }
            |e| { format!("connection {} does not exist", e.connection_id) },

        MissingChannel
            {
                port_id: PortId,
                channel_id: ChannelId,
            }
            |e| { format!("channel {}/{} does not exist", e.port_id, e.channel_id) },

        MissingCommitment
            {
                port_id: PortId,
                channel_id: ChannelId,
                sequence: Sequence,
            }
            |e| {
                format!("no packet commitment for {}/{} sequence {}",
                    e.port_id, e.channel_id, e.sequence)
            },

        PacketAlreadyReceived
            {
                port_id: PortId,
                channel_id: ChannelId,
                sequence: Sequence,
            }
            |e| {
                format!("packet {}/{} sequence {} was already received",
                    e.port_id, e.channel_id, e.sequence)
            },

        ProofNotVerifiable
            {
                client_id: ClientId,
                height: Height,
            }
            |e| {
                format!("client {} holds no consensus state at proof height {}; update the client first",
                    e.client_id, e.height)
            },

        TxRejected
            {
                chain_id: ChainId,
                detail: String,
            }
            |e| { format!("transaction rejected by chain {}: {}", e.chain_id, e.detail) },

        InsufficientFunds
            {
                chain_id: ChainId,
                detail: String,
            }
            |e| {
                format!("transaction on chain {} rejected for fees: {}",
                    e.chain_id, e.detail)
            },

        Validation
            [ TraceError<ValidationError> ]
            |_| { "invalid domain value" },

        Cancelled
            |_| { "operation cancelled" },
    }
}

impl Error {
    /// Whether the error reports on-chain state contradicting a protocol
    /// invariant rather than a transport failure.
    pub fn is_consensus(&self) -> bool {
        matches!(
            self.detail(),
            ErrorDetail::MissingHeader(_)
                | ErrorDetail::MissingClientState(_)
                | ErrorDetail::MissingConsensusState(_)
                | ErrorDetail::MissingConnection(_)
                | ErrorDetail::MissingChannel(_)
                | ErrorDetail::MissingCommitment(_)
                | ErrorDetail::ProofNotVerifiable(_)
        )
    }
}
