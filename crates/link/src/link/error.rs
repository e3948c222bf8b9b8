use flex_error::{define_error, TraceError};

use ibc_link_types::identifier::{ChainId, ClientId, ConnectionId};

use crate::error::Error as ChainError;

define_error! {
    LinkError {
        Config
            { reason: String }
            |e| { format!("configuration error: {}", e.reason) },

        ConfigIo
            [ TraceError<std::io::Error> ]
            |_| { "configuration I/O error" },

        ConfigDecode
            [ TraceError<serde_yaml::Error> ]
            |_| { "invalid configuration file" },

        ConfigEncode
            [ TraceError<serde_yaml::Error> ]
            |_| { "could not serialize configuration" },

        Chain
            { chain_id: ChainId }
            [ ChainError ]
            |e| { format!("error querying chain {}", e.chain_id) },

        MissingCounterpartyConnectionId
            { connection_id: ConnectionId }
            |e| {
                format!("connection {} has no counterparty connection id",
                    e.connection_id)
            },

        ConnectionNotOpen
            {
                connection_id: ConnectionId,
                chain_id: ChainId,
                state: String,
            }
            |e| {
                format!("connection {} on chain {} is in state {}, expected OPEN",
                    e.connection_id, e.chain_id, e.state)
            },

        ClientIdMismatch
            {
                client_id: ClientId,
                counterparty_client_id: ClientId,
            }
            |e| {
                format!("the client id {} does not match the counterparty's view {}",
                    e.client_id, e.counterparty_client_id)
            },

        ConnectionIdMismatch
            {
                connection_id: ConnectionId,
                counterparty_connection_id: ConnectionId,
            }
            |e| {
                format!("the connection id {} does not match the counterparty's view {}",
                    e.connection_id, e.counterparty_connection_id)
            },

        ChainIdMismatch
            {
                chain_id: ChainId,
                client_chain_id: ChainId,
            }
            |e| {
                format!("chain runs {} but the counterparty client tracks {}",
                    e.chain_id, e.client_chain_id)
            },

        ConsensusStateMismatch
            {
                chain_id: ChainId,
                client_id: ClientId,
                reason: String,
            }
            |e| {
                format!("consensus state stored on {} for client {} disagrees with the counterparty chain: {}",
                    e.chain_id, e.client_id, e.reason)
            },

        Handshake
            {
                step: &'static str,
                chain_id: ChainId,
            }
            [ ChainError ]
            |e| { format!("handshake step {} failed on chain {}", e.step, e.chain_id) },

        Relay
            { chain_id: ChainId }
            [ ChainError ]
            |e| { format!("relay transaction failed on chain {}", e.chain_id) },

        Cancelled
            |_| { "relay iteration cancelled" },
    }
}
