//! An in-memory chain for driving the link logic in tests.
//!
//! The mock keeps the full IBC store of one chain: clients with their
//! consensus states, connections, channels, packet commitments, receipts
//! and written acknowledgments. It allocates identifiers the way a
//! Cosmos SDK chain does (`07-tendermint-N`, `connection-N`,
//! `channel-N`), produces one block per broadcast transaction, and
//! accepts a proof only when its own light client for the proving chain
//! already stores a consensus state at the proof height. That last rule
//! is what makes the mock useful: a relayer that forgets to update the
//! destination client before submitting proofs fails here just as it
//! would against a real chain.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use ibc_link_types::channel::{self, ChannelEnd};
use ibc_link_types::client::{ClientState, ConsensusState};
use ibc_link_types::commitment::{CommitmentPrefix, CommitmentProofBytes, Hash};
use ibc_link_types::connection::{self, ConnectionEnd};
use ibc_link_types::events::{
    AcknowledgePacket, IbcEvent, ReceivePacket, SendPacket, WriteAcknowledgement,
};
use ibc_link_types::header::Header;
use ibc_link_types::height::Height;
use ibc_link_types::identifier::{ChainId, ChannelId, ClientId, ConnectionId, PortId};
use ibc_link_types::msgs::{
    MsgAcknowledgement, MsgChannelOpenAck, MsgChannelOpenConfirm, MsgChannelOpenInit,
    MsgChannelOpenTry, MsgConnectionOpenAck, MsgConnectionOpenConfirm, MsgConnectionOpenInit,
    MsgConnectionOpenTry, MsgCreateClient, MsgRecvPacket, MsgUpdateClient,
};
use ibc_link_types::packet::{Packet, Sequence};
use ibc_link_types::signer::Signer;
use ibc_link_types::timestamp::Timestamp;

use crate::chain::handle::ChainHandle;
use crate::chain::requests::{
    QueryPacketEventsRequest, QueryUnreceivedAcksRequest, QueryUnreceivedPacketsRequest,
};
use crate::error::Error;

/// Fixed genesis time so header timestamps are deterministic: block `h`
/// is stamped `GENESIS_TIME_SECONDS + h`.
const GENESIS_TIME_SECONDS: i64 = 1_600_000_000;

/// The acknowledgment the mock application writes for every received
/// packet (the ics20 success acknowledgment).
const MOCK_ACK: &[u8] = br#"{"result":"AQ=="}"#;

/// One broadcast transaction as recorded by the mock, for tests that
/// assert exact broadcast sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRecord {
    pub kind: &'static str,
    pub msg_count: usize,
}

#[derive(Clone, Debug)]
struct ClientRecord {
    client_state: ClientState,
    consensus_states: BTreeMap<Height, ConsensusState>,
}

#[derive(Default)]
struct ChainState {
    height: u64,
    client_counter: u64,
    connection_counter: u64,
    channel_counter: u64,
    clients: BTreeMap<ClientId, ClientRecord>,
    connections: BTreeMap<ConnectionId, ConnectionEnd>,
    channels: BTreeMap<(PortId, ChannelId), ChannelEnd>,
    next_sequence_send: BTreeMap<(PortId, ChannelId), Sequence>,
    commitments: BTreeSet<(PortId, ChannelId, Sequence)>,
    receipts: BTreeSet<(PortId, ChannelId, Sequence)>,
    send_events: Vec<SendPacket>,
    ack_events: Vec<WriteAcknowledgement>,
    tx_log: Vec<TxRecord>,
}

pub struct MockChain {
    chain_id: ChainId,
    prefix: CommitmentPrefix,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new(chain_id: ChainId, initial_height: u64) -> Self {
        Self {
            chain_id,
            prefix: CommitmentPrefix::from(b"ibc".to_vec()),
            state: Mutex::new(ChainState {
                height: initial_height,
                ..Default::default()
            }),
        }
    }

    fn revision(&self) -> u64 {
        self.chain_id.version()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn header_at(&self, height: u64) -> Header {
        Header {
            height: Height::new(self.revision(), height),
            time: Timestamp::from_seconds(GENESIS_TIME_SECONDS + height as i64),
            app_hash: Hash::new(format!("app:{}:{}", self.chain_id, height).into_bytes()),
            next_validators_hash: Hash::new(format!("vals:{}", self.chain_id).into_bytes()),
        }
    }

    /// Produces the block holding the transaction and records it;
    /// returns the inclusion height.
    fn commit_tx(&self, state: &mut ChainState, kind: &'static str, msg_count: usize) -> Height {
        state.height += 1;
        state.tx_log.push(TxRecord { kind, msg_count });
        Height::new(self.revision(), state.height)
    }

    fn make_proof(&self, path: String, height: Height) -> Result<CommitmentProofBytes, Error> {
        if height.revision_height > self.state().height {
            return Err(Error::missing_header(self.chain_id.clone(), height));
        }

        CommitmentProofBytes::try_from(format!("{}:{}@{}", self.chain_id, path, height).into_bytes())
            .map_err(Error::validation)
    }

    /// A proof is only acceptable when the local client for the proving
    /// chain stores a consensus state at exactly the claimed height.
    fn verify_proof_height(
        state: &ChainState,
        client_id: &ClientId,
        height: Height,
    ) -> Result<(), Error> {
        let client = state
            .clients
            .get(client_id)
            .ok_or_else(|| Error::missing_client_state(client_id.clone()))?;

        if !client.consensus_states.contains_key(&height) {
            return Err(Error::proof_not_verifiable(client_id.clone(), height));
        }

        Ok(())
    }

    fn connection_client(
        state: &ChainState,
        connection_id: &ConnectionId,
    ) -> Result<ClientId, Error> {
        state
            .connections
            .get(connection_id)
            .map(|end| end.client_id.clone())
            .ok_or_else(|| Error::missing_connection(connection_id.clone()))
    }

    fn channel_client(
        state: &ChainState,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<ClientId, Error> {
        let channel = state
            .channels
            .get(&(port_id.clone(), channel_id.clone()))
            .ok_or_else(|| Error::missing_channel(port_id.clone(), channel_id.clone()))?;

        let connection_id = channel
            .connection_id()
            .ok_or_else(|| Error::missing_channel(port_id.clone(), channel_id.clone()))?;

        Self::connection_client(state, connection_id)
    }

    // --- helpers for tests ------------------------------------------------

    /// Jumps the chain forward to `height` without any transactions.
    /// Heights only move forward; a lower target leaves the chain as is.
    pub fn advance_to(&self, height: u64) {
        let mut state = self.state();
        if height > state.height {
            state.height = height;
        }
    }

    /// The application-side action of committing a packet for sending on
    /// an open channel: allocates the next send sequence and records the
    /// commitment and send event at the current height.
    pub fn send_packet(
        &self,
        source_port: PortId,
        source_channel: ChannelId,
        data: Vec<u8>,
        timeout_height: Option<Height>,
        timeout_timestamp: Timestamp,
    ) -> Result<Packet, Error> {
        let mut state = self.state();
        let key = (source_port.clone(), source_channel.clone());

        let channel = state
            .channels
            .get(&key)
            .ok_or_else(|| Error::missing_channel(source_port.clone(), source_channel.clone()))?;

        if !channel.state_matches(channel::State::Open) {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                format!("channel {}/{} is not open", source_port, source_channel),
            ));
        }

        let counterparty = channel.counterparty();
        let destination_port = counterparty.port_id.clone();
        let destination_channel = counterparty
            .channel_id
            .clone()
            .ok_or_else(|| Error::missing_channel(source_port.clone(), source_channel.clone()))?;

        let sequence = state
            .next_sequence_send
            .get(&key)
            .copied()
            .unwrap_or_else(|| Sequence::from(1));
        state.next_sequence_send.insert(key.clone(), sequence.increment());

        let packet = Packet {
            sequence,
            source_port,
            source_channel,
            destination_port,
            destination_channel,
            data,
            timeout_height,
            timeout_timestamp,
        };

        let height = Height::new(self.revision(), state.height);
        state.commitments.insert(packet.ack_key());
        state.send_events.push(SendPacket {
            packet: packet.clone(),
            height,
        });

        Ok(packet)
    }

    /// Overwrites a stored connection end, for tests that need on-chain
    /// state contradicting the counterparty's records.
    pub fn inject_connection(&self, connection_id: ConnectionId, connection_end: ConnectionEnd) {
        self.state().connections.insert(connection_id, connection_end);
    }

    /// Overwrites a stored consensus state, for tests that need a chain
    /// whose view of its counterparty has diverged.
    pub fn inject_consensus_state(
        &self,
        client_id: &ClientId,
        height: Height,
        consensus_state: ConsensusState,
    ) -> Result<(), Error> {
        let mut state = self.state();
        let client = state
            .clients
            .get_mut(client_id)
            .ok_or_else(|| Error::missing_client_state(client_id.clone()))?;

        client.consensus_states.insert(height, consensus_state);
        Ok(())
    }

    pub fn tx_log(&self) -> Vec<TxRecord> {
        self.state().tx_log.clone()
    }

    pub fn tx_count(&self) -> usize {
        self.state().tx_log.len()
    }

    pub fn latest_chain_height(&self) -> Height {
        Height::new(self.revision(), self.state().height)
    }
}

#[async_trait]
impl ChainHandle for MockChain {
    fn id(&self) -> &ChainId {
        &self.chain_id
    }

    fn get_signer(&self) -> Result<Signer, Error> {
        Signer::from_str(&format!("cosmos1relayer{}", self.chain_id.version()))
            .map_err(Error::validation)
    }

    async fn query_latest_header(&self) -> Result<Header, Error> {
        let height = self.state().height;
        Ok(self.header_at(height))
    }

    async fn query_header(&self, height: Height) -> Result<Header, Error> {
        let state = self.state();
        if height.revision_number != self.revision() || height.revision_height > state.height {
            return Err(Error::missing_header(self.chain_id.clone(), height));
        }
        drop(state);

        Ok(self.header_at(height.revision_height))
    }

    async fn query_latest_height(&self) -> Result<Height, Error> {
        Ok(Height::new(self.revision(), self.state().height))
    }

    async fn wait_one_block(&self) -> Result<(), Error> {
        // an empty block; the real implementation polls the RPC status
        // endpoint until the reported height moves
        self.state().height += 1;
        Ok(())
    }

    async fn query_commitment_prefix(&self) -> Result<CommitmentPrefix, Error> {
        Ok(self.prefix.clone())
    }

    async fn query_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionEnd, Error> {
        self.state()
            .connections
            .get(connection_id)
            .cloned()
            .ok_or_else(|| Error::missing_connection(connection_id.clone()))
    }

    async fn query_channel(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<ChannelEnd, Error> {
        self.state()
            .channels
            .get(&(port_id.clone(), channel_id.clone()))
            .cloned()
            .ok_or_else(|| Error::missing_channel(port_id.clone(), channel_id.clone()))
    }

    async fn query_client_state(&self, client_id: &ClientId) -> Result<ClientState, Error> {
        self.state()
            .clients
            .get(client_id)
            .map(|record| record.client_state.clone())
            .ok_or_else(|| Error::missing_client_state(client_id.clone()))
    }

    async fn query_consensus_state(
        &self,
        client_id: &ClientId,
        height: Option<Height>,
    ) -> Result<ConsensusState, Error> {
        let state = self.state();
        let client = state
            .clients
            .get(client_id)
            .ok_or_else(|| Error::missing_client_state(client_id.clone()))?;

        match height {
            Some(height) => client
                .consensus_states
                .get(&height)
                .cloned()
                .ok_or_else(|| Error::missing_consensus_state(client_id.clone(), height)),
            None => client
                .consensus_states
                .last_key_value()
                .map(|(_, consensus)| consensus.clone())
                .ok_or_else(|| {
                    Error::missing_consensus_state(client_id.clone(), Height::default())
                }),
        }
    }

    async fn query_unreceived_packets(
        &self,
        request: QueryUnreceivedPacketsRequest,
    ) -> Result<Vec<Sequence>, Error> {
        let state = self.state();
        Ok(request
            .packet_commitment_sequences
            .into_iter()
            .filter(|sequence| {
                !state.receipts.contains(&(
                    request.port_id.clone(),
                    request.channel_id.clone(),
                    *sequence,
                ))
            })
            .collect())
    }

    async fn query_unreceived_acks(
        &self,
        request: QueryUnreceivedAcksRequest,
    ) -> Result<Vec<Sequence>, Error> {
        let state = self.state();
        Ok(request
            .packet_ack_sequences
            .into_iter()
            .filter(|sequence| {
                state.commitments.contains(&(
                    request.port_id.clone(),
                    request.channel_id.clone(),
                    *sequence,
                ))
            })
            .collect())
    }

    async fn query_sent_packets(
        &self,
        request: QueryPacketEventsRequest,
    ) -> Result<Vec<SendPacket>, Error> {
        let state = self.state();
        Ok(state
            .send_events
            .iter()
            .filter(|event| request.min_height.map_or(true, |min| event.height >= min))
            .cloned()
            .collect())
    }

    async fn query_written_acks(
        &self,
        request: QueryPacketEventsRequest,
    ) -> Result<Vec<WriteAcknowledgement>, Error> {
        let state = self.state();
        Ok(state
            .ack_events
            .iter()
            .filter(|event| request.min_height.map_or(true, |min| event.height >= min))
            .cloned()
            .collect())
    }

    async fn create_client(&self, msg: MsgCreateClient) -> Result<ClientId, Error> {
        let mut state = self.state();

        let client_id = ClientId::new(state.client_counter);
        state.client_counter += 1;

        let mut consensus_states = BTreeMap::new();
        consensus_states.insert(msg.client_state.latest_height, msg.consensus_state);

        state.clients.insert(
            client_id.clone(),
            ClientRecord {
                client_state: msg.client_state,
                consensus_states,
            },
        );

        self.commit_tx(&mut state, "create_client", 1);
        Ok(client_id)
    }

    async fn update_client(&self, msg: MsgUpdateClient) -> Result<(), Error> {
        let mut state = self.state();

        let client = state
            .clients
            .get_mut(&msg.client_id)
            .ok_or_else(|| Error::missing_client_state(msg.client_id.clone()))?;

        let header_height = msg.header.height;
        client
            .consensus_states
            .insert(header_height, ConsensusState::from_header(&msg.header));
        if header_height > client.client_state.latest_height {
            client.client_state.latest_height = header_height;
        }

        self.commit_tx(&mut state, "update_client", 1);
        Ok(())
    }

    async fn conn_open_init(&self, msg: MsgConnectionOpenInit) -> Result<ConnectionId, Error> {
        let mut state = self.state();

        if !state.clients.contains_key(&msg.client_id) {
            return Err(Error::missing_client_state(msg.client_id.clone()));
        }

        let connection_id = ConnectionId::new(state.connection_counter);
        state.connection_counter += 1;

        state.connections.insert(
            connection_id.clone(),
            ConnectionEnd::new(
                connection::State::Init,
                msg.client_id,
                msg.counterparty,
                vec![msg.version],
                msg.delay_period,
            ),
        );

        self.commit_tx(&mut state, "conn_open_init", 1);
        Ok(connection_id)
    }

    async fn conn_open_try(&self, msg: MsgConnectionOpenTry) -> Result<ConnectionId, Error> {
        let mut state = self.state();

        if !state.clients.contains_key(&msg.client_id) {
            return Err(Error::missing_client_state(msg.client_id.clone()));
        }
        Self::verify_proof_height(&state, &msg.client_id, msg.proofs.height())?;

        if msg.counterparty.connection_id.is_none() {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                "connection open try without counterparty connection id".to_string(),
            ));
        }

        let connection_id = ConnectionId::new(state.connection_counter);
        state.connection_counter += 1;

        state.connections.insert(
            connection_id.clone(),
            ConnectionEnd::new(
                connection::State::TryOpen,
                msg.client_id,
                msg.counterparty,
                msg.counterparty_versions,
                msg.delay_period,
            ),
        );

        self.commit_tx(&mut state, "conn_open_try", 1);
        Ok(connection_id)
    }

    async fn conn_open_ack(&self, msg: MsgConnectionOpenAck) -> Result<(), Error> {
        let mut state = self.state();

        let client_id = Self::connection_client(&state, &msg.connection_id)?;
        Self::verify_proof_height(&state, &client_id, msg.proofs.height())?;

        let connection = state
            .connections
            .get_mut(&msg.connection_id)
            .ok_or_else(|| Error::missing_connection(msg.connection_id.clone()))?;

        if !connection.state_matches(connection::State::Init) {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                format!(
                    "connection {} in state {} cannot be acknowledged",
                    msg.connection_id,
                    connection.state()
                ),
            ));
        }

        connection.counterparty.connection_id = Some(msg.counterparty_connection_id);
        connection.set_state(connection::State::Open);

        self.commit_tx(&mut state, "conn_open_ack", 1);
        Ok(())
    }

    async fn conn_open_confirm(&self, msg: MsgConnectionOpenConfirm) -> Result<(), Error> {
        let mut state = self.state();

        let client_id = Self::connection_client(&state, &msg.connection_id)?;
        Self::verify_proof_height(&state, &client_id, msg.proofs.height())?;

        let connection = state
            .connections
            .get_mut(&msg.connection_id)
            .ok_or_else(|| Error::missing_connection(msg.connection_id.clone()))?;

        if !connection.state_matches(connection::State::TryOpen) {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                format!(
                    "connection {} in state {} cannot be confirmed",
                    msg.connection_id,
                    connection.state()
                ),
            ));
        }

        connection.set_state(connection::State::Open);

        self.commit_tx(&mut state, "conn_open_confirm", 1);
        Ok(())
    }

    async fn chan_open_init(&self, msg: MsgChannelOpenInit) -> Result<ChannelId, Error> {
        let mut state = self.state();

        let connection_id = msg
            .channel
            .connection_id()
            .ok_or_else(|| {
                Error::tx_rejected(self.chain_id.clone(), "channel without connection hop".into())
            })?
            .clone();
        let connection = state
            .connections
            .get(&connection_id)
            .ok_or_else(|| Error::missing_connection(connection_id.clone()))?;

        if !connection.state_matches(connection::State::Open) {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                format!("connection {} is not open", connection_id),
            ));
        }

        let channel_id = ChannelId::new(state.channel_counter);
        state.channel_counter += 1;

        let key = (msg.port_id, channel_id.clone());
        let mut channel = msg.channel;
        channel.set_state(channel::State::Init);
        state.channels.insert(key.clone(), channel);
        state.next_sequence_send.insert(key, Sequence::from(1));

        self.commit_tx(&mut state, "chan_open_init", 1);
        Ok(channel_id)
    }

    async fn chan_open_try(&self, msg: MsgChannelOpenTry) -> Result<ChannelId, Error> {
        let mut state = self.state();

        let connection_id = msg
            .channel
            .connection_id()
            .ok_or_else(|| {
                Error::tx_rejected(self.chain_id.clone(), "channel without connection hop".into())
            })?
            .clone();
        let client_id = Self::connection_client(&state, &connection_id)?;
        Self::verify_proof_height(&state, &client_id, msg.proofs.height())?;

        if msg.channel.counterparty().channel_id.is_none() {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                "channel open try without counterparty channel id".to_string(),
            ));
        }

        let channel_id = ChannelId::new(state.channel_counter);
        state.channel_counter += 1;

        let key = (msg.port_id, channel_id.clone());
        let mut channel = msg.channel;
        channel.set_state(channel::State::TryOpen);
        state.channels.insert(key.clone(), channel);
        state.next_sequence_send.insert(key, Sequence::from(1));

        self.commit_tx(&mut state, "chan_open_try", 1);
        Ok(channel_id)
    }

    async fn chan_open_ack(&self, msg: MsgChannelOpenAck) -> Result<(), Error> {
        let mut state = self.state();

        let client_id = Self::channel_client(&state, &msg.port_id, &msg.channel_id)?;
        Self::verify_proof_height(&state, &client_id, msg.proofs.height())?;

        let channel = state
            .channels
            .get_mut(&(msg.port_id.clone(), msg.channel_id.clone()))
            .ok_or_else(|| Error::missing_channel(msg.port_id.clone(), msg.channel_id.clone()))?;

        if !channel.state_matches(channel::State::Init) {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                format!(
                    "channel {}/{} in state {} cannot be acknowledged",
                    msg.port_id,
                    msg.channel_id,
                    channel.state()
                ),
            ));
        }

        channel.remote.channel_id = Some(msg.counterparty_channel_id);
        channel.set_state(channel::State::Open);

        self.commit_tx(&mut state, "chan_open_ack", 1);
        Ok(())
    }

    async fn chan_open_confirm(&self, msg: MsgChannelOpenConfirm) -> Result<(), Error> {
        let mut state = self.state();

        let client_id = Self::channel_client(&state, &msg.port_id, &msg.channel_id)?;
        Self::verify_proof_height(&state, &client_id, msg.proofs.height())?;

        let channel = state
            .channels
            .get_mut(&(msg.port_id.clone(), msg.channel_id.clone()))
            .ok_or_else(|| Error::missing_channel(msg.port_id.clone(), msg.channel_id.clone()))?;

        if !channel.state_matches(channel::State::TryOpen) {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                format!(
                    "channel {}/{} in state {} cannot be confirmed",
                    msg.port_id,
                    msg.channel_id,
                    channel.state()
                ),
            ));
        }

        channel.set_state(channel::State::Open);

        self.commit_tx(&mut state, "chan_open_confirm", 1);
        Ok(())
    }

    async fn recv_packets(
        &self,
        msgs: Vec<MsgRecvPacket>,
    ) -> Result<(Vec<IbcEvent>, Height), Error> {
        if msgs.is_empty() {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                "empty receive batch".to_string(),
            ));
        }

        let mut state = self.state();

        // validate the whole batch before touching the store
        for msg in &msgs {
            let packet = &msg.packet;
            let client_id = Self::channel_client(
                &state,
                &packet.destination_port,
                &packet.destination_channel,
            )?;
            Self::verify_proof_height(&state, &client_id, msg.proof_height)?;

            if state.receipts.contains(&packet.receive_key()) {
                let (port_id, channel_id, sequence) = packet.receive_key();
                return Err(Error::packet_already_received(port_id, channel_id, sequence));
            }
        }

        let inclusion_height = self.commit_tx(&mut state, "recv_packets", msgs.len());

        let mut events = Vec::with_capacity(msgs.len() * 2);
        for msg in msgs {
            let packet = msg.packet;
            state.receipts.insert(packet.receive_key());

            let ack = WriteAcknowledgement {
                packet: packet.clone(),
                ack: MOCK_ACK.to_vec(),
                height: inclusion_height,
            };
            state.ack_events.push(ack.clone());

            events.push(IbcEvent::ReceivePacket(ReceivePacket {
                packet,
                height: inclusion_height,
            }));
            events.push(IbcEvent::WriteAcknowledgement(ack));
        }

        Ok((events, inclusion_height))
    }

    async fn ack_packets(
        &self,
        msgs: Vec<MsgAcknowledgement>,
    ) -> Result<(Vec<IbcEvent>, Height), Error> {
        if msgs.is_empty() {
            return Err(Error::tx_rejected(
                self.chain_id.clone(),
                "empty acknowledgment batch".to_string(),
            ));
        }

        let mut state = self.state();

        for msg in &msgs {
            let packet = &msg.packet;
            if !state.commitments.contains(&packet.ack_key()) {
                let (port_id, channel_id, sequence) = packet.ack_key();
                return Err(Error::missing_commitment(port_id, channel_id, sequence));
            }

            let client_id =
                Self::channel_client(&state, &packet.source_port, &packet.source_channel)?;
            Self::verify_proof_height(&state, &client_id, msg.proof_height)?;
        }

        let inclusion_height = self.commit_tx(&mut state, "ack_packets", msgs.len());

        let mut events = Vec::with_capacity(msgs.len());
        for msg in msgs {
            let packet = msg.packet;
            state.commitments.remove(&packet.ack_key());
            events.push(IbcEvent::AcknowledgePacket(AcknowledgePacket {
                packet,
                height: inclusion_height,
            }));
        }

        Ok((events, inclusion_height))
    }

    async fn proven_connection(
        &self,
        connection_id: &ConnectionId,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error> {
        if !self.state().connections.contains_key(connection_id) {
            return Err(Error::missing_connection(connection_id.clone()));
        }
        self.make_proof(format!("connections/{connection_id}"), height)
    }

    async fn proven_channel(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error> {
        if !self
            .state()
            .channels
            .contains_key(&(port_id.clone(), channel_id.clone()))
        {
            return Err(Error::missing_channel(port_id.clone(), channel_id.clone()));
        }
        self.make_proof(format!("channelEnds/ports/{port_id}/channels/{channel_id}"), height)
    }

    async fn proven_client_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error> {
        if !self.state().clients.contains_key(client_id) {
            return Err(Error::missing_client_state(client_id.clone()));
        }
        self.make_proof(format!("clients/{client_id}/clientState"), height)
    }

    async fn proven_client_consensus(
        &self,
        client_id: &ClientId,
        consensus_height: Height,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error> {
        {
            let state = self.state();
            let client = state
                .clients
                .get(client_id)
                .ok_or_else(|| Error::missing_client_state(client_id.clone()))?;
            if !client.consensus_states.contains_key(&consensus_height) {
                return Err(Error::missing_consensus_state(
                    client_id.clone(),
                    consensus_height,
                ));
            }
        }
        self.make_proof(
            format!("clients/{client_id}/consensusStates/{consensus_height}"),
            height,
        )
    }

    async fn proven_packet_commitment(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error> {
        if !self
            .state()
            .commitments
            .contains(&(port_id.clone(), channel_id.clone(), sequence))
        {
            return Err(Error::missing_commitment(
                port_id.clone(),
                channel_id.clone(),
                sequence,
            ));
        }
        self.make_proof(
            format!("commitments/ports/{port_id}/channels/{channel_id}/sequences/{sequence}"),
            height,
        )
    }

    async fn proven_packet_acknowledgement(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error> {
        let written = self
            .state()
            .ack_events
            .iter()
            .any(|event| event.packet.receive_key() == (port_id.clone(), channel_id.clone(), sequence));
        if !written {
            return Err(Error::missing_commitment(
                port_id.clone(),
                channel_id.clone(),
                sequence,
            ));
        }
        self.make_proof(
            format!("acks/ports/{port_id}/channels/{channel_id}/sequences/{sequence}"),
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> MockChain {
        MockChain::new(ChainId::new("mocka", 0), 10)
    }

    #[tokio::test]
    async fn headers_are_deterministic() {
        let chain = chain();
        let header = chain.query_latest_header().await.unwrap();
        let again = chain.query_header(header.height).await.unwrap();
        assert_eq!(header, again);

        // past headers stay available, future ones do not exist
        assert!(chain.query_header(Height::new(0, 1)).await.is_ok());
        assert!(chain.query_header(Height::new(0, 99)).await.is_err());
    }

    #[tokio::test]
    async fn blocks_advance_per_transaction() {
        let chain = chain();
        let before = chain.latest_chain_height();

        let remote = MockChain::new(ChainId::new("mockb", 0), 20);
        let header = remote.query_latest_header().await.unwrap();
        let msg = MsgCreateClient {
            client_state: ClientState {
                chain_id: remote.id().clone(),
                latest_height: header.height,
                trusting_period: std::time::Duration::from_secs(5_000),
                unbonding_period: std::time::Duration::from_secs(1_814_400),
            },
            consensus_state: ConsensusState::from_header(&header),
            signer: chain.get_signer().unwrap(),
        };

        let client_id = chain.create_client(msg).await.unwrap();
        assert_eq!(client_id.as_str(), "07-tendermint-0");
        assert_eq!(chain.latest_chain_height(), before.increment());
        assert_eq!(chain.tx_count(), 1);
    }

    #[tokio::test]
    async fn proofs_require_a_known_consensus_height() {
        let chain = chain();

        let remote = MockChain::new(ChainId::new("mockb", 0), 20);
        let header = remote.query_latest_header().await.unwrap();
        let client_id = chain
            .create_client(MsgCreateClient {
                client_state: ClientState {
                    chain_id: remote.id().clone(),
                    latest_height: header.height,
                    trusting_period: std::time::Duration::from_secs(5_000),
                    unbonding_period: std::time::Duration::from_secs(1_814_400),
                },
                consensus_state: ConsensusState::from_header(&header),
                signer: chain.get_signer().unwrap(),
            })
            .await
            .unwrap();

        let state = chain.state();
        assert!(MockChain::verify_proof_height(&state, &client_id, header.height).is_ok());
        assert!(MockChain::verify_proof_height(&state, &client_id, header.height.increment())
            .is_err());
    }
}
