use async_trait::async_trait;

use ibc_link_types::channel::ChannelEnd;
use ibc_link_types::client::{ClientState, ConsensusState};
use ibc_link_types::commitment::{CommitmentPrefix, CommitmentProofBytes};
use ibc_link_types::connection::ConnectionEnd;
use ibc_link_types::events::{IbcEvent, SendPacket, WriteAcknowledgement};
use ibc_link_types::header::Header;
use ibc_link_types::height::Height;
use ibc_link_types::identifier::{ChainId, ChannelId, ClientId, ConnectionId, PortId};
use ibc_link_types::msgs::{
    MsgAcknowledgement, MsgChannelOpenAck, MsgChannelOpenConfirm, MsgChannelOpenInit,
    MsgChannelOpenTry, MsgConnectionOpenAck, MsgConnectionOpenConfirm, MsgConnectionOpenInit,
    MsgConnectionOpenTry, MsgCreateClient, MsgRecvPacket, MsgUpdateClient,
};
use ibc_link_types::packet::Sequence;
use ibc_link_types::signer::Signer;

use crate::chain::requests::{
    QueryPacketEventsRequest, QueryUnreceivedAcksRequest, QueryUnreceivedPacketsRequest,
};
use crate::error::Error;

/// One chain as the relayer sees it: queries over its IBC store and
/// recent events, signed transaction broadcast, and proof generation.
///
/// Every async method suspends on network I/O and is a cancellation
/// point. Implementations must serialize their own account-sequence
/// management internally, since a handle may be shared by several links
/// broadcasting concurrently from the same account.
#[async_trait]
pub trait ChainHandle: Send + Sync {
    fn id(&self) -> &ChainId;

    /// The address transactions submitted through this handle are
    /// signed with.
    fn get_signer(&self) -> Result<Signer, Error>;

    async fn query_latest_header(&self) -> Result<Header, Error>;

    async fn query_header(&self, height: Height) -> Result<Header, Error>;

    async fn query_latest_height(&self) -> Result<Height, Error>;

    /// Returns once the chain has produced at least one further block.
    async fn wait_one_block(&self) -> Result<(), Error>;

    async fn query_commitment_prefix(&self) -> Result<CommitmentPrefix, Error>;

    async fn query_connection(&self, connection_id: &ConnectionId)
        -> Result<ConnectionEnd, Error>;

    async fn query_channel(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<ChannelEnd, Error>;

    async fn query_client_state(&self, client_id: &ClientId) -> Result<ClientState, Error>;

    /// The consensus state the given client stores at `height`, or its
    /// latest one when `height` is `None`.
    async fn query_consensus_state(
        &self,
        client_id: &ClientId,
        height: Option<Height>,
    ) -> Result<ConsensusState, Error>;

    async fn query_unreceived_packets(
        &self,
        request: QueryUnreceivedPacketsRequest,
    ) -> Result<Vec<Sequence>, Error>;

    async fn query_unreceived_acks(
        &self,
        request: QueryUnreceivedAcksRequest,
    ) -> Result<Vec<Sequence>, Error>;

    /// Packets committed for sending on this chain, each tagged with the
    /// height of its send event.
    async fn query_sent_packets(
        &self,
        request: QueryPacketEventsRequest,
    ) -> Result<Vec<SendPacket>, Error>;

    /// Acknowledgments written on this chain, each tagged with the
    /// height of its write event.
    async fn query_written_acks(
        &self,
        request: QueryPacketEventsRequest,
    ) -> Result<Vec<WriteAcknowledgement>, Error>;

    async fn create_client(&self, msg: MsgCreateClient) -> Result<ClientId, Error>;

    async fn update_client(&self, msg: MsgUpdateClient) -> Result<(), Error>;

    async fn conn_open_init(&self, msg: MsgConnectionOpenInit) -> Result<ConnectionId, Error>;

    async fn conn_open_try(&self, msg: MsgConnectionOpenTry) -> Result<ConnectionId, Error>;

    async fn conn_open_ack(&self, msg: MsgConnectionOpenAck) -> Result<(), Error>;

    async fn conn_open_confirm(&self, msg: MsgConnectionOpenConfirm) -> Result<(), Error>;

    async fn chan_open_init(&self, msg: MsgChannelOpenInit) -> Result<ChannelId, Error>;

    async fn chan_open_try(&self, msg: MsgChannelOpenTry) -> Result<ChannelId, Error>;

    async fn chan_open_ack(&self, msg: MsgChannelOpenAck) -> Result<(), Error>;

    async fn chan_open_confirm(&self, msg: MsgChannelOpenConfirm) -> Result<(), Error>;

    /// Broadcasts one transaction carrying the whole batch of receives;
    /// returns the emitted events and the inclusion height.
    async fn recv_packets(
        &self,
        msgs: Vec<MsgRecvPacket>,
    ) -> Result<(Vec<IbcEvent>, Height), Error>;

    /// Broadcasts one transaction carrying the whole batch of
    /// acknowledgments; returns the emitted events and the inclusion
    /// height.
    async fn ack_packets(
        &self,
        msgs: Vec<MsgAcknowledgement>,
    ) -> Result<(Vec<IbcEvent>, Height), Error>;

    /// Proof that the connection end exists in this chain's store, as of
    /// state height `height - 1`, verifiable under a consensus state for
    /// `height`.
    async fn proven_connection(
        &self,
        connection_id: &ConnectionId,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error>;

    async fn proven_channel(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error>;

    async fn proven_client_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error>;

    async fn proven_client_consensus(
        &self,
        client_id: &ClientId,
        consensus_height: Height,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error>;

    async fn proven_packet_commitment(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error>;

    async fn proven_packet_acknowledgement(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        height: Height,
    ) -> Result<CommitmentProofBytes, Error>;
}
