//! The pair-of-chains object at the center of the relayer.
//!
//! A [`Link`] owns one [`Endpoint`] per chain and drives everything that
//! happens between them: creating the light clients and the connection
//! during bootstrap, opening channels, keeping the clients fresh, and
//! the steady-state pull/prove/submit/ack pipeline over both directions.
//!
//! A link holds no mutable state. Iterations of the relay pipeline must
//! be externally serialized: callers await one
//! [`Link::check_and_relay_packets_and_acks`] before starting the next,
//! threading the returned [`RelayedHeights`] cursor through. The link
//! never retries; every failure propagates out of the iteration and the
//! previous cursor bounds the re-work on re-entry.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use futures::try_join;
use itertools::Itertools;
use tracing::{debug, info, warn};

use ibc_link_types::channel::{self, ChannelEnd};
use ibc_link_types::client::{ClientState, ConsensusState};
use ibc_link_types::connection;
use ibc_link_types::events::extract_write_acks;
use ibc_link_types::height::Height;
use ibc_link_types::identifier::{ClientId, ConnectionId, PortChannelId, PortId};
use ibc_link_types::msgs::{
    MsgAcknowledgement, MsgChannelOpenAck, MsgChannelOpenConfirm, MsgChannelOpenInit,
    MsgChannelOpenTry, MsgConnectionOpenAck, MsgConnectionOpenConfirm, MsgConnectionOpenInit,
    MsgConnectionOpenTry, MsgCreateClient, MsgRecvPacket, MsgUpdateClient,
};
use ibc_link_types::packet::Sequence;
use ibc_link_types::signer::Signer;

use crate::chain::requests::{QueryUnreceivedAcksRequest, QueryUnreceivedPacketsRequest};
use crate::chain::ChainHandle;
use crate::config::ClientSettings;
use crate::cursor::RelayedHeights;
use crate::endpoint::{AckWithMetadata, Endpoint, PacketWithMetadata, QueryOpts};
use crate::proof::{
    build_ack_proof, build_channel_proofs, build_connection_proofs_and_client_state,
    build_packet_proof, ConnectionMsgType,
};

pub mod error;

use error::LinkError;

/// Selects one of the two sides of a link as the source of an
/// operation; the destination is always the opposite side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// A source/destination view over the two endpoints of a link.
pub struct RelayEnds<'a> {
    pub src: &'a Endpoint,
    pub dst: &'a Endpoint,
}

/// The channel coordinates minted by [`Link::create_channel`], one per
/// side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPair {
    pub src: PortChannelId,
    pub dest: PortChannelId,
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <=> {}", self.src, self.dest)
    }
}

pub struct Link {
    a: Endpoint,
    b: Endpoint,
}

fn chain_error(chain: &dyn ChainHandle) -> impl Fn(crate::error::Error) -> LinkError + '_ {
    move |e| LinkError::chain(chain.id().clone(), e)
}

/// Assembles the create-client transaction for a client tracking
/// `remote`, anchored at the remote's latest header.
pub async fn build_create_client_args(
    remote: &dyn ChainHandle,
    settings: &ClientSettings,
    signer: Signer,
) -> Result<MsgCreateClient, LinkError> {
    let header = remote
        .query_latest_header()
        .await
        .map_err(chain_error(remote))?;

    Ok(MsgCreateClient {
        client_state: ClientState {
            chain_id: remote.id().clone(),
            latest_height: header.height,
            trusting_period: settings.trusting_period,
            unbonding_period: settings.unbonding_period,
        },
        consensus_state: ConsensusState::from_header(&header),
        signer,
    })
}

/// Creates a client on `host` tracking `remote` and returns its id.
async fn create_client(
    host: &dyn ChainHandle,
    remote: &dyn ChainHandle,
    settings: &ClientSettings,
) -> Result<ClientId, LinkError> {
    let signer = host.get_signer().map_err(chain_error(host))?;
    let msg = build_create_client_args(remote, settings, signer).await?;

    let client_id = host
        .create_client(msg)
        .await
        .map_err(|e| LinkError::handshake("CreateClient", host.id().clone(), e))?;

    info!(
        "created client {} on {} tracking {}",
        client_id,
        host.id(),
        remote.id()
    );

    Ok(client_id)
}

/// Submits the latest header of `src` to its client on `dst` and
/// returns the height `dst` now knows `src` at.
async fn push_header(
    src: &dyn ChainHandle,
    dst: &dyn ChainHandle,
    dst_client_id: &ClientId,
) -> Result<Height, LinkError> {
    let header = src.query_latest_header().await.map_err(chain_error(src))?;
    let height = header.height;

    let signer = dst.get_signer().map_err(chain_error(dst))?;
    dst.update_client(MsgUpdateClient {
        client_id: dst_client_id.clone(),
        header,
        signer,
    })
    .await
    .map_err(chain_error(dst))?;

    debug!(
        "updated client {} on {} to height {}",
        dst_client_id,
        dst.id(),
        height
    );

    Ok(height)
}

/// Checks that the consensus state `host` stores for `client_id` at the
/// client's latest height agrees with the header `remote` actually
/// produced at that height.
async fn confirm_client_consensus(
    host: &dyn ChainHandle,
    client_id: &ClientId,
    client_state: &ClientState,
    remote: &dyn ChainHandle,
) -> Result<(), LinkError> {
    let height = client_state.latest_height;

    let consensus = host
        .query_consensus_state(client_id, Some(height))
        .await
        .map_err(chain_error(host))?;
    let header = remote.query_header(height).await.map_err(chain_error(remote))?;

    if consensus.next_validators_hash != header.next_validators_hash {
        return Err(LinkError::consensus_state_mismatch(
            host.id().clone(),
            client_id.clone(),
            format!("next validators hash differs from the counterparty header at {height}"),
        ));
    }

    if consensus.root.as_bytes() != header.app_hash.as_bytes() {
        return Err(LinkError::consensus_state_mismatch(
            host.id().clone(),
            client_id.clone(),
            format!("consensus root differs from the counterparty app hash at {height}"),
        ));
    }

    Ok(())
}

impl Link {
    /// Assembles a link from two already-validated endpoints. Prefer the
    /// `create_with_*` constructors, which establish or verify the
    /// on-chain state the endpoints refer to.
    pub fn new(a: Endpoint, b: Endpoint) -> Self {
        Self { a, b }
    }

    pub fn end_a(&self) -> &Endpoint {
        &self.a
    }

    pub fn end_b(&self) -> &Endpoint {
        &self.b
    }

    /// The endpoints viewed with `src` as the named side.
    pub fn ends(&self, src: Side) -> RelayEnds<'_> {
        match src {
            Side::A => RelayEnds {
                src: &self.a,
                dst: &self.b,
            },
            Side::B => RelayEnds {
                src: &self.b,
                dst: &self.a,
            },
        }
    }

    /// The same link with sides A and B exchanged.
    pub fn flipped(&self) -> Link {
        Link {
            a: self.b.clone(),
            b: self.a.clone(),
        }
    }

    /// Adopts an existing OPEN connection pair after verifying that the
    /// two ends actually describe each other and that each side's light
    /// client agrees with the counterparty's headers. Broadcasts no
    /// transactions; any verification failure is fatal and no link is
    /// produced.
    pub async fn create_with_existing_connections(
        chain_a: Arc<dyn ChainHandle>,
        chain_b: Arc<dyn ChainHandle>,
        connection_a: &ConnectionId,
        connection_b: &ConnectionId,
    ) -> Result<Link, LinkError> {
        let (conn_end_a, conn_end_b) = try_join!(
            async {
                chain_a
                    .query_connection(connection_a)
                    .await
                    .map_err(chain_error(chain_a.as_ref()))
            },
            async {
                chain_b
                    .query_connection(connection_b)
                    .await
                    .map_err(chain_error(chain_b.as_ref()))
            },
        )?;

        let counterparty_conn_a = conn_end_a
            .counterparty()
            .connection_id()
            .ok_or_else(|| LinkError::missing_counterparty_connection_id(connection_a.clone()))?;
        let counterparty_conn_b = conn_end_b
            .counterparty()
            .connection_id()
            .ok_or_else(|| LinkError::missing_counterparty_connection_id(connection_b.clone()))?;

        if !conn_end_a.state_matches(connection::State::Open) {
            return Err(LinkError::connection_not_open(
                connection_a.clone(),
                chain_a.id().clone(),
                conn_end_a.state().to_string(),
            ));
        }
        if !conn_end_b.state_matches(connection::State::Open) {
            return Err(LinkError::connection_not_open(
                connection_b.clone(),
                chain_b.id().clone(),
                conn_end_b.state().to_string(),
            ));
        }

        if counterparty_conn_a != connection_b {
            return Err(LinkError::connection_id_mismatch(
                connection_b.clone(),
                counterparty_conn_a.clone(),
            ));
        }
        if counterparty_conn_b != connection_a {
            return Err(LinkError::connection_id_mismatch(
                connection_a.clone(),
                counterparty_conn_b.clone(),
            ));
        }

        if conn_end_a.client_id() != conn_end_b.counterparty().client_id() {
            return Err(LinkError::client_id_mismatch(
                conn_end_a.client_id().clone(),
                conn_end_b.counterparty().client_id().clone(),
            ));
        }
        if conn_end_b.client_id() != conn_end_a.counterparty().client_id() {
            return Err(LinkError::client_id_mismatch(
                conn_end_b.client_id().clone(),
                conn_end_a.counterparty().client_id().clone(),
            ));
        }

        let client_a = conn_end_a.client_id().clone();
        let client_b = conn_end_b.client_id().clone();

        let (client_state_a, client_state_b) = try_join!(
            async {
                chain_a
                    .query_client_state(&client_a)
                    .await
                    .map_err(chain_error(chain_a.as_ref()))
            },
            async {
                chain_b
                    .query_client_state(&client_b)
                    .await
                    .map_err(chain_error(chain_b.as_ref()))
            },
        )?;

        // the client on A must track chain B, and vice versa
        if client_state_a.chain_id != *chain_b.id() {
            return Err(LinkError::chain_id_mismatch(
                chain_b.id().clone(),
                client_state_a.chain_id.clone(),
            ));
        }
        if client_state_b.chain_id != *chain_a.id() {
            return Err(LinkError::chain_id_mismatch(
                chain_a.id().clone(),
                client_state_b.chain_id.clone(),
            ));
        }

        try_join!(
            confirm_client_consensus(
                chain_a.as_ref(),
                &client_a,
                &client_state_a,
                chain_b.as_ref()
            ),
            confirm_client_consensus(
                chain_b.as_ref(),
                &client_b,
                &client_state_b,
                chain_a.as_ref()
            ),
        )?;

        info!(
            "adopted existing connections {} on {} and {} on {}",
            connection_a,
            chain_a.id(),
            connection_b,
            chain_b.id()
        );

        Ok(Link::new(
            Endpoint::new(chain_a, client_a, connection_a.clone()),
            Endpoint::new(chain_b, client_b, connection_b.clone()),
        ))
    }

    /// Bootstraps a fresh link: creates a light client of each chain on
    /// the other, then walks the connection handshake
    /// Init(A) → Try(B) → Ack(A) → Confirm(B), pushing a header to the
    /// destination before every proof-carrying step.
    pub async fn create_with_new_connections(
        chain_a: Arc<dyn ChainHandle>,
        chain_b: Arc<dyn ChainHandle>,
    ) -> Result<Link, LinkError> {
        Self::create_with_new_connections_and_settings(chain_a, chain_b, ClientSettings::default())
            .await
    }

    pub async fn create_with_new_connections_and_settings(
        chain_a: Arc<dyn ChainHandle>,
        chain_b: Arc<dyn ChainHandle>,
        settings: ClientSettings,
    ) -> Result<Link, LinkError> {
        // client on B tracking A first, then client on A tracking B
        let client_b = create_client(chain_b.as_ref(), chain_a.as_ref(), &settings).await?;
        let client_a = create_client(chain_a.as_ref(), chain_b.as_ref(), &settings).await?;

        let (prefix_a, prefix_b) = try_join!(
            async {
                chain_a
                    .query_commitment_prefix()
                    .await
                    .map_err(chain_error(chain_a.as_ref()))
            },
            async {
                chain_b
                    .query_commitment_prefix()
                    .await
                    .map_err(chain_error(chain_b.as_ref()))
            },
        )?;

        let signer_a = chain_a.get_signer().map_err(chain_error(chain_a.as_ref()))?;
        let signer_b = chain_b.get_signer().map_err(chain_error(chain_b.as_ref()))?;

        let connection_a = chain_a
            .conn_open_init(MsgConnectionOpenInit {
                client_id: client_a.clone(),
                counterparty: connection::Counterparty::new(client_b.clone(), None, prefix_b),
                version: connection::DEFAULT_VERSION.to_string(),
                delay_period: Duration::ZERO,
                signer: signer_a.clone(),
            })
            .await
            .map_err(|e| LinkError::handshake("ConnOpenInit", chain_a.id().clone(), e))?;

        // ConnOpenTry on B, proving A's Init
        let proof_height = push_header(chain_a.as_ref(), chain_b.as_ref(), &client_b).await?;
        let (client_state, proofs) = build_connection_proofs_and_client_state(
            chain_a.as_ref(),
            ConnectionMsgType::OpenTry,
            &connection_a,
            &client_a,
            proof_height,
        )
        .await
        .map_err(chain_error(chain_a.as_ref()))?;

        let connection_b = chain_b
            .conn_open_try(MsgConnectionOpenTry {
                client_id: client_b.clone(),
                client_state,
                counterparty: connection::Counterparty::new(
                    client_a.clone(),
                    Some(connection_a.clone()),
                    prefix_a,
                ),
                counterparty_versions: vec![connection::DEFAULT_VERSION.to_string()],
                proofs,
                delay_period: Duration::ZERO,
                signer: signer_b.clone(),
            })
            .await
            .map_err(|e| LinkError::handshake("ConnOpenTry", chain_b.id().clone(), e))?;

        // ConnOpenAck on A, proving B's TryOpen
        let proof_height = push_header(chain_b.as_ref(), chain_a.as_ref(), &client_a).await?;
        let (client_state, proofs) = build_connection_proofs_and_client_state(
            chain_b.as_ref(),
            ConnectionMsgType::OpenAck,
            &connection_b,
            &client_b,
            proof_height,
        )
        .await
        .map_err(chain_error(chain_b.as_ref()))?;

        chain_a
            .conn_open_ack(MsgConnectionOpenAck {
                connection_id: connection_a.clone(),
                counterparty_connection_id: connection_b.clone(),
                client_state,
                proofs,
                version: connection::DEFAULT_VERSION.to_string(),
                signer: signer_a,
            })
            .await
            .map_err(|e| LinkError::handshake("ConnOpenAck", chain_a.id().clone(), e))?;

        // ConnOpenConfirm on B, proving A's Open
        let proof_height = push_header(chain_a.as_ref(), chain_b.as_ref(), &client_b).await?;
        let (_, proofs) = build_connection_proofs_and_client_state(
            chain_a.as_ref(),
            ConnectionMsgType::OpenConfirm,
            &connection_a,
            &client_a,
            proof_height,
        )
        .await
        .map_err(chain_error(chain_a.as_ref()))?;

        chain_b
            .conn_open_confirm(MsgConnectionOpenConfirm {
                connection_id: connection_b.clone(),
                proofs,
                signer: signer_b,
            })
            .await
            .map_err(|e| LinkError::handshake("ConnOpenConfirm", chain_b.id().clone(), e))?;

        info!(
            "connection handshake finished: {} on {} <=> {} on {}",
            connection_a,
            chain_a.id(),
            connection_b,
            chain_b.id()
        );

        Ok(Link::new(
            Endpoint::new(chain_a, client_a, connection_a),
            Endpoint::new(chain_b, client_b, connection_b),
        ))
    }

    /// Opens a channel over the link's connection pair with the four-step
    /// handshake, initiated from `sender`. The version string is echoed
    /// unchanged on both sides. On failure the channel is left in
    /// whatever partial handshake state was reached; no rollback is
    /// attempted.
    pub async fn create_channel(
        &self,
        sender: Side,
        src_port: PortId,
        dst_port: PortId,
        ordering: channel::Ordering,
        version: &str,
    ) -> Result<ChannelPair, LinkError> {
        let ends = self.ends(sender);
        let src_chain = ends.src.chain.as_ref();
        let dst_chain = ends.dst.chain.as_ref();

        let src_signer = src_chain.get_signer().map_err(chain_error(src_chain))?;
        let dst_signer = dst_chain.get_signer().map_err(chain_error(dst_chain))?;

        let channel = ChannelEnd::new(
            channel::State::Init,
            ordering,
            channel::Counterparty::new(dst_port.clone(), None),
            vec![ends.src.connection_id.clone()],
            version.to_string(),
        );
        let src_channel_id = src_chain
            .chan_open_init(MsgChannelOpenInit {
                port_id: src_port.clone(),
                channel,
                signer: src_signer.clone(),
            })
            .await
            .map_err(|e| LinkError::handshake("ChanOpenInit", src_chain.id().clone(), e))?;

        // ChanOpenTry on the destination, proving the Init
        let proof_height = self.update_client(sender).await?;
        let proofs = build_channel_proofs(src_chain, &src_port, &src_channel_id, proof_height)
            .await
            .map_err(chain_error(src_chain))?;

        let channel = ChannelEnd::new(
            channel::State::TryOpen,
            ordering,
            channel::Counterparty::new(src_port.clone(), Some(src_channel_id.clone())),
            vec![ends.dst.connection_id.clone()],
            version.to_string(),
        );
        let dst_channel_id = dst_chain
            .chan_open_try(MsgChannelOpenTry {
                port_id: dst_port.clone(),
                channel,
                counterparty_version: version.to_string(),
                proofs,
                signer: dst_signer.clone(),
            })
            .await
            .map_err(|e| LinkError::handshake("ChanOpenTry", dst_chain.id().clone(), e))?;

        // ChanOpenAck back on the sender, proving the TryOpen
        let proof_height = self.update_client(sender.other()).await?;
        let proofs = build_channel_proofs(dst_chain, &dst_port, &dst_channel_id, proof_height)
            .await
            .map_err(chain_error(dst_chain))?;

        src_chain
            .chan_open_ack(MsgChannelOpenAck {
                port_id: src_port.clone(),
                channel_id: src_channel_id.clone(),
                counterparty_channel_id: dst_channel_id.clone(),
                counterparty_version: version.to_string(),
                proofs,
                signer: src_signer,
            })
            .await
            .map_err(|e| LinkError::handshake("ChanOpenAck", src_chain.id().clone(), e))?;

        // ChanOpenConfirm on the destination, proving the Open
        let proof_height = self.update_client(sender).await?;
        let proofs = build_channel_proofs(src_chain, &src_port, &src_channel_id, proof_height)
            .await
            .map_err(chain_error(src_chain))?;

        dst_chain
            .chan_open_confirm(MsgChannelOpenConfirm {
                port_id: dst_port.clone(),
                channel_id: dst_channel_id.clone(),
                proofs,
                signer: dst_signer,
            })
            .await
            .map_err(|e| LinkError::handshake("ChanOpenConfirm", dst_chain.id().clone(), e))?;

        let pair = ChannelPair {
            src: PortChannelId::new(src_port, src_channel_id),
            dest: PortChannelId::new(dst_port, dst_channel_id),
        };

        info!(
            "created channel {} over connections {} on {} and {} on {}",
            pair,
            ends.src.connection_id,
            src_chain.id(),
            ends.dst.connection_id,
            dst_chain.id()
        );

        Ok(pair)
    }

    /// Unconditionally pushes the source's latest header to its client
    /// on the destination; returns the new destination-known height.
    pub async fn update_client(&self, source: Side) -> Result<Height, LinkError> {
        let ends = self.ends(source);
        push_header(
            ends.src.chain.as_ref(),
            ends.dst.chain.as_ref(),
            &ends.dst.client_id,
        )
        .await
    }

    /// Updates the client only when the destination's latest consensus
    /// state for the source is older than `max_age` relative to the
    /// source's current header time. Returns the new height on update,
    /// `None` when the client was fresh enough.
    pub async fn update_client_if_stale(
        &self,
        source: Side,
        max_age: Duration,
    ) -> Result<Option<Height>, LinkError> {
        let ends = self.ends(source);

        let consensus = ends
            .dst
            .chain
            .query_consensus_state(&ends.dst.client_id, None)
            .await
            .map_err(chain_error(ends.dst.chain.as_ref()))?;
        let header = ends
            .src
            .chain
            .query_latest_header()
            .await
            .map_err(chain_error(ends.src.chain.as_ref()))?;

        match header.time.duration_since(&consensus.timestamp) {
            Some(age) if age > max_age => self.update_client(source).await.map(Some),
            _ => {
                debug!(
                    "client {} on {} is fresh enough, skipping update",
                    ends.dst.client_id,
                    ends.dst.chain.id()
                );
                Ok(None)
            }
        }
    }

    /// Ensures the destination knows the source at `min_height` or
    /// later and returns the destination-known height. The destination
    /// always learns the latest available source height; `min_height`
    /// is a lower bound on sufficiency, never a request for a specific
    /// height. When the source tip itself is still below `min_height`,
    /// one block is awaited first.
    pub async fn update_client_to_height(
        &self,
        source: Side,
        min_height: Height,
    ) -> Result<Height, LinkError> {
        let ends = self.ends(source);

        let client_state = ends
            .dst
            .chain
            .query_client_state(&ends.dst.client_id)
            .await
            .map_err(chain_error(ends.dst.chain.as_ref()))?;

        if client_state.latest_height >= min_height {
            return Ok(client_state.latest_height);
        }

        let tip = ends
            .src
            .chain
            .query_latest_height()
            .await
            .map_err(chain_error(ends.src.chain.as_ref()))?;

        if tip < min_height {
            ends.src
                .chain
                .wait_one_block()
                .await
                .map_err(chain_error(ends.src.chain.as_ref()))?;
        }

        self.update_client(source).await
    }

    /// One pass of the bidirectional pipeline: relay pending packets in
    /// both directions, then pending acknowledgments in both directions,
    /// and return the advanced cursor.
    ///
    /// Acknowledgments produced by this pass's own receive transactions
    /// are picked up by the written-ack query of step three; re-querying
    /// rather than trusting the parsed logs also covers acks written by
    /// other relayers.
    pub async fn check_and_relay_packets_and_acks(
        &self,
        cursor: RelayedHeights,
    ) -> Result<RelayedHeights, LinkError> {
        let mut next = cursor;

        let (sent_a, sent_b) = try_join!(
            self.fetch_sent_packets(Side::A, cursor.next_packet_height(Side::A)),
            self.fetch_sent_packets(Side::B, cursor.next_packet_height(Side::B)),
        )?;
        next.advance_packet_height(Side::A, sent_a.iter().map(|p| p.height).max());
        next.advance_packet_height(Side::B, sent_b.iter().map(|p| p.height).max());

        let (pending_a, pending_b) = try_join!(
            self.filter_unreceived_packets(Side::A, sent_a),
            self.filter_unreceived_packets(Side::B, sent_b),
        )?;

        try_join!(
            self.relay_packets(Side::A, pending_a),
            self.relay_packets(Side::B, pending_b),
        )?;

        let (written_a, written_b) = try_join!(
            self.fetch_written_acks(Side::A, cursor.next_ack_height(Side::A)),
            self.fetch_written_acks(Side::B, cursor.next_ack_height(Side::B)),
        )?;
        next.advance_ack_height(Side::A, written_a.iter().map(|a| a.height).max());
        next.advance_ack_height(Side::B, written_b.iter().map(|a| a.height).max());

        let (acks_a, acks_b) = try_join!(
            self.filter_unrelayed_acks(Side::A, written_a),
            self.filter_unrelayed_acks(Side::B, written_b),
        )?;

        try_join!(
            self.relay_acks(Side::A, acks_a),
            self.relay_acks(Side::B, acks_b),
        )?;

        Ok(next)
    }

    /// Packets committed on `source` since `min_height` that the
    /// destination has not yet received.
    pub async fn pending_packets(
        &self,
        source: Side,
        min_height: Option<Height>,
    ) -> Result<Vec<PacketWithMetadata>, LinkError> {
        let sent = self.fetch_sent_packets(source, min_height).await?;
        self.filter_unreceived_packets(source, sent).await
    }

    /// Acknowledgments written on `source` since `min_height` that the
    /// original sender has not yet consumed.
    pub async fn pending_acks(
        &self,
        source: Side,
        min_height: Option<Height>,
    ) -> Result<Vec<AckWithMetadata>, LinkError> {
        let written = self.fetch_written_acks(source, min_height).await?;
        self.filter_unrelayed_acks(source, written).await
    }

    /// Relays a batch of packets from `source` to the other side in a
    /// single receive transaction and returns the acknowledgments its
    /// logs produced, tagged with the destination inclusion height.
    pub async fn relay_packets(
        &self,
        source: Side,
        packets: Vec<PacketWithMetadata>,
    ) -> Result<Vec<AckWithMetadata>, LinkError> {
        if packets.is_empty() {
            return Ok(Vec::new());
        }

        let ends = self.ends(source);
        let src_chain = ends.src.chain.as_ref();
        let dst_chain = ends.dst.chain.as_ref();

        let (packets, timed_out) = self.split_timed_out(source, packets).await?;
        if !timed_out.is_empty() {
            warn!(
                "{} packet(s) from {} expired before relay and were skipped",
                timed_out.len(),
                src_chain.id()
            );
        }
        let needed_height = match packets.iter().map(|p| p.height).max() {
            Some(max_commit_height) => max_commit_height.increment(),
            None => return Ok(Vec::new()),
        };

        // commitments at height h are provable under a consensus state
        // of height h+1 or later
        let header_height = self.update_client_to_height(source, needed_height).await?;

        let proofs = try_join_all(
            packets
                .iter()
                .map(|p| build_packet_proof(src_chain, &p.packet, header_height)),
        )
        .await
        .map_err(chain_error(src_chain))?;

        let signer = dst_chain.get_signer().map_err(chain_error(dst_chain))?;
        let count = packets.len();
        let msgs = packets
            .into_iter()
            .zip(proofs)
            .map(|(p, proof)| MsgRecvPacket {
                packet: p.packet,
                proof,
                proof_height: header_height,
                signer: signer.clone(),
            })
            .collect();

        let (events, inclusion_height) = dst_chain
            .recv_packets(msgs)
            .await
            .map_err(|e| LinkError::relay(dst_chain.id().clone(), e))?;

        let acks: Vec<AckWithMetadata> = extract_write_acks(events)
            .into_iter()
            .map(|event| AckWithMetadata {
                acknowledgement: event.ack,
                original_packet: event.packet,
                height: inclusion_height,
            })
            .collect();

        info!(
            "relayed {} packet(s) {} -> {}, included at height {}",
            count,
            src_chain.id(),
            dst_chain.id(),
            inclusion_height
        );

        Ok(acks)
    }

    /// Relays a batch of acknowledgments written on `source` back to the
    /// chain that sent the original packets, in a single transaction.
    /// Returns the inclusion height, or `None` for an empty batch.
    pub async fn relay_acks(
        &self,
        source: Side,
        acks: Vec<AckWithMetadata>,
    ) -> Result<Option<Height>, LinkError> {
        if acks.is_empty() {
            return Ok(None);
        }

        let ends = self.ends(source);
        let src_chain = ends.src.chain.as_ref();
        let dst_chain = ends.dst.chain.as_ref();

        let needed_height = match acks.iter().map(|a| a.height).max() {
            Some(max_write_height) => max_write_height.increment(),
            None => return Ok(None),
        };

        let header_height = self.update_client_to_height(source, needed_height).await?;

        let proofs = try_join_all(
            acks.iter()
                .map(|a| build_ack_proof(src_chain, &a.original_packet, header_height)),
        )
        .await
        .map_err(chain_error(src_chain))?;

        let signer = dst_chain.get_signer().map_err(chain_error(dst_chain))?;
        let count = acks.len();
        let msgs = acks
            .into_iter()
            .zip(proofs)
            .map(|(a, proof)| MsgAcknowledgement {
                packet: a.original_packet,
                acknowledgement: a.acknowledgement,
                proof,
                proof_height: header_height,
                signer: signer.clone(),
            })
            .collect();

        let (_events, inclusion_height) = dst_chain
            .ack_packets(msgs)
            .await
            .map_err(|e| LinkError::relay(dst_chain.id().clone(), e))?;

        info!(
            "relayed {} ack(s) {} -> {}, included at height {}",
            count,
            src_chain.id(),
            dst_chain.id(),
            inclusion_height
        );

        Ok(Some(inclusion_height))
    }

    async fn fetch_sent_packets(
        &self,
        source: Side,
        min_height: Option<Height>,
    ) -> Result<Vec<PacketWithMetadata>, LinkError> {
        let ends = self.ends(source);
        ends.src
            .query_sent_packets(QueryOpts { min_height })
            .await
            .map_err(chain_error(ends.src.chain.as_ref()))
    }

    async fn fetch_written_acks(
        &self,
        source: Side,
        min_height: Option<Height>,
    ) -> Result<Vec<AckWithMetadata>, LinkError> {
        let ends = self.ends(source);
        ends.src
            .query_written_acks(QueryOpts { min_height })
            .await
            .map_err(chain_error(ends.src.chain.as_ref()))
    }

    /// Keeps only the packets the destination has not received yet,
    /// asking it once per destination channel end.
    async fn filter_unreceived_packets(
        &self,
        source: Side,
        packets: Vec<PacketWithMetadata>,
    ) -> Result<Vec<PacketWithMetadata>, LinkError> {
        if packets.is_empty() {
            return Ok(packets);
        }

        let ends = self.ends(source);
        let dst_chain = ends.dst.chain.as_ref();

        let groups = packets.into_iter().into_group_map_by(|p| {
            (
                p.packet.destination_port.clone(),
                p.packet.destination_channel.clone(),
            )
        });

        let filtered = try_join_all(groups.into_iter().map(
            |((port_id, channel_id), group)| async move {
                let sequences = group.iter().map(|p| p.packet.sequence).collect();
                let unreceived: BTreeSet<Sequence> = dst_chain
                    .query_unreceived_packets(QueryUnreceivedPacketsRequest {
                        port_id,
                        channel_id,
                        packet_commitment_sequences: sequences,
                    })
                    .await
                    .map_err(chain_error(dst_chain))?
                    .into_iter()
                    .collect();

                Ok::<_, LinkError>(
                    group
                        .into_iter()
                        .filter(|p| unreceived.contains(&p.packet.sequence))
                        .collect::<Vec<_>>(),
                )
            },
        ))
        .await?;

        let mut pending: Vec<PacketWithMetadata> = filtered.into_iter().flatten().collect();
        pending.sort_by_key(|p| (p.height, p.packet.sequence));
        Ok(pending)
    }

    /// Keeps only the acknowledgments whose original packet commitment
    /// is still outstanding on the destination (the original sender),
    /// asking it once per source channel end of the original packets.
    async fn filter_unrelayed_acks(
        &self,
        source: Side,
        acks: Vec<AckWithMetadata>,
    ) -> Result<Vec<AckWithMetadata>, LinkError> {
        if acks.is_empty() {
            return Ok(acks);
        }

        let ends = self.ends(source);
        let dst_chain = ends.dst.chain.as_ref();

        let groups = acks.into_iter().into_group_map_by(|a| {
            (
                a.original_packet.source_port.clone(),
                a.original_packet.source_channel.clone(),
            )
        });

        let filtered = try_join_all(groups.into_iter().map(
            |((port_id, channel_id), group)| async move {
                let sequences = group.iter().map(|a| a.original_packet.sequence).collect();
                let unreceived: BTreeSet<Sequence> = dst_chain
                    .query_unreceived_acks(QueryUnreceivedAcksRequest {
                        port_id,
                        channel_id,
                        packet_ack_sequences: sequences,
                    })
                    .await
                    .map_err(chain_error(dst_chain))?
                    .into_iter()
                    .collect();

                Ok::<_, LinkError>(
                    group
                        .into_iter()
                        .filter(|a| unreceived.contains(&a.original_packet.sequence))
                        .collect::<Vec<_>>(),
                )
            },
        ))
        .await?;

        let mut pending: Vec<AckWithMetadata> = filtered.into_iter().flatten().collect();
        pending.sort_by_key(|a| (a.height, a.original_packet.sequence));
        Ok(pending)
    }

    /// Partitions out packets that can no longer be received because
    /// their timeout already passed on the destination.
    ///
    /// TODO(timeout relay): submit a `MsgTimeout` on the source for the
    /// expired packets once timeout proofs are exposed by `ChainHandle`;
    /// until then they are only reported and skipped.
    async fn split_timed_out(
        &self,
        source: Side,
        packets: Vec<PacketWithMetadata>,
    ) -> Result<(Vec<PacketWithMetadata>, Vec<PacketWithMetadata>), LinkError> {
        let ends = self.ends(source);

        let dst_header = ends
            .dst
            .chain
            .query_latest_header()
            .await
            .map_err(chain_error(ends.dst.chain.as_ref()))?;

        let (live, timed_out) = packets
            .into_iter()
            .partition(|p| !p.packet.timed_out(dst_header.height, &dst_header.time));

        Ok((live, timed_out))
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("a", &self.a)
            .field("b", &self.b)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_flips() {
        assert_eq!(Side::A.other(), Side::B);
        assert_eq!(Side::B.other(), Side::A);
        assert_eq!(Side::A.other().other(), Side::A);
    }
}
