//! Bootstrap and handshake behaviour of the link: client creation, the
//! connection handshake, adopting existing connections, and channel
//! creation.

mod common;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ibc_link::chain::ChainHandle;
use ibc_link::{Link, Side};
use ibc_link_types::channel::Ordering;
use ibc_link_types::connection;
use ibc_link_types::identifier::{ClientId, ConnectionId, PortId};

use common::{bootstrap_link, open_transfer_channel, spawn_chains, tx_kinds_without_updates};

#[tokio::test]
async fn fresh_bootstrap_issues_the_expected_transactions() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    // newly minted ids on fresh chains
    assert_eq!(link.end_a().connection_id.as_str(), "connection-0");
    assert_eq!(link.end_b().connection_id.as_str(), "connection-0");
    assert_eq!(link.end_a().client_id.as_str(), "07-tendermint-0");
    assert_eq!(link.end_b().client_id.as_str(), "07-tendermint-0");

    // exactly CreateClient x2 and the four handshake steps, in order
    assert_eq!(
        tx_kinds_without_updates(&chain_a),
        ["create_client", "conn_open_init", "conn_open_ack"]
    );
    assert_eq!(
        tx_kinds_without_updates(&chain_b),
        ["create_client", "conn_open_try", "conn_open_confirm"]
    );

    // both ends are open and cross-reference each other
    let conn_a = chain_a
        .query_connection(&link.end_a().connection_id)
        .await
        .unwrap();
    let conn_b = chain_b
        .query_connection(&link.end_b().connection_id)
        .await
        .unwrap();

    assert!(conn_a.state_matches(connection::State::Open));
    assert!(conn_b.state_matches(connection::State::Open));
    assert_eq!(
        conn_a.counterparty().connection_id(),
        Some(&link.end_b().connection_id)
    );
    assert_eq!(
        conn_b.counterparty().connection_id(),
        Some(&link.end_a().connection_id)
    );
    assert_eq!(conn_a.counterparty().client_id(), &link.end_b().client_id);
    assert_eq!(conn_b.counterparty().client_id(), &link.end_a().client_id);
}

#[tokio::test]
async fn clients_are_created_with_the_configured_periods() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    let client_on_a = chain_a
        .query_client_state(&link.end_a().client_id)
        .await
        .unwrap();

    assert_eq!(client_on_a.chain_id, *chain_b.id());
    assert_eq!(client_on_a.trusting_period, Duration::from_secs(5_000));
    assert_eq!(client_on_a.unbonding_period, Duration::from_secs(1_814_400));
}

#[tokio::test]
async fn adopting_existing_connections_broadcasts_nothing() {
    let (chain_a, chain_b) = spawn_chains();
    let bootstrapped = bootstrap_link(&chain_a, &chain_b).await;

    let txs_a = chain_a.tx_count();
    let txs_b = chain_b.tx_count();

    let adopted = Link::create_with_existing_connections(
        Arc::clone(&chain_a) as Arc<dyn ChainHandle>,
        Arc::clone(&chain_b) as Arc<dyn ChainHandle>,
        &bootstrapped.end_a().connection_id,
        &bootstrapped.end_b().connection_id,
    )
    .await
    .expect("adopting open connections failed");

    assert_eq!(chain_a.tx_count(), txs_a);
    assert_eq!(chain_b.tx_count(), txs_b);

    assert_eq!(
        adopted.end_a().client_id,
        bootstrapped.end_a().client_id
    );
    assert_eq!(
        adopted.end_b().client_id,
        bootstrapped.end_b().client_id
    );
}

#[tokio::test]
async fn adopting_a_missing_connection_fails() {
    let (chain_a, chain_b) = spawn_chains();
    bootstrap_link(&chain_a, &chain_b).await;

    let result = Link::create_with_existing_connections(
        Arc::clone(&chain_a) as Arc<dyn ChainHandle>,
        Arc::clone(&chain_b) as Arc<dyn ChainHandle>,
        &ConnectionId::from_str("connection-9").unwrap(),
        &ConnectionId::from_str("connection-0").unwrap(),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn adopting_fails_on_client_id_mismatch_without_broadcasting() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    // rewrite A's connection end to name a client that is not the one
    // B's counterparty record points at
    let mut tampered = chain_a
        .query_connection(&link.end_a().connection_id)
        .await
        .unwrap();
    tampered.client_id = ClientId::from_str("07-tendermint-9").unwrap();
    chain_a.inject_connection(link.end_a().connection_id.clone(), tampered);

    let txs_a = chain_a.tx_count();
    let txs_b = chain_b.tx_count();

    let result = Link::create_with_existing_connections(
        Arc::clone(&chain_a) as Arc<dyn ChainHandle>,
        Arc::clone(&chain_b) as Arc<dyn ChainHandle>,
        &link.end_a().connection_id,
        &link.end_b().connection_id,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(chain_a.tx_count(), txs_a);
    assert_eq!(chain_b.tx_count(), txs_b);
}

#[tokio::test]
async fn adopting_fails_on_diverged_consensus_state() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    // corrupt the consensus state A stores for B at the client's latest
    // height: the root no longer matches B's actual app hash
    let client_state = chain_a
        .query_client_state(&link.end_a().client_id)
        .await
        .unwrap();
    let mut consensus = chain_a
        .query_consensus_state(&link.end_a().client_id, Some(client_state.latest_height))
        .await
        .unwrap();
    consensus.root = b"not-the-app-hash".to_vec().into();
    chain_a
        .inject_consensus_state(
            &link.end_a().client_id,
            client_state.latest_height,
            consensus,
        )
        .unwrap();

    let result = Link::create_with_existing_connections(
        Arc::clone(&chain_a) as Arc<dyn ChainHandle>,
        Arc::clone(&chain_b) as Arc<dyn ChainHandle>,
        &link.end_a().connection_id,
        &link.end_b().connection_id,
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn channel_creation_walks_the_four_steps() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    let kinds_a_before = tx_kinds_without_updates(&chain_a);
    let kinds_b_before = tx_kinds_without_updates(&chain_b);

    let pair = open_transfer_channel(&link).await;

    assert_eq!(pair.src.channel_id.as_str(), "channel-0");
    assert_eq!(pair.dest.channel_id.as_str(), "channel-0");
    assert_eq!(pair.src.port_id, PortId::transfer());
    assert_eq!(pair.dest.port_id, PortId::transfer());

    // exactly four handshake transactions, two per side, in order
    let kinds_a: Vec<_> = tx_kinds_without_updates(&chain_a)
        .split_off(kinds_a_before.len());
    let kinds_b: Vec<_> = tx_kinds_without_updates(&chain_b)
        .split_off(kinds_b_before.len());
    assert_eq!(kinds_a, ["chan_open_init", "chan_open_ack"]);
    assert_eq!(kinds_b, ["chan_open_try", "chan_open_confirm"]);

    // both ends open, version echoed unchanged, unordered
    let chan_a = chain_a
        .query_channel(&pair.src.port_id, &pair.src.channel_id)
        .await
        .unwrap();
    let chan_b = chain_b
        .query_channel(&pair.dest.port_id, &pair.dest.channel_id)
        .await
        .unwrap();

    assert!(chan_a.state_matches(ibc_link_types::channel::State::Open));
    assert!(chan_b.state_matches(ibc_link_types::channel::State::Open));
    assert_eq!(chan_a.version(), common::ICS20_VERSION);
    assert_eq!(chan_b.version(), common::ICS20_VERSION);
    assert_eq!(chan_a.ordering(), Ordering::Unordered);
    assert_eq!(
        chan_a.counterparty().channel_id.as_ref(),
        Some(&pair.dest.channel_id)
    );
    assert_eq!(
        chan_b.counterparty().channel_id.as_ref(),
        Some(&pair.src.channel_id)
    );
}

#[tokio::test]
async fn channel_creation_can_start_from_side_b() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    let pair = link
        .create_channel(
            Side::B,
            PortId::transfer(),
            PortId::transfer(),
            Ordering::Ordered,
            "custom-1",
        )
        .await
        .unwrap();

    // src is the B side now: init/ack ran on chain B
    let kinds_b = tx_kinds_without_updates(&chain_b);
    assert!(kinds_b.ends_with(&["chan_open_init", "chan_open_ack"]));
    let kinds_a = tx_kinds_without_updates(&chain_a);
    assert!(kinds_a.ends_with(&["chan_open_try", "chan_open_confirm"]));

    let chan_b = chain_b
        .query_channel(&pair.src.port_id, &pair.src.channel_id)
        .await
        .unwrap();
    assert_eq!(chan_b.ordering(), Ordering::Ordered);
    assert_eq!(chan_b.version(), "custom-1");
}
