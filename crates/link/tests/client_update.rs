//! The three client-update policies of the link.

mod common;

use std::time::Duration;

use ibc_link::chain::ChainHandle;
use ibc_link::Side;
use ibc_link_types::height::Height;

use common::{bootstrap_link, spawn_chains};

#[tokio::test]
async fn update_client_pushes_the_latest_source_header() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    chain_a.advance_to(50);

    let height = link.update_client(Side::A).await.unwrap();
    assert_eq!(height, Height::new(1, 50));

    let client_on_b = chain_b
        .query_client_state(&link.end_b().client_id)
        .await
        .unwrap();
    assert_eq!(client_on_b.latest_height, height);
}

#[tokio::test]
async fn update_if_stale_is_a_no_op_for_a_fresh_client() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    let txs_b = chain_b.tx_count();

    // a max age exceeding any possible clock difference
    let result = link
        .update_client_if_stale(Side::A, Duration::from_secs(86_400 * 365))
        .await
        .unwrap();

    assert_eq!(result, None);
    assert_eq!(chain_b.tx_count(), txs_b);
}

#[tokio::test]
async fn update_if_stale_refreshes_an_aged_client() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    // mock block time advances one second per height, so this makes the
    // stored consensus state several minutes stale
    chain_a.advance_to(1_000);

    let updated = link
        .update_client_if_stale(Side::A, Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(updated, Some(Height::new(1, 1_000)));
}

#[tokio::test]
async fn update_to_height_returns_early_when_already_known() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    let known = link.update_client(Side::A).await.unwrap();
    let txs_b = chain_b.tx_count();

    // asking for anything at or below the known height broadcasts nothing
    let result = link
        .update_client_to_height(Side::A, known)
        .await
        .unwrap();

    assert_eq!(result, known);
    assert_eq!(chain_b.tx_count(), txs_b);
}

#[tokio::test]
async fn update_to_height_waits_for_the_source_when_needed() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;

    // one block beyond the source tip: the link must await a block and
    // then push the resulting header
    let tip = chain_a.latest_chain_height();
    let min_height = tip.increment();

    let result = link
        .update_client_to_height(Side::A, min_height)
        .await
        .unwrap();

    assert!(result >= min_height);

    let client_on_b = chain_b
        .query_client_state(&link.end_b().client_id)
        .await
        .unwrap();
    assert!(client_on_b.latest_height >= min_height);
}
