//! The steady-state relay pipeline: pending-packet detection, the
//! receive/ack round trip, cursor behaviour, idempotence and the
//! timeout seam.

mod common;

use ibc_link::chain::mock::MockChain;
use ibc_link::chain::ChainHandle;
use ibc_link::{RelayedHeights, Side};
use ibc_link_types::height::Height;
use ibc_link_types::identifier::PortId;
use ibc_link_types::packet::Packet;
use ibc_link_types::timestamp::Timestamp;

use common::{bootstrap_link, open_transfer_channel, spawn_chains};

fn send_transfer(chain: &MockChain, channel: &ibc_link_types::identifier::ChannelId, data: &[u8]) -> Packet {
    chain
        .send_packet(
            PortId::transfer(),
            channel.clone(),
            data.to_vec(),
            None,
            Timestamp::none(),
        )
        .expect("send_packet failed")
}

fn recv_batches(chain: &MockChain) -> Vec<usize> {
    chain
        .tx_log()
        .into_iter()
        .filter(|record| record.kind == "recv_packets")
        .map(|record| record.msg_count)
        .collect()
}

fn ack_batches(chain: &MockChain) -> Vec<usize> {
    chain
        .tx_log()
        .into_iter()
        .filter(|record| record.kind == "ack_packets")
        .map(|record| record.msg_count)
        .collect()
}

#[tokio::test]
async fn one_way_relay_moves_packets_and_acks() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let pair = open_transfer_channel(&link).await;

    chain_a.advance_to(100);
    send_transfer(&chain_a, &pair.src.channel_id, b"one");
    chain_a.advance_to(101);
    send_transfer(&chain_a, &pair.src.channel_id, b"two");
    chain_a.advance_to(103);
    send_transfer(&chain_a, &pair.src.channel_id, b"three");

    let cursor = link
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    // B's client of A had to reach at least 104 to verify the proofs
    let client_on_b = chain_b
        .query_client_state(&link.end_b().client_id)
        .await
        .unwrap();
    assert!(client_on_b.latest_height >= Height::new(1, 104));

    // one receive transaction carrying all three packets, one ack
    // transaction carrying all three acknowledgments back
    assert_eq!(recv_batches(&chain_b), [3]);
    assert_eq!(recv_batches(&chain_a), Vec::<usize>::new());
    assert_eq!(ack_batches(&chain_a), [3]);
    assert_eq!(ack_batches(&chain_b), Vec::<usize>::new());

    // the cursor advanced to the observed source heights
    assert_eq!(cursor.packet_height_a, Some(Height::new(1, 103)));
    assert_eq!(cursor.packet_height_b, None);
    assert_eq!(cursor.ack_height_a, None);
    assert!(cursor.ack_height_b.is_some());

    // everything pending at the start of the iteration was consumed
    assert!(link.pending_packets(Side::A, None).await.unwrap().is_empty());
    assert!(link.pending_acks(Side::B, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn repeating_an_iteration_is_idempotent() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let pair = open_transfer_channel(&link).await;

    chain_a.advance_to(100);
    send_transfer(&chain_a, &pair.src.channel_id, b"payload");

    let first = link
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    let txs_a = chain_a.tx_count();
    let txs_b = chain_b.tx_count();

    // same input cursor, quiescent world: no new broadcasts, same result
    let second = link
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    assert_eq!(chain_a.tx_count(), txs_a);
    assert_eq!(chain_b.tx_count(), txs_b);
    assert_eq!(second, first);
}

#[tokio::test]
async fn cursor_fields_never_regress() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let pair = open_transfer_channel(&link).await;

    chain_a.advance_to(40);
    send_transfer(&chain_a, &pair.src.channel_id, b"x");

    let first = link
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    // feeding the result back in a quiescent world returns it unchanged
    let second = link.check_and_relay_packets_and_acks(first).await.unwrap();

    assert!(second.packet_height_a >= first.packet_height_a);
    assert!(second.packet_height_b >= first.packet_height_b);
    assert!(second.ack_height_a >= first.ack_height_a);
    assert!(second.ack_height_b >= first.ack_height_b);
    assert_eq!(second, first);
}

#[tokio::test]
async fn threading_the_cursor_relays_only_new_packets() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let pair = open_transfer_channel(&link).await;

    chain_a.advance_to(50);
    send_transfer(&chain_a, &pair.src.channel_id, b"first");

    let cursor = link
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();
    assert_eq!(recv_batches(&chain_b), [1]);

    chain_a.advance_to(200);
    send_transfer(&chain_a, &pair.src.channel_id, b"second");

    let cursor = link.check_and_relay_packets_and_acks(cursor).await.unwrap();

    assert_eq!(recv_batches(&chain_b), [1, 1]);
    assert_eq!(cursor.packet_height_a, Some(Height::new(1, 200)));
}

#[tokio::test]
async fn bidirectional_traffic_is_relayed_in_one_pass() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let pair = open_transfer_channel(&link).await;

    chain_a.advance_to(60);
    send_transfer(&chain_a, &pair.src.channel_id, b"a-to-b");
    chain_b.advance_to(70);
    send_transfer(&chain_b, &pair.dest.channel_id, b"b-to-a-1");
    send_transfer(&chain_b, &pair.dest.channel_id, b"b-to-a-2");

    let cursor = link
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    // receives landed on both sides, and so did the acks coming back
    assert_eq!(recv_batches(&chain_b), [1]);
    assert_eq!(recv_batches(&chain_a), [2]);
    assert_eq!(ack_batches(&chain_a), [1]);
    assert_eq!(ack_batches(&chain_b), [2]);

    assert_eq!(cursor.packet_height_a, Some(Height::new(1, 60)));
    assert_eq!(cursor.packet_height_b, Some(Height::new(2, 70)));
    assert!(cursor.ack_height_a.is_some());
    assert!(cursor.ack_height_b.is_some());
}

#[tokio::test]
async fn packets_across_channels_ride_one_transaction() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let transfer = open_transfer_channel(&link).await;

    let custom = link
        .create_channel(
            Side::A,
            PortId::transfer(),
            PortId::transfer(),
            ibc_link_types::channel::Ordering::Unordered,
            "ics20-1",
        )
        .await
        .unwrap();

    chain_a.advance_to(90);
    send_transfer(&chain_a, &transfer.src.channel_id, b"lane-one");
    send_transfer(&chain_a, &custom.src.channel_id, b"lane-two");

    link.check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    // the unreceived filter fans out per channel but the broadcast is
    // one batched transaction
    assert_eq!(recv_batches(&chain_b), [2]);
    assert_eq!(ack_batches(&chain_a), [2]);
}

#[tokio::test]
async fn empty_batches_touch_nothing() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    open_transfer_channel(&link).await;

    let txs_a = chain_a.tx_count();
    let txs_b = chain_b.tx_count();

    let acks = link.relay_packets(Side::A, Vec::new()).await.unwrap();
    assert!(acks.is_empty());

    let height = link.relay_acks(Side::A, Vec::new()).await.unwrap();
    assert_eq!(height, None);

    let cursor = link
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();
    assert_eq!(cursor, RelayedHeights::default());

    assert_eq!(chain_a.tx_count(), txs_a);
    assert_eq!(chain_b.tx_count(), txs_b);
}

#[tokio::test]
async fn expired_packets_are_held_back_from_relay() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let pair = open_transfer_channel(&link).await;

    chain_a.advance_to(80);

    // already expired on B, whose height is far past 1
    chain_a
        .send_packet(
            PortId::transfer(),
            pair.src.channel_id.clone(),
            b"too-late".to_vec(),
            Some(Height::new(2, 1)),
            Timestamp::none(),
        )
        .unwrap();
    send_transfer(&chain_a, &pair.src.channel_id, b"in-time");

    link.check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    // only the live packet went through
    assert_eq!(recv_batches(&chain_b), [1]);
    assert_eq!(ack_batches(&chain_a), [1]);

    // the expired packet stays pending until timeout relay exists
    let leftover = link.pending_packets(Side::A, None).await.unwrap();
    assert_eq!(leftover.len(), 1);
    assert_eq!(leftover[0].packet.data, b"too-late".to_vec());
}

#[tokio::test]
async fn side_swapped_link_behaves_symmetrically() {
    let (chain_a, chain_b) = spawn_chains();
    let link = bootstrap_link(&chain_a, &chain_b).await;
    let pair = open_transfer_channel(&link).await;

    chain_a.advance_to(55);
    send_transfer(&chain_a, &pair.src.channel_id, b"swap");

    // the same pending set is visible from either orientation
    let via_a = link.pending_packets(Side::A, None).await.unwrap();
    let flipped = link.flipped();
    let via_b = flipped.pending_packets(Side::B, None).await.unwrap();
    assert_eq!(via_a, via_b);

    // and relaying through the flipped link works the same way
    let cursor = flipped
        .check_and_relay_packets_and_acks(RelayedHeights::default())
        .await
        .unwrap();

    assert_eq!(recv_batches(&chain_b), [1]);
    assert_eq!(ack_batches(&chain_a), [1]);

    // the cursor is expressed in the flipped orientation: side A of the
    // flipped link is chain B
    assert_eq!(cursor.packet_height_b, Some(Height::new(1, 55)));
    assert!(cursor.ack_height_a.is_some());
}
