use std::sync::Arc;

use ibc_link::chain::mock::MockChain;
use ibc_link::chain::ChainHandle;
use ibc_link::link::ChannelPair;
use ibc_link::{Link, Side};
use ibc_link_types::channel::Ordering;
use ibc_link_types::identifier::{ChainId, PortId};

pub use ibc_link::config::ICS20_VERSION;

pub fn spawn_chains() -> (Arc<MockChain>, Arc<MockChain>) {
    let chain_a = Arc::new(MockChain::new(ChainId::new("chaina", 1), 10));
    let chain_b = Arc::new(MockChain::new(ChainId::new("chainb", 2), 20));
    (chain_a, chain_b)
}

pub async fn bootstrap_link(
    chain_a: &Arc<MockChain>,
    chain_b: &Arc<MockChain>,
) -> Link {
    Link::create_with_new_connections(
        Arc::clone(chain_a) as Arc<dyn ChainHandle>,
        Arc::clone(chain_b) as Arc<dyn ChainHandle>,
    )
    .await
    .expect("connection bootstrap failed")
}

pub async fn open_transfer_channel(link: &Link) -> ChannelPair {
    link.create_channel(
        Side::A,
        PortId::transfer(),
        PortId::transfer(),
        Ordering::Unordered,
        ICS20_VERSION,
    )
    .await
    .expect("channel handshake failed")
}

/// The broadcast kinds on a chain with the client updates stripped out,
/// for asserting handshake sequences the way the scenarios state them.
pub fn tx_kinds_without_updates(chain: &MockChain) -> Vec<&'static str> {
    chain
        .tx_log()
        .into_iter()
        .map(|record| record.kind)
        .filter(|kind| *kind != "update_client")
        .collect()
}
