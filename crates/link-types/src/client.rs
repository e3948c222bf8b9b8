use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::commitment::{CommitmentRoot, Hash};
use crate::header::Header;
use crate::height::Height;
use crate::identifier::ChainId;
use crate::timestamp::Timestamp;

/// The client state of a Tendermint light client hosted on a chain,
/// tracking the remote chain named by `chain_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    pub chain_id: ChainId,
    pub latest_height: Height,
    pub trusting_period: Duration,
    pub unbonding_period: Duration,
}

impl ClientState {
    pub fn latest_height(&self) -> Height {
        self.latest_height
    }
}

/// A snapshot of the remote chain's consensus at one height, stored by a
/// light client and used as the verification anchor for Merkle proofs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    pub timestamp: Timestamp,
    pub root: CommitmentRoot,
    pub next_validators_hash: Hash,
}

impl ConsensusState {
    /// The consensus state a verified header induces.
    pub fn from_header(header: &Header) -> Self {
        Self {
            timestamp: header.time,
            root: CommitmentRoot::from(header.app_hash.clone()),
            next_validators_hash: header.next_validators_hash.clone(),
        }
    }
}
