use serde_derive::{Deserialize, Serialize};

use crate::commitment::CommitmentProofBytes;
use crate::error::ValidationError;
use crate::height::Height;

/// The proof bundle attached to a handshake message: the proof of the
/// object itself (connection or channel end), optionally the proof of
/// the counterparty's client state and of one of its consensus states.
///
/// `height` is the height on the proving chain the proofs were generated
/// for; the destination verifies them against the consensus state it
/// stores for that height, so the destination's client must have been
/// updated to `height` before the message is submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proofs {
    object_proof: CommitmentProofBytes,
    client_proof: Option<CommitmentProofBytes>,
    consensus_proof: Option<ConsensusProof>,
    height: Height,
}

impl Proofs {
    pub fn new(
        object_proof: CommitmentProofBytes,
        client_proof: Option<CommitmentProofBytes>,
        consensus_proof: Option<ConsensusProof>,
        height: Height,
    ) -> Result<Self, ValidationError> {
        if height.is_zero() {
            return Err(ValidationError::zero_height());
        }

        Ok(Self {
            object_proof,
            client_proof,
            consensus_proof,
            height,
        })
    }

    pub fn height(&self) -> Height {
        self.height
    }

    pub fn object_proof(&self) -> &CommitmentProofBytes {
        &self.object_proof
    }

    pub fn client_proof(&self) -> Option<&CommitmentProofBytes> {
        self.client_proof.as_ref()
    }

    pub fn consensus_proof(&self) -> Option<&ConsensusProof> {
        self.consensus_proof.as_ref()
    }
}

/// Proof that the proving chain's client for the destination stores a
/// consensus state at `height`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusProof {
    pub proof: CommitmentProofBytes,
    pub height: Height,
}

impl ConsensusProof {
    pub fn new(proof: CommitmentProofBytes, height: Height) -> Result<Self, ValidationError> {
        if height.is_zero() {
            return Err(ValidationError::zero_height());
        }

        Ok(Self { proof, height })
    }
}
