use std::fmt;

use serde_derive::{Deserialize, Serialize};
use subtle_encoding::{Encoding, Hex};

use crate::error::ValidationError;

fn fmt_hex(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let hex = Hex::upper_case()
        .encode_to_string(bytes)
        .map_err(|_| fmt::Error)?;
    write!(f, "{hex}")
}

/// An opaque hash as reported in block headers (app hash, validator-set
/// hash). Compared byte-wise; displayed as upper-case hex.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(Vec<u8>);

impl Hash {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Hash {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_hex(&self.0, f)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(")?;
        fmt_hex(&self.0, f)?;
        write!(f, ")")
    }
}

/// The root of a chain's state commitment tree, as recorded in a
/// consensus state. Matches the header app hash of the same height.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitmentRoot(Vec<u8>);

impl CommitmentRoot {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for CommitmentRoot {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for CommitmentRoot {
    fn from(hash: Hash) -> Self {
        Self(hash.0)
    }
}

impl fmt::Debug for CommitmentRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitmentRoot(")?;
        fmt_hex(&self.0, f)?;
        write!(f, ")")
    }
}

/// The key prefix under which a chain stores its IBC state, carried in
/// connection counterparties so proofs can be verified under it.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitmentPrefix(Vec<u8>);

impl CommitmentPrefix {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for CommitmentPrefix {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for CommitmentPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "CommitmentPrefix({s})"),
            Err(_) => {
                write!(f, "CommitmentPrefix(")?;
                fmt_hex(&self.0, f)?;
                write!(f, ")")
            }
        }
    }
}

/// Undecoded Merkle proof bytes, as returned by a chain query and
/// submitted verbatim in handshake and packet messages. Never empty.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitmentProofBytes(Vec<u8>);

impl CommitmentProofBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for CommitmentProofBytes {
    type Error = ValidationError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            Err(ValidationError::empty_proof())
        } else {
            Ok(Self(bytes))
        }
    }
}

impl fmt::Debug for CommitmentProofBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitmentProofBytes(")?;
        fmt_hex(&self.0, f)?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_bytes_reject_empty() {
        assert!(CommitmentProofBytes::try_from(Vec::new()).is_err());
        assert!(CommitmentProofBytes::try_from(vec![0u8]).is_ok());
    }

    #[test]
    fn hash_displays_hex() {
        let hash = Hash::new(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(hash.to_string(), "DEADBEEF");
    }
}
