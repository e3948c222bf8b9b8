use std::fmt;
use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The bech32 account address a chain's transactions are signed under.
/// Kept opaque; the relayer only threads it into messages.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signer(String);

impl Signer {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Signer {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::empty());
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
