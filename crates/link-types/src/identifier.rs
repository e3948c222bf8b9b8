use std::fmt;
use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Validation for all ICS-024 identifiers: a restricted character set and
/// per-kind length bounds. The path separator is rejected outright since
/// identifiers are used as segments of store paths.
fn validate_identifier(id: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::empty());
    }

    if id.contains('/') {
        return Err(ValidationError::contains_separator(id.to_string()));
    }

    if id.len() < min || id.len() > max {
        return Err(ValidationError::invalid_length(
            id.to_string(),
            id.len(),
            min,
            max,
        ));
    }

    let valid = |c: char| c.is_alphanumeric() || matches!(c, '.' | '_' | '+' | '-' | '#' | '[' | ']' | '<' | '>');
    if !id.chars().all(valid) {
        return Err(ValidationError::invalid_character(id.to_string()));
    }

    Ok(())
}

/// The identity of a chain, e.g. `ibc-0` or `cosmoshub-4`.
///
/// Chain identifiers in the `{name}-{revision}` epoch format carry the
/// revision number used by [`crate::Height`]; identifiers outside that
/// format have revision number zero.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChainId {
    id: String,
    version: u64,
}

impl ChainId {
    /// Builds a chain id in the epoch format: `{name}-{version}`.
    pub fn new(name: impl Into<String>, version: u64) -> Self {
        let id = format!("{}-{}", name.into(), version);
        Self { id, version }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// The revision number carried by this identifier, zero when the
    /// identifier is not in the epoch format.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Extracts the revision number from a raw chain id string.
    ///
    /// The epoch format is `{name}-{revision}` where revision is a
    /// decimal number without leading zeroes.
    pub fn chain_version(chain_id: &str) -> u64 {
        match chain_id.rsplit_once('-') {
            Some((name, version)) if !name.is_empty() && !version.starts_with('0') => {
                version.parse().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

impl FromStr for ChainId {
    type Err = ValidationError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        if id.is_empty() {
            return Err(ValidationError::empty());
        }

        Ok(Self {
            id: id.to_string(),
            version: Self::chain_version(id),
        })
    }
}

impl From<String> for ChainId {
    fn from(id: String) -> Self {
        Self {
            version: Self::chain_version(&id),
            id,
        }
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.id
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// The id allocated to the `counter`-th Tendermint client created on
    /// a chain: `07-tendermint-{counter}`.
    pub fn new(counter: u64) -> Self {
        Self(format!("07-tendermint-{counter}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClientId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, 9, 64).map(|_| Self(s.to_string()))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for ClientId {
    fn eq(&self, other: &str) -> bool {
        self.as_str().eq(other)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// The id allocated to the `counter`-th connection initialized on a
    /// chain: `connection-{counter}`.
    pub fn new(counter: u64) -> Self {
        Self(format!("connection-{counter}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ConnectionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, 10, 64).map(|_| Self(s.to_string()))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for ConnectionId {
    fn eq(&self, other: &str) -> bool {
        self.as_str().eq(other)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortId(String);

impl PortId {
    pub fn transfer() -> Self {
        Self("transfer".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PortId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, 2, 128).map(|_| Self(s.to_string()))
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    /// The id allocated to the `counter`-th channel initialized on a
    /// chain: `channel-{counter}`.
    pub fn new(counter: u64) -> Self {
        Self(format!("channel-{counter}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChannelId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, 8, 64).map(|_| Self(s.to_string()))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for ChannelId {
    fn eq(&self, other: &str) -> bool {
        self.as_str().eq(other)
    }
}

/// A `(port, channel)` pair, the coordinate of one channel end.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortChannelId {
    pub port_id: PortId,
    pub channel_id: ChannelId,
}

impl PortChannelId {
    pub fn new(port_id: PortId, channel_id: ChannelId) -> Self {
        Self {
            port_id,
            channel_id,
        }
    }
}

impl fmt::Display for PortChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port_id, self.channel_id)
    }
}
