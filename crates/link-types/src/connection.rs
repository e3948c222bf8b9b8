use std::fmt;
use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::commitment::CommitmentPrefix;
use crate::identifier::{ClientId, ConnectionId};

/// The version negotiated during the connection handshake. A single
/// version exists today; it is echoed through Try and Ack unchanged.
pub const DEFAULT_VERSION: &str = "1";

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    Init,
    TryOpen,
    Open,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Init => "INIT",
            State::TryOpen => "TRYOPEN",
            State::Open => "OPEN",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The remote half of a connection as recorded locally: which client the
/// counterparty uses to track us, the counterparty's connection id once
/// it has allocated one, and the key prefix its proofs verify under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub client_id: ClientId,
    pub connection_id: Option<ConnectionId>,
    pub prefix: CommitmentPrefix,
}

impl Counterparty {
    pub fn new(
        client_id: ClientId,
        connection_id: Option<ConnectionId>,
        prefix: CommitmentPrefix,
    ) -> Self {
        Self {
            client_id,
            connection_id,
            prefix,
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn connection_id(&self) -> Option<&ConnectionId> {
        self.connection_id.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEnd {
    pub state: State,
    pub client_id: ClientId,
    pub counterparty: Counterparty,
    pub versions: Vec<String>,
    pub delay_period: Duration,
}

impl ConnectionEnd {
    pub fn new(
        state: State,
        client_id: ClientId,
        counterparty: Counterparty,
        versions: Vec<String>,
        delay_period: Duration,
    ) -> Self {
        Self {
            state,
            client_id,
            counterparty,
            versions,
            delay_period,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn state_matches(&self, other: State) -> bool {
        self.state == other
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn counterparty(&self) -> &Counterparty {
        &self.counterparty
    }

    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }
}

/// A connection end paired with the id it is stored under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedConnectionEnd {
    pub connection_id: ConnectionId,
    pub connection_end: ConnectionEnd,
}

impl IdentifiedConnectionEnd {
    pub fn new(connection_id: ConnectionId, connection_end: ConnectionEnd) -> Self {
        Self {
            connection_id,
            connection_end,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn end(&self) -> &ConnectionEnd {
        &self.connection_end
    }
}
