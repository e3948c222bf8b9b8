use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::identifier::{ChannelId, ConnectionId, PortId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    Init,
    TryOpen,
    Open,
    Closed,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Init => "INIT",
            State::TryOpen => "TRYOPEN",
            State::Open => "OPEN",
            State::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether packet delivery must follow send order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ordering {
    #[default]
    Unordered,
    Ordered,
}

impl Ordering {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ordering::Unordered => "ORDER_UNORDERED",
            Ordering::Ordered => "ORDER_ORDERED",
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The remote half of a channel: its port, and its channel id once the
/// counterparty has allocated one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub port_id: PortId,
    pub channel_id: Option<ChannelId>,
}

impl Counterparty {
    pub fn new(port_id: PortId, channel_id: Option<ChannelId>) -> Self {
        Self {
            port_id,
            channel_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEnd {
    pub state: State,
    pub ordering: Ordering,
    pub remote: Counterparty,
    pub connection_hops: Vec<ConnectionId>,
    pub version: String,
}

impl ChannelEnd {
    pub fn new(
        state: State,
        ordering: Ordering,
        remote: Counterparty,
        connection_hops: Vec<ConnectionId>,
        version: String,
    ) -> Self {
        Self {
            state,
            ordering,
            remote,
            connection_hops,
            version,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn state_matches(&self, other: State) -> bool {
        self.state == other
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    pub fn counterparty(&self) -> &Counterparty {
        &self.remote
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The single connection this channel runs over.
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        self.connection_hops.first()
    }

    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }
}
