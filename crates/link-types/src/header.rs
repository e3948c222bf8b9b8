use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::commitment::Hash;
use crate::height::Height;
use crate::timestamp::Timestamp;

/// The slice of a signed block header the relayer cares about: enough to
/// advance a light client and to cross-check stored consensus states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub height: Height,
    pub time: Timestamp,
    pub app_hash: Hash,
    pub next_validators_hash: Hash,
}

impl Header {
    pub fn height(&self) -> Height {
        self.height
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Header {{ height: {}, time: {} }}", self.height, self.time)
    }
}
