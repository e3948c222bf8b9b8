use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::height::Height;
use crate::identifier::{ChannelId, PortId};
use crate::timestamp::Timestamp;

/// The monotonically increasing per-channel packet sequence.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Sequence(u64);

impl Sequence {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn increment(&self) -> Sequence {
        Sequence(self.0 + 1)
    }
}

impl From<u64> for Sequence {
    fn from(seq: u64) -> Self {
        Sequence(seq)
    }
}

impl From<Sequence> for u64 {
    fn from(seq: Sequence) -> Self {
        seq.0
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub sequence: Sequence,
    pub source_port: PortId,
    pub source_channel: ChannelId,
    pub destination_port: PortId,
    pub destination_channel: ChannelId,
    pub data: Vec<u8>,
    pub timeout_height: Option<Height>,
    pub timeout_timestamp: Timestamp,
}

impl Packet {
    /// The identity under which the destination chain records the
    /// receipt of this packet.
    pub fn receive_key(&self) -> (PortId, ChannelId, Sequence) {
        (
            self.destination_port.clone(),
            self.destination_channel.clone(),
            self.sequence,
        )
    }

    /// The identity under which the sending chain keeps the packet
    /// commitment and later consumes the acknowledgment.
    pub fn ack_key(&self) -> (PortId, ChannelId, Sequence) {
        (
            self.source_port.clone(),
            self.source_channel.clone(),
            self.sequence,
        )
    }

    /// Whether the packet can no longer be received on the destination,
    /// judged against the destination's current height and block time.
    pub fn timed_out(&self, dst_height: Height, dst_time: &Timestamp) -> bool {
        if let Some(timeout_height) = self.timeout_height {
            if dst_height >= timeout_height {
                return true;
            }
        }

        if self.timeout_timestamp.is_set() && dst_time.is_set() {
            return dst_time >= &self.timeout_timestamp;
        }

        false
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seq:{} {}/{} -> {}/{}",
            self.sequence,
            self.source_port,
            self.source_channel,
            self.destination_port,
            self.destination_channel,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_packet() -> Packet {
        Packet {
            sequence: Sequence::from(4),
            source_port: PortId::transfer(),
            source_channel: ChannelId::from_str("channel-0").unwrap(),
            destination_port: PortId::transfer(),
            destination_channel: ChannelId::from_str("channel-5").unwrap(),
            data: b"value".to_vec(),
            timeout_height: Some(Height::new(0, 100)),
            timeout_timestamp: Timestamp::none(),
        }
    }

    #[test]
    fn timeout_against_destination_height() {
        let packet = sample_packet();
        let now = Timestamp::from_seconds(1_600_000_000);

        assert!(!packet.timed_out(Height::new(0, 99), &now));
        assert!(packet.timed_out(Height::new(0, 100), &now));
        assert!(packet.timed_out(Height::new(0, 101), &now));
    }

    #[test]
    fn timeout_against_destination_time() {
        let mut packet = sample_packet();
        packet.timeout_height = None;
        packet.timeout_timestamp = Timestamp::from_seconds(1_600_000_100);

        assert!(!packet.timed_out(Height::new(0, 1), &Timestamp::from_seconds(1_600_000_099)));
        assert!(packet.timed_out(Height::new(0, 1), &Timestamp::from_seconds(1_600_000_100)));

        // packets without any timeout never expire
        packet.timeout_timestamp = Timestamp::none();
        assert!(!packet.timed_out(Height::new(9, 9), &Timestamp::now()));
    }
}
