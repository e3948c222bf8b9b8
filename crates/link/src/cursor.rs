use serde_derive::{Deserialize, Serialize};

use ibc_link_types::height::Height;

use crate::link::Side;

/// The progress cursor threaded through relay iterations.
///
/// Each field records the highest source height, inclusive, below which
/// the link has already processed events of that category; the next
/// iteration resumes its event queries at `field.increment()`. The
/// cursor is purely an optimization: discarding it is correct and only
/// costs re-querying (and re-filtering) old events.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayedHeights {
    pub packet_height_a: Option<Height>,
    pub packet_height_b: Option<Height>,
    pub ack_height_a: Option<Height>,
    pub ack_height_b: Option<Height>,
}

fn advance(field: &mut Option<Height>, observed: Option<Height>) {
    if let Some(observed) = observed {
        match field {
            Some(current) if *current >= observed => {}
            _ => *field = Some(observed),
        }
    }
}

impl RelayedHeights {
    /// The minimum height for the next packet-event query on `side`.
    pub fn next_packet_height(&self, side: Side) -> Option<Height> {
        self.packet_height(side).map(|h| h.increment())
    }

    /// The minimum height for the next ack-event query on `side`.
    pub fn next_ack_height(&self, side: Side) -> Option<Height> {
        self.ack_height(side).map(|h| h.increment())
    }

    pub fn packet_height(&self, side: Side) -> Option<Height> {
        match side {
            Side::A => self.packet_height_a,
            Side::B => self.packet_height_b,
        }
    }

    pub fn ack_height(&self, side: Side) -> Option<Height> {
        match side {
            Side::A => self.ack_height_a,
            Side::B => self.ack_height_b,
        }
    }

    /// Raises the packet cursor for `side` to `observed` if that is an
    /// advance; the cursor never moves backwards.
    pub fn advance_packet_height(&mut self, side: Side, observed: Option<Height>) {
        match side {
            Side::A => advance(&mut self.packet_height_a, observed),
            Side::B => advance(&mut self.packet_height_b, observed),
        }
    }

    /// Raises the ack cursor for `side`, same monotonicity rule.
    pub fn advance_ack_height(&mut self, side: Side, observed: Option<Height>) {
        match side {
            Side::A => advance(&mut self.ack_height_a, observed),
            Side::B => advance(&mut self.ack_height_b, observed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_only_moves_forward() {
        let mut cursor = RelayedHeights::default();

        cursor.advance_packet_height(Side::A, Some(Height::new(0, 10)));
        assert_eq!(cursor.packet_height_a, Some(Height::new(0, 10)));

        cursor.advance_packet_height(Side::A, Some(Height::new(0, 7)));
        assert_eq!(cursor.packet_height_a, Some(Height::new(0, 10)));

        cursor.advance_packet_height(Side::A, None);
        assert_eq!(cursor.packet_height_a, Some(Height::new(0, 10)));

        cursor.advance_packet_height(Side::A, Some(Height::new(0, 12)));
        assert_eq!(cursor.packet_height_a, Some(Height::new(0, 12)));

        // fields are independent
        assert_eq!(cursor.packet_height_b, None);
        assert_eq!(cursor.ack_height_a, None);
    }

    #[test]
    fn next_query_heights_resume_past_the_cursor() {
        let mut cursor = RelayedHeights::default();
        assert_eq!(cursor.next_packet_height(Side::A), None);

        cursor.advance_ack_height(Side::B, Some(Height::new(0, 20)));
        assert_eq!(cursor.next_ack_height(Side::B), Some(Height::new(0, 21)));
    }
}
