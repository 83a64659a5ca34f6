use tracing::{debug, trace};

use crate::{
    protocol::{checksum, packet::Packet, packet_hdr::PacketKind},
    utils::Seq,
};

use super::{LowerLayer, UpperLayer};

/// Go-Back-N receiver.
///
/// Accepts exactly the packet it expects next and acknowledges it. Anything
/// else that arrives intact is answered with an ACK for the last packet
/// accepted, so the sender learns where to go back to.
pub struct Receiver {
    expected: Seq,
    stat: LocalStat,
}

impl Receiver {
    #[must_use]
    pub fn new() -> Self {
        Receiver {
            expected: Seq::zero(),
            stat: LocalStat::default(),
        }
    }

    #[inline]
    fn check_rep(&self) {
        assert!(self.expected.is_valid());
    }

    pub fn on_packet_from_link(
        &mut self,
        packet: &Packet,
        lower: &mut impl LowerLayer,
        upper: &mut impl UpperLayer,
    ) {
        if !checksum::verify_checksum(packet) {
            self.stat.corrupted += 1;
            debug!(expected = %self.expected, "drop corrupted packet");
            return;
        }

        if packet.kind() == Some(PacketKind::Data) && packet.seq() == self.expected {
            let payload = packet.payload();
            upper.deliver_upward(payload);
            lower.send_downward(&Packet::ack(self.expected));
            trace!(seq = %self.expected, len = payload.len(), "deliver");
            self.stat.delivered_packets += 1;
            self.stat.delivered_bytes += payload.len() as u64;
            self.expected.increment();
        } else {
            let last = self.expected.prev();
            lower.send_downward(&Packet::ack(last));
            self.stat.dup_acks += 1;
            debug!(
                kind = ?packet.kind(),
                seq = %packet.seq(),
                expected = %self.expected,
                "unexpected packet, ack {}",
                last
            );
        }
        self.check_rep();
    }

    /// The only sequence number accepted as new data.
    #[must_use]
    #[inline]
    pub fn expected_seq(&self) -> Seq {
        self.expected
    }

    #[must_use]
    pub fn stat(&self) -> Stat {
        Stat {
            delivered_packets: self.stat.delivered_packets,
            delivered_bytes: self.stat.delivered_bytes,
            dup_acks: self.stat.dup_acks,
            corrupted: self.stat.corrupted,
            expected_seq: self.expected,
        }
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct LocalStat {
    delivered_packets: u64,
    delivered_bytes: u64,
    dup_acks: u64,
    corrupted: u64,
}

#[derive(Debug, PartialEq)]
pub struct Stat {
    pub delivered_packets: u64,
    pub delivered_bytes: u64,
    pub dup_acks: u64,
    pub corrupted: u64,
    pub expected_seq: Seq,
}

#[cfg(test)]
mod tests {
    use crate::protocol::{packet::PacketBuilder, MAX_PAYLOAD};

    use super::*;

    fn data(seq: u8, payload: &[u8]) -> Packet {
        PacketBuilder {
            kind: PacketKind::Data,
            seq: Seq::from_u8(seq),
            payload,
        }
        .build()
        .unwrap()
    }

    /// Rewrites byte 1 of an intact packet and re-encodes the checksum.
    fn with_kind_seq(packet: &Packet, kind_seq: u8) -> Packet {
        let mut bytes = packet.to_bytes();
        bytes[1] = kind_seq;
        let mut packet = Packet::from_bytes(&bytes).unwrap();
        checksum::encode_checksum(&mut packet);
        packet
    }

    fn ack_seqs(acks: &[Packet]) -> Vec<u8> {
        acks.iter().map(|p| p.seq().to_u8()).collect()
    }

    #[test]
    fn test_accept_expected() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();

        receiver.on_packet_from_link(&data(0, b"hello"), &mut acks, &mut upper);

        assert_eq!(upper, vec![b"hello".to_vec()]);
        assert_eq!(ack_seqs(&acks), vec![0]);
        assert_eq!(acks[0].kind(), Some(PacketKind::Ack));
        assert!(checksum::verify_checksum(&acks[0]));
        assert_eq!(receiver.expected_seq(), Seq::from_u8(1));
        let stat = receiver.stat();
        assert_eq!(stat.delivered_packets, 1);
        assert_eq!(stat.delivered_bytes, 5);
    }

    #[test]
    fn test_drop_corrupted() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();
        for i in 0..3u8 {
            receiver.on_packet_from_link(&data(i, &[i]), &mut acks, &mut upper);
        }
        acks.clear();

        let mut bytes = data(3, &[3; 20]).to_bytes();
        bytes[20] ^= 0x01;
        let corrupted = Packet::from_bytes(&bytes).unwrap();
        receiver.on_packet_from_link(&corrupted, &mut acks, &mut upper);

        assert!(acks.is_empty());
        assert_eq!(upper.len(), 3);
        assert_eq!(receiver.expected_seq(), Seq::from_u8(3));
        assert_eq!(receiver.stat().corrupted, 1);
    }

    #[test]
    fn test_duplicate() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();
        receiver.on_packet_from_link(&data(0, &[0]), &mut acks, &mut upper);
        receiver.on_packet_from_link(&data(1, &[1]), &mut acks, &mut upper);
        acks.clear();

        receiver.on_packet_from_link(&data(1, &[1]), &mut acks, &mut upper);

        assert_eq!(ack_seqs(&acks), vec![1]);
        assert_eq!(upper.len(), 2);
        assert_eq!(receiver.expected_seq(), Seq::from_u8(2));
        assert_eq!(receiver.stat().dup_acks, 1);
    }

    #[test]
    fn test_out_of_order_before_first_accept() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();

        receiver.on_packet_from_link(&data(4, &[4]), &mut acks, &mut upper);

        // nothing accepted yet, so the duplicate ACK wraps to the top of the ring
        assert_eq!(ack_seqs(&acks), vec![60]);
        assert!(upper.is_empty());
        assert_eq!(receiver.expected_seq(), Seq::zero());
    }

    #[test]
    fn test_seq_beyond_ring() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();
        receiver.on_packet_from_link(&data(0, &[0]), &mut acks, &mut upper);
        acks.clear();

        for seq in 61..=63u8 {
            let packet = with_kind_seq(&data(1, &[1]), seq);
            assert!(checksum::verify_checksum(&packet));
            receiver.on_packet_from_link(&packet, &mut acks, &mut upper);
        }

        assert_eq!(ack_seqs(&acks), vec![0, 0, 0]);
        assert_eq!(upper.len(), 1);
        assert_eq!(receiver.expected_seq(), Seq::from_u8(1));
    }

    #[test]
    fn test_non_data_kinds() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();

        // an ACK carrying the expected seq is not data
        receiver.on_packet_from_link(&Packet::ack(Seq::zero()), &mut acks, &mut upper);
        // kind codes 2 and 3 are invalid
        for kind in 2..=3u8 {
            let packet = with_kind_seq(&data(0, &[0]), kind << 6);
            assert_eq!(packet.kind(), None);
            receiver.on_packet_from_link(&packet, &mut acks, &mut upper);
        }

        assert_eq!(ack_seqs(&acks), vec![60, 60, 60]);
        assert!(upper.is_empty());
        assert_eq!(receiver.expected_seq(), Seq::zero());
        assert_eq!(receiver.stat().dup_acks, 3);
    }

    #[test]
    fn test_oversized_length_is_clamped() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();

        let mut bytes = data(0, &[9; 4]).to_bytes();
        bytes[0] = 0xff;
        let mut packet = Packet::from_bytes(&bytes).unwrap();
        checksum::encode_checksum(&mut packet);
        receiver.on_packet_from_link(&packet, &mut acks, &mut upper);

        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].len(), MAX_PAYLOAD);
        assert_eq!(&upper[0][..4], &[9; 4]);
        assert_eq!(ack_seqs(&acks), vec![0]);
    }

    #[test]
    fn test_wraparound() {
        let mut receiver = Receiver::new();
        let mut acks = Vec::new();
        let mut upper: Vec<Vec<u8>> = Vec::new();
        for i in 0..61u8 {
            receiver.on_packet_from_link(&data(i, &[i]), &mut acks, &mut upper);
        }
        assert_eq!(receiver.expected_seq(), Seq::zero());
        receiver.on_packet_from_link(&data(0, &[0]), &mut acks, &mut upper);
        assert_eq!(receiver.expected_seq(), Seq::from_u8(1));
        assert_eq!(acks.len(), 62);
        assert_eq!(acks[60].seq(), Seq::from_u8(60));
        assert_eq!(acks[61].seq(), Seq::zero());
    }
}
