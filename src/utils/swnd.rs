use crate::protocol::packet::Packet;
use crate::protocol::packet_hdr::PacketKind;
use crate::utils::{between, Seq, MOD_N};

/// Outstanding window: a ring of `MOD_N` packet slots indexed by sequence number.
///
/// The outstanding slots are always the contiguous range `[start, end)`.
pub struct Swnd {
    slots: Vec<Packet>,
    start: Seq,
    end: Seq, // exclusive
    size: usize,
    wnd_size_cap: usize,
}

impl Swnd {
    fn check_rep(&self) {
        assert!(self.size <= self.wnd_size_cap);
        assert!(self.wnd_size_cap < MOD_N as usize);
        assert_eq!(self.end.sub_seq(self.start) as usize, self.size);
    }

    #[must_use]
    pub fn new(wnd_size_cap: usize) -> Self {
        let this = Swnd {
            slots: vec![Packet::zeroed(); MOD_N as usize],
            start: Seq::zero(),
            end: Seq::zero(),
            size: 0,
            wnd_size_cap,
        };
        this.check_rep();
        this
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    #[inline]
    pub fn is_full(&self) -> bool {
        self.wnd_size_cap <= self.size
    }

    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    #[inline]
    pub fn start(&self) -> Seq {
        self.start
    }

    #[must_use]
    #[inline]
    pub fn end(&self) -> Seq {
        self.end
    }

    /// Fills the slot at `end` with a data packet and advances `end`.
    ///
    /// `payload` must fit in one packet.
    pub fn push_back(&mut self, payload: &[u8]) -> &Packet {
        assert!(!self.is_full());
        let seq = self.end;
        self.slots[seq.to_u8() as usize].fill(PacketKind::Data, seq, payload);
        self.end.increment();
        self.size += 1;
        self.check_rep();
        &self.slots[seq.to_u8() as usize]
    }

    /// Retires every outstanding slot up to and including `ack`.
    ///
    /// Returns how many slots were freed; `0` when `ack` is outside `[start, end)`.
    pub fn remove_through(&mut self, ack: Seq) -> usize {
        let mut freed = 0;
        while between(self.start, ack, self.end) {
            self.start.increment();
            self.size -= 1;
            freed += 1;
        }
        self.check_rep();
        freed
    }

    /// Outstanding packets from `start` onwards.
    pub fn iter(&self) -> impl Iterator<Item = &Packet> + '_ {
        (0..self.size).map(move |i| &self.slots[self.start.add_u8(i as u8).to_u8() as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut swnd = Swnd::new(3);
        for i in 0..3u8 {
            let packet = swnd.push_back(&[i]);
            assert_eq!(packet.seq(), Seq::from_u8(i));
        }
        assert!(swnd.is_full());
        assert_eq!(swnd.size(), 3);
        assert_eq!(swnd.end(), Seq::from_u8(3));
    }

    #[test]
    fn test_cumulative_remove() {
        let mut swnd = Swnd::new(5);
        for i in 0..5u8 {
            swnd.push_back(&[i]);
        }
        assert_eq!(swnd.remove_through(Seq::from_u8(2)), 3);
        assert_eq!(swnd.start(), Seq::from_u8(3));
        assert_eq!(swnd.size(), 2);
        let left: Vec<u8> = swnd.iter().map(|p| p.payload()[0]).collect();
        assert_eq!(left, vec![3, 4]);
    }

    #[test]
    fn test_remove_outside_range() {
        let mut swnd = Swnd::new(5);
        swnd.push_back(&[0]);
        swnd.push_back(&[1]);
        swnd.remove_through(Seq::from_u8(0));
        // already retired
        assert_eq!(swnd.remove_through(Seq::from_u8(0)), 0);
        // never sent
        assert_eq!(swnd.remove_through(Seq::from_u8(9)), 0);
        assert_eq!(swnd.size(), 1);
    }

    #[test]
    fn test_full_window_across_seam() {
        let cap = MOD_N as usize - 1;
        let mut swnd = Swnd::new(cap);
        for _ in 0..30 {
            swnd.push_back(&[0]);
            swnd.remove_through(swnd.start());
        }
        for _ in 0..5 {
            let start = swnd.start();
            for i in 0..cap {
                swnd.push_back(&[i as u8]);
            }
            assert!(swnd.is_full());
            assert_eq!(swnd.end(), start.prev());
            let seqs: Vec<Seq> = swnd.iter().map(|p| p.seq()).collect();
            let expected: Vec<Seq> = (0..cap).map(|i| start.add_u8(i as u8)).collect();
            assert_eq!(seqs, expected);

            let last = start.add_u8(cap as u8 - 1);
            assert_eq!(swnd.remove_through(last), cap);
            assert!(swnd.is_empty());
            assert_eq!(swnd.start(), start.prev());
        }
    }

    #[test]
    fn test_wraparound() {
        let mut swnd = Swnd::new(5);
        for _ in 0..58 {
            swnd.push_back(&[0]);
            swnd.remove_through(swnd.start());
        }
        assert_eq!(swnd.start(), Seq::from_u8(58));
        for i in 0..5u8 {
            swnd.push_back(&[i]);
        }
        let seqs: Vec<u8> = swnd.iter().map(|p| p.seq().to_u8()).collect();
        assert_eq!(seqs, vec![58, 59, 60, 0, 1]);
        assert_eq!(swnd.remove_through(Seq::from_u8(0)), 4);
        assert_eq!(swnd.start(), Seq::from_u8(1));
        assert_eq!(swnd.size(), 1);
    }
}
