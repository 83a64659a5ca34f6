use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    protocol::{checksum, packet::Packet, packet_hdr::PacketKind, MAX_PAYLOAD},
    utils::{OverflowQue, PushError, Seq, Swnd, MOD_N},
};

use super::{
    BuildError, LowerLayer, Timer, DEFAULT_OVERFLOW_BUF_CAP, DEFAULT_TIMEOUT, DEFAULT_WINDOW_SIZE,
};

/// Go-Back-N sender.
///
/// Data moves upper layer -> overflow buffer -> outstanding window -> link.
/// The overflow buffer is only used while the window is full, so fragments
/// enter the window in the order they arrived.
pub struct Sender {
    swnd: Swnd,
    overflow: OverflowQue,
    window_size: usize,
    timeout: Duration,
    stat: LocalStat,
}

pub struct SenderBuilder {
    pub window_size: usize,
    pub timeout: Duration,
    pub overflow_buf_cap: usize,
}

impl SenderBuilder {
    pub fn build(self) -> Result<Sender, BuildError> {
        if !(1..MOD_N as usize).contains(&self.window_size) {
            return Err(BuildError::WindowSize(self.window_size));
        }
        if self.overflow_buf_cap == 0 {
            return Err(BuildError::OverflowBufCap);
        }
        if self.timeout.is_zero() {
            return Err(BuildError::Timeout);
        }
        let this = Sender {
            swnd: Swnd::new(self.window_size),
            overflow: OverflowQue::new(self.overflow_buf_cap),
            window_size: self.window_size,
            timeout: self.timeout,
            stat: LocalStat::default(),
        };
        this.check_rep();
        Ok(this)
    }

    #[must_use]
    pub fn default() -> SenderBuilder {
        SenderBuilder {
            window_size: DEFAULT_WINDOW_SIZE,
            timeout: DEFAULT_TIMEOUT,
            overflow_buf_cap: DEFAULT_OVERFLOW_BUF_CAP,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The producer outran the protocol. `rest` holds the bytes of the message
    /// that were not accepted; everything before them was.
    #[error("overflow buffer exhausted")]
    BufferExhausted { rest: Vec<u8> },
}

impl Sender {
    #[inline]
    fn check_rep(&self) {
        assert!(self.swnd.size() <= self.window_size);
        assert!(self.overflow.is_empty() || self.swnd.is_full());
    }

    /// Fragments `msg` and admits each fragment into the window, or queues it
    /// in the overflow buffer while the window is full.
    pub fn on_message_from_upper(
        &mut self,
        msg: &[u8],
        lower: &mut impl LowerLayer,
        timer: &mut impl Timer,
    ) -> Result<(), SendError> {
        let mut cursor = 0;
        for frag in msg.chunks(MAX_PAYLOAD) {
            self.drain_overflow(lower, timer);
            if !self.swnd.is_full() {
                self.admit(frag, lower, timer);
            } else if let Err(PushError(_)) = self.overflow.push_back(frag.to_vec()) {
                let rest = msg[cursor..].to_vec();
                warn!(
                    rejected = rest.len(),
                    buffered = self.overflow.len(),
                    "overflow buffer exhausted"
                );
                self.check_rep();
                return Err(SendError::BufferExhausted { rest });
            } else {
                trace!(len = frag.len(), buffered = self.overflow.len(), "buffer");
            }
            cursor += frag.len();
        }
        self.check_rep();
        Ok(())
    }

    /// Handles a packet from the link. Only intact ACKs are acted on.
    pub fn on_packet_from_link(
        &mut self,
        packet: &Packet,
        lower: &mut impl LowerLayer,
        timer: &mut impl Timer,
    ) {
        if !checksum::verify_checksum(packet) {
            self.stat.corrupted += 1;
            debug!("drop corrupted ack");
            return;
        }
        if packet.kind() != Some(PacketKind::Ack) {
            self.stat.ignored += 1;
            debug!(kind = ?packet.kind(), "ignore non-ack packet");
            return;
        }

        timer.stop();
        let freed = self.swnd.remove_through(packet.seq());
        if freed == 0 {
            self.stat.dup_acks += 1;
        }
        self.stat.acks += 1;
        trace!(
            seq = %packet.seq(),
            freed,
            ack_expected = %self.swnd.start(),
            "ack"
        );

        self.drain_overflow(lower, timer);
        if !self.swnd.is_empty() {
            timer.start(self.timeout);
        }
        self.check_rep();
    }

    /// Resends the whole outstanding window, oldest first.
    pub fn on_timeout(&mut self, lower: &mut impl LowerLayer, timer: &mut impl Timer) {
        timer.stop();
        self.stat.timeouts += 1;
        debug!(
            from = %self.swnd.start(),
            count = self.swnd.size(),
            "timeout, go back"
        );
        for packet in self.swnd.iter() {
            lower.send_downward(packet);
            self.stat.retransmissions += 1;
        }
        if !self.swnd.is_empty() {
            timer.start(self.timeout);
        }
        self.check_rep();
    }

    fn drain_overflow(&mut self, lower: &mut impl LowerLayer, timer: &mut impl Timer) {
        while !self.swnd.is_full() {
            let frag = match self.overflow.pop_front() {
                Some(x) => x,
                None => break,
            };
            self.admit(&frag, lower, timer);
        }
    }

    /// Assigns the next sequence number to `frag` and sends it.
    fn admit(&mut self, frag: &[u8], lower: &mut impl LowerLayer, timer: &mut impl Timer) {
        let was_idle = self.swnd.is_empty();
        let packet = self.swnd.push_back(frag);
        trace!(seq = %packet.seq(), len = frag.len(), "push");
        lower.send_downward(packet);
        if was_idle {
            timer.start(self.timeout);
        }
        self.stat.pushes += 1;
    }

    #[must_use]
    #[inline]
    pub fn ack_expected(&self) -> Seq {
        self.swnd.start()
    }

    #[must_use]
    #[inline]
    pub fn next_to_send(&self) -> Seq {
        self.swnd.end()
    }

    #[must_use]
    #[inline]
    pub fn outstanding_count(&self) -> usize {
        self.swnd.size()
    }

    #[must_use]
    #[inline]
    pub fn buffered_count(&self) -> usize {
        self.overflow.len()
    }

    #[must_use]
    #[inline]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    #[must_use]
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Nothing outstanding and nothing waiting for the window.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.swnd.is_empty() && self.overflow.is_empty()
    }

    /// Outstanding packets in sequence order.
    pub fn outstanding(&self) -> impl Iterator<Item = &Packet> + '_ {
        self.swnd.iter()
    }

    #[must_use]
    pub fn stat(&self) -> Stat {
        Stat {
            pushes: self.stat.pushes,
            retransmissions: self.stat.retransmissions,
            timeouts: self.stat.timeouts,
            acks: self.stat.acks,
            dup_acks: self.stat.dup_acks,
            corrupted: self.stat.corrupted,
            ignored: self.stat.ignored,
            next_seq_to_send: self.swnd.end(),
        }
    }
}

#[derive(Default)]
struct LocalStat {
    pushes: u64,
    retransmissions: u64,
    timeouts: u64,
    acks: u64,
    dup_acks: u64,
    corrupted: u64,
    ignored: u64,
}

#[derive(Debug, PartialEq)]
pub struct Stat {
    pub pushes: u64,
    pub retransmissions: u64,
    pub timeouts: u64,
    pub acks: u64,
    pub dup_acks: u64,
    pub corrupted: u64,
    pub ignored: u64,
    pub next_seq_to_send: Seq,
}
