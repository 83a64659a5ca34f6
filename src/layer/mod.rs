pub mod receiver;
pub mod sender;

use std::time::Duration;

use thiserror::Error;

use crate::protocol::packet::Packet;
pub use receiver::Receiver;
pub use sender::{SendError, Sender, SenderBuilder};

pub const DEFAULT_WINDOW_SIZE: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(300);
pub const DEFAULT_OVERFLOW_BUF_CAP: usize = 1_000_000;

/// The unreliable channel below both state machines.
///
/// Fire-and-forget: nothing about delivery is reported back.
pub trait LowerLayer {
    fn send_downward(&mut self, packet: &Packet);
}

/// The application consumer at the receiver.
pub trait UpperLayer {
    fn deliver_upward(&mut self, msg: &[u8]);
}

/// A single-shot timer owned by one sender.
///
/// Firing must call [`Sender::on_timeout`] once. `start` while running
/// replaces the pending firing; `stop` cancels it.
pub trait Timer {
    fn start(&mut self, timeout: Duration);
    fn stop(&mut self);
}

impl LowerLayer for Vec<Packet> {
    fn send_downward(&mut self, packet: &Packet) {
        self.push(packet.clone());
    }
}

impl UpperLayer for Vec<Vec<u8>> {
    fn deliver_upward(&mut self, msg: &[u8]) {
        self.push(msg.to_vec());
    }
}

#[derive(Debug, Clone)]
pub struct Builder {
    pub window_size: usize,
    pub timeout: Duration,
    pub overflow_buf_cap: usize,
}

impl Builder {
    pub fn build(self) -> Result<(Sender, Receiver), BuildError> {
        let sender = SenderBuilder {
            window_size: self.window_size,
            timeout: self.timeout,
            overflow_buf_cap: self.overflow_buf_cap,
        }
        .build()?;
        let receiver = Receiver::new();
        Ok((sender, receiver))
    }

    pub fn default() -> Self {
        Builder {
            window_size: DEFAULT_WINDOW_SIZE,
            timeout: DEFAULT_TIMEOUT,
            overflow_buf_cap: DEFAULT_OVERFLOW_BUF_CAP,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("window size {0} must be at least 1 and smaller than the sequence space")]
    WindowSize(usize),
    #[error("overflow buffer capacity must be at least 1")]
    OverflowBufCap,
    #[error("timeout must be non-zero")]
    Timeout,
}
