use std::time::Duration;

use rand::{rngs::SmallRng, Rng};

/// Stands in for the application above the sender.
///
/// Message sizes are uniform in `1..=2 * mean_size` and gaps uniform in
/// `0..=2 * mean_interval`. Content is a function of the byte's position in
/// the overall stream, so misordered fragments show up as a stream mismatch.
pub struct MessageGen {
    remaining: usize,
    mean_size: usize,
    mean_interval: Duration,
    offset: u64,
}

impl MessageGen {
    #[must_use]
    pub fn new(messages: usize, mean_size: usize, mean_interval: Duration) -> Self {
        MessageGen {
            remaining: messages,
            mean_size,
            mean_interval,
            offset: 0,
        }
    }

    pub fn next_message(&mut self, rng: &mut SmallRng) -> Option<Vec<u8>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let len = rng.gen_range(1..=self.max_len());
        let msg = (self.offset..self.offset + len as u64)
            .map(stream_byte)
            .collect();
        self.offset += len as u64;
        Some(msg)
    }

    pub fn next_interval(&mut self, rng: &mut SmallRng) -> Duration {
        Duration::from_micros(rng.gen_range(0..=self.max_interval_micros()))
    }

    fn max_len(&self) -> usize {
        usize::max(1, self.mean_size.saturating_mul(2))
    }

    fn max_interval_micros(&self) -> u64 {
        u64::try_from(self.mean_interval.as_micros().saturating_mul(2)).unwrap_or(u64::MAX)
    }

    #[must_use]
    #[inline]
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// Byte at `offset` in the generated stream. The period is 251, which no
/// fragment size divides.
#[must_use]
pub fn stream_byte(offset: u64) -> u8 {
    (offset % 251) as u8
}
