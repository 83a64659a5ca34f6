use std::time::Duration;

use rand::{rngs::SmallRng, Rng};
use tracing::trace;

use crate::protocol::{packet::Packet, PACKET_SIZE};

use super::SimError;

/// Per-direction fault model of the simulated link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Probability in `[0, 1]` that a packet is lost.
    pub drop_rate: f64,
    /// Probability in `[0, 1]` that one bit of a surviving packet is flipped.
    pub corrupt_rate: f64,
    /// Probability in `[0, 1]` that a packet is held back long enough for
    /// later packets to overtake it.
    pub reorder_rate: f64,
    /// One-way propagation delay.
    pub delay: Duration,
}

impl LinkConfig {
    #[must_use]
    pub fn perfect(delay: Duration) -> Self {
        LinkConfig {
            drop_rate: 0.0,
            corrupt_rate: 0.0,
            reorder_rate: 0.0,
            delay,
        }
    }

    fn check_rates(&self) -> Result<(), SimError> {
        let rates = [
            ("drop_rate", self.drop_rate),
            ("corrupt_rate", self.corrupt_rate),
            ("reorder_rate", self.reorder_rate),
        ];
        for (name, p) in rates {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::Rate { name, value: p });
            }
        }
        Ok(())
    }
}

/// What the link decided to do with one packet.
pub enum Transmission {
    Dropped,
    Delivered { packet: Packet, delay: Duration },
}

pub struct FaultyLink {
    config: LinkConfig,
    stat: LinkStat,
}

impl FaultyLink {
    pub fn new(config: LinkConfig) -> Result<Self, SimError> {
        config.check_rates()?;
        Ok(FaultyLink {
            config,
            stat: LinkStat::default(),
        })
    }

    pub fn transmit(&mut self, packet: &Packet, rng: &mut SmallRng) -> Transmission {
        self.stat.sent += 1;
        if rng.gen_bool(self.config.drop_rate) {
            self.stat.dropped += 1;
            trace!(seq = %packet.seq(), "link drop");
            return Transmission::Dropped;
        }

        let mut packet = packet.clone();
        if rng.gen_bool(self.config.corrupt_rate) {
            let bit = rng.gen_range(0..PACKET_SIZE * 8);
            let mut bytes = packet.to_bytes();
            bytes[bit / 8] ^= 1 << (bit % 8);
            if let Ok(flipped) = Packet::from_bytes(&bytes) {
                packet = flipped;
                self.stat.corrupted += 1;
                trace!(bit, "link corrupt");
            }
        }

        let mut delay = self.config.delay;
        if rng.gen_bool(self.config.reorder_rate) {
            delay += self.config.delay * rng.gen_range(1..=3);
            self.stat.reordered += 1;
        }
        Transmission::Delivered { packet, delay }
    }

    #[must_use]
    #[inline]
    pub fn stat(&self) -> &LinkStat {
        &self.stat
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LinkStat {
    pub sent: u64,
    pub dropped: u64,
    pub corrupted: u64,
    pub reordered: u64,
}
