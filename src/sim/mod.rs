//! Discrete-event harness for one sender/receiver pair.
//!
//! Time is virtual: events are popped from [`EventQue`] in time order and the
//! clock jumps to each one. The two directions of the link fail
//! independently, and every random choice comes from one seeded [`SmallRng`],
//! so a run is reproducible from its [`SimConfig`].

mod event;
mod generator;
mod link;

use std::{collections::HashMap, fmt, time::Duration};

use rand::{rngs::SmallRng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    layer::{
        receiver, sender, BuildError, Builder, Receiver, SendError, Sender, Timer, UpperLayer,
    },
    protocol::packet::Packet,
    utils::MOD_N,
};
pub use event::*;
pub use generator::*;
pub use link::*;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub messages: usize,
    pub mean_msg_size: usize,
    pub mean_msg_interval: Duration,
    pub link: LinkConfig,
    pub seed: u64,
    pub protocol: Builder,
    /// Events scheduled after this are not run.
    pub max_time: Duration,
}

impl SimConfig {
    pub fn default() -> Self {
        SimConfig {
            messages: 200,
            mean_msg_size: 300,
            mean_msg_interval: Duration::from_millis(20),
            link: LinkConfig {
                drop_rate: 0.1,
                corrupt_rate: 0.1,
                reorder_rate: 0.05,
                delay: Duration::from_millis(10),
            },
            seed: 0xBAD5EED,
            protocol: Builder::default(),
            max_time: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("{name} must be within [0, 1], got {value}")]
    Rate { name: &'static str, value: f64 },
    #[error("window size {0} is too large for a reordering link")]
    ReorderWindow(usize),
}

/// Largest window that survives reordering. Beyond it a late ACK from the
/// previous lap of the sequence space can land inside the current window.
pub const MAX_REORDER_WINDOW: usize = MOD_N as usize / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Sender to receiver.
    Forward,
    /// Receiver to sender.
    Backward,
}

/// Arms the sender's timer as a keyed event, so a restart replaces the
/// pending firing.
struct SimTimer<'a> {
    events: &'a mut EventQue,
    now: Duration,
}

impl Timer for SimTimer<'_> {
    fn start(&mut self, timeout: Duration) {
        self.events.schedule(EventKey::Timer, self.now + timeout);
    }

    fn stop(&mut self) {
        self.events.cancel(&EventKey::Timer);
    }
}

#[derive(Default)]
struct Sink {
    stream: Vec<u8>,
}

impl UpperLayer for Sink {
    fn deliver_upward(&mut self, msg: &[u8]) {
        self.stream.extend_from_slice(msg);
    }
}

pub struct Simulation {
    sender: Sender,
    receiver: Receiver,
    forward: FaultyLink,
    backward: FaultyLink,
    msgs: MessageGen,
    rng: SmallRng,
    events: EventQue,
    in_flight: HashMap<u64, (Direction, Packet)>,
    next_transmission: u64,
    now: Duration,
    max_time: Duration,
    produced: Vec<u8>,
    rejected_bytes: u64,
    sink: Sink,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let (sender, receiver) = config.protocol.build()?;
        if config.link.reorder_rate > 0.0 && sender.window_size() > MAX_REORDER_WINDOW {
            return Err(SimError::ReorderWindow(sender.window_size()));
        }
        Ok(Simulation {
            sender,
            receiver,
            forward: FaultyLink::new(config.link.clone())?,
            backward: FaultyLink::new(config.link)?,
            msgs: MessageGen::new(config.messages, config.mean_msg_size, config.mean_msg_interval),
            rng: SmallRng::seed_from_u64(config.seed),
            events: EventQue::new(),
            in_flight: HashMap::new(),
            next_transmission: 0,
            now: Duration::ZERO,
            max_time: config.max_time,
            produced: Vec::new(),
            rejected_bytes: 0,
            sink: Sink::default(),
        })
    }

    /// Runs until no events remain or the time limit is reached.
    pub fn run(mut self) -> SimReport {
        self.events.schedule(EventKey::Produce, Duration::ZERO);
        let mut timed_out = false;
        while let Some((key, at)) = self.events.pop() {
            if at > self.max_time {
                warn!(now = ?self.now, pending = self.events.len() + 1, "time limit reached");
                timed_out = true;
                break;
            }
            self.now = at;
            match key {
                EventKey::Produce => self.on_produce(),
                EventKey::Timer => self.on_timer(),
                EventKey::Delivery(id) => self.on_delivery(id),
            }
        }

        let intact = !timed_out && self.sink.stream == self.produced;
        info!(
            now = ?self.now,
            produced = self.produced.len(),
            delivered = self.sink.stream.len(),
            intact,
            "simulation finished"
        );
        SimReport {
            bytes_produced: self.produced.len() as u64,
            bytes_rejected: self.rejected_bytes,
            bytes_delivered: self.sink.stream.len() as u64,
            intact,
            timed_out,
            elapsed: self.now,
            forward: self.forward.stat().clone(),
            backward: self.backward.stat().clone(),
            sender: self.sender.stat(),
            receiver: self.receiver.stat(),
        }
    }

    fn on_produce(&mut self) {
        let msg = match self.msgs.next_message(&mut self.rng) {
            Some(x) => x,
            None => return,
        };
        debug!(now = ?self.now, len = msg.len(), "produce");

        let mut outbox = Vec::new();
        let mut timer = SimTimer {
            events: &mut self.events,
            now: self.now,
        };
        match self.sender.on_message_from_upper(&msg, &mut outbox, &mut timer) {
            Ok(()) => self.produced.extend_from_slice(&msg),
            Err(SendError::BufferExhausted { rest }) => {
                let accepted = msg.len() - rest.len();
                self.produced.extend_from_slice(&msg[..accepted]);
                self.rejected_bytes += rest.len() as u64;
            }
        }
        self.transmit(Direction::Forward, outbox);

        if !self.msgs.is_done() {
            let interval = self.msgs.next_interval(&mut self.rng);
            self.events.schedule(EventKey::Produce, self.now + interval);
        }
    }

    fn on_timer(&mut self) {
        let mut outbox = Vec::new();
        let mut timer = SimTimer {
            events: &mut self.events,
            now: self.now,
        };
        self.sender.on_timeout(&mut outbox, &mut timer);
        self.transmit(Direction::Forward, outbox);
    }

    fn on_delivery(&mut self, id: u64) {
        let (direction, packet) = match self.in_flight.remove(&id) {
            Some(x) => x,
            None => return,
        };
        let mut outbox = Vec::new();
        match direction {
            Direction::Forward => {
                self.receiver.on_packet_from_link(&packet, &mut outbox, &mut self.sink);
                self.transmit(Direction::Backward, outbox);
            }
            Direction::Backward => {
                let mut timer = SimTimer {
                    events: &mut self.events,
                    now: self.now,
                };
                self.sender.on_packet_from_link(&packet, &mut outbox, &mut timer);
                self.transmit(Direction::Forward, outbox);
            }
        }
    }

    /// Hands `packets` to the link and schedules the survivors.
    fn transmit(&mut self, direction: Direction, packets: Vec<Packet>) {
        for packet in packets {
            let link = match direction {
                Direction::Forward => &mut self.forward,
                Direction::Backward => &mut self.backward,
            };
            match link.transmit(&packet, &mut self.rng) {
                Transmission::Dropped => (),
                Transmission::Delivered { packet, delay } => {
                    let id = self.next_transmission;
                    self.next_transmission += 1;
                    self.in_flight.insert(id, (direction, packet));
                    self.events.schedule(EventKey::Delivery(id), self.now + delay);
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct SimReport {
    /// Bytes accepted by the sender.
    pub bytes_produced: u64,
    /// Bytes refused because the overflow buffer was full.
    pub bytes_rejected: u64,
    pub bytes_delivered: u64,
    /// The delivered stream equals the accepted stream.
    pub intact: bool,
    pub timed_out: bool,
    pub elapsed: Duration,
    pub forward: LinkStat,
    pub backward: LinkStat,
    pub sender: sender::Stat,
    pub receiver: receiver::Stat,
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "elapsed:    {:?}", self.elapsed)?;
        writeln!(
            f,
            "bytes:      produced {} / delivered {} / rejected {}",
            self.bytes_produced, self.bytes_delivered, self.bytes_rejected
        )?;
        writeln!(
            f,
            "intact:     {}{}",
            self.intact,
            if self.timed_out { " (time limit reached)" } else { "" }
        )?;
        for (name, link) in [("data link", &self.forward), ("ack link", &self.backward)] {
            writeln!(
                f,
                "{:<11} sent {} / dropped {} / corrupted {} / reordered {}",
                format!("{}:", name),
                link.sent,
                link.dropped,
                link.corrupted,
                link.reordered
            )?;
        }
        writeln!(
            f,
            "sender:     pushes {} / retransmissions {} / timeouts {} / acks {} / dup acks {} / corrupted {} / ignored {}",
            self.sender.pushes,
            self.sender.retransmissions,
            self.sender.timeouts,
            self.sender.acks,
            self.sender.dup_acks,
            self.sender.corrupted,
            self.sender.ignored
        )?;
        write!(
            f,
            "receiver:   delivered {} packets ({} bytes) / dup acks {} / corrupted {}",
            self.receiver.delivered_packets,
            self.receiver.delivered_bytes,
            self.receiver.dup_acks,
            self.receiver.corrupted
        )
    }
}
