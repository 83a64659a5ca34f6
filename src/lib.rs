//! Go-Back-N reliable delivery over an unreliable packet link.
//!
//! [`layer`] holds the sender and receiver state machines, [`protocol`] the
//! fixed-size wire format and its checksum, and [`sim`] a discrete-event
//! harness that runs both sides over a faulty link.

pub mod layer;
pub mod protocol;
pub mod sim;
pub mod utils;
