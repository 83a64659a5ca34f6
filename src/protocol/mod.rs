//! # Packet
//!
//! Every packet on the link has the same size, [`PACKET_SIZE`].
//!
//! ```text
//! 0       1       2                               6           128 (BYTE)
//! +-------+-------+-------------------------------+------ ... --+
//! |  len  |k| seq |           checksum            |  payload    |
//! +-------+-------+-------------------------------+------ ... --+
//! ```
//!
//! - `len`: meaningful payload bytes, `0..=MAX_PAYLOAD`
//! - `k`: bits 7-6 of byte 1, the [`packet_hdr::PacketKind`]
//! - `seq`: bits 5-0 of byte 1
//! - `checksum`: little-endian `u32`, see [`checksum`]
//!
//! # Invariants
//!
//! - `checksum` covers every other byte at the moment of transmission
//! - `kind`, `seq` and `payload` are meaningless until the checksum verifies

use thiserror::Error;

pub mod checksum;
pub mod packet;
pub mod packet_hdr;

pub const PACKET_SIZE: usize = 128;
pub const HDR_LEN: usize = 6;
pub const MAX_PAYLOAD: usize = PACKET_SIZE - HDR_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodingError {
    #[error("packet must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("failed to decode field `{field}`")]
    Decoding { field: &'static str },
}
