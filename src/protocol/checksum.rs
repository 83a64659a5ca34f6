//! Word-sum checksum over every packet byte except the checksum field.
//!
//! The regions are folded in wire order with wrapping `u32` additions:
//!
//! 1. the two header bytes (`len`, `kind|seq`) as one little-endian `u16`
//! 2. the first two payload bytes as one little-endian `u16`
//! 3. the rest of the payload as little-endian `u32` words, a short tail
//!    zero-padded
//!
//! With [`super::MAX_PAYLOAD`] = 122 the tail is exactly 30 words. A single
//! flipped bit moves the sum by a power of two, so it is always detected.

use byteorder::{ByteOrder, LittleEndian};

use super::packet::Packet;

#[must_use]
fn compute(packet: &Packet) -> u32 {
    let (hdr, payload) = packet.checksummed_regions();
    let mut sum = LittleEndian::read_u16(&hdr) as u32;

    let (head, tail) = payload.split_at(usize::min(2, payload.len()));
    let mut head_word = [0u8; 2];
    head_word[..head.len()].copy_from_slice(head);
    sum = sum.wrapping_add(LittleEndian::read_u16(&head_word) as u32);

    for chunk in tail.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(LittleEndian::read_u32(&word));
    }
    sum
}

/// Computes the checksum, stores it in the packet and returns it.
pub fn encode_checksum(packet: &mut Packet) -> u32 {
    let sum = compute(packet);
    packet.hdr_mut().set_checksum(sum);
    sum
}

#[must_use]
pub fn verify_checksum(packet: &Packet) -> bool {
    compute(packet) == packet.checksum()
}
