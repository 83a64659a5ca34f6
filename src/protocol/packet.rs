use std::io::Cursor;

use thiserror::Error;

use crate::utils::Seq;

use super::{
    checksum,
    packet_hdr::{PacketHeader, PacketHeaderBuilder, PacketKind},
    DecodingError, HDR_LEN, MAX_PAYLOAD, PACKET_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    hdr: PacketHeader,
    payload: [u8; MAX_PAYLOAD],
}

pub struct PacketBuilder<'a> {
    pub kind: PacketKind,
    pub seq: Seq,
    pub payload: &'a [u8],
}

impl PacketBuilder<'_> {
    /// Builds the packet with its checksum already encoded.
    pub fn build(self) -> Result<Packet, PacketBuildError> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(PacketBuildError::PayloadTooLong(self.payload.len()));
        }
        let mut this = Packet::zeroed();
        this.fill(self.kind, self.seq, self.payload);
        Ok(this)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketBuildError {
    #[error("payload of {0} bytes does not fit in one packet")]
    PayloadTooLong(usize),
}

impl Packet {
    #[must_use]
    pub fn zeroed() -> Self {
        Packet {
            hdr: PacketHeader::zeroed(),
            payload: [0; MAX_PAYLOAD],
        }
    }

    /// A fresh acknowledgement for `seq`, checksum encoded.
    #[must_use]
    pub fn ack(seq: Seq) -> Self {
        let mut this = Packet::zeroed();
        this.fill(PacketKind::Ack, seq, &[]);
        this
    }

    /// Rewrites every field in place and encodes the checksum.
    ///
    /// `payload` must fit in [`MAX_PAYLOAD`].
    pub(crate) fn fill(&mut self, kind: PacketKind, seq: Seq, payload: &[u8]) {
        assert!(payload.len() <= MAX_PAYLOAD);
        self.hdr = PacketHeaderBuilder {
            payload_len: payload.len() as u8,
            kind,
            seq,
        }
        .build();
        self.payload[..payload.len()].copy_from_slice(payload);
        self.payload[payload.len()..].fill(0);
        checksum::encode_checksum(self);
    }

    /// Parses a wire packet. Only the length is checked; the checksum is left
    /// for the receiving state machine to verify.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, DecodingError> {
        if buf.len() != PACKET_SIZE {
            return Err(DecodingError::Length {
                expected: PACKET_SIZE,
                actual: buf.len(),
            });
        }
        let mut rdr = Cursor::new(buf);
        let hdr = PacketHeader::from_bytes(&mut rdr)?;
        let mut payload = [0; MAX_PAYLOAD];
        payload.copy_from_slice(&buf[HDR_LEN..]);
        Ok(Packet { hdr, payload })
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0; PACKET_SIZE];
        buf[..HDR_LEN].copy_from_slice(&self.hdr.to_bytes());
        buf[HDR_LEN..].copy_from_slice(&self.payload);
        buf
    }

    #[must_use]
    #[inline]
    pub fn hdr(&self) -> &PacketHeader {
        &self.hdr
    }

    #[must_use]
    #[inline]
    pub(crate) fn hdr_mut(&mut self) -> &mut PacketHeader {
        &mut self.hdr
    }

    #[must_use]
    #[inline]
    pub fn kind(&self) -> Option<PacketKind> {
        self.hdr.kind()
    }

    #[must_use]
    #[inline]
    pub fn seq(&self) -> Seq {
        self.hdr.seq()
    }

    #[must_use]
    #[inline]
    pub fn checksum(&self) -> u32 {
        self.hdr.checksum()
    }

    /// The length field clamped into `0..=MAX_PAYLOAD`.
    #[must_use]
    #[inline]
    pub fn payload_len(&self) -> usize {
        usize::min(self.hdr.payload_len() as usize, MAX_PAYLOAD)
    }

    #[must_use]
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_len()]
    }

    /// The whole payload block, meaningful or not.
    #[must_use]
    #[inline]
    pub fn payload_region(&self) -> &[u8; MAX_PAYLOAD] {
        &self.payload
    }

    /// Every byte except the checksum field, as two contiguous slices.
    #[must_use]
    pub fn checksummed_regions(&self) -> ([u8; 2], &[u8]) {
        (self.hdr.checksummed_bytes(), &self.payload[..])
    }
}
