use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::utils::Seq;

use super::{DecodingError, HDR_LEN};

const KIND_SHIFT: u8 = 6;
const KIND_MASK: u8 = 0b11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PacketKind {
    Data = 0,
    Ack = 1,
}

/// Header fields exactly as they sit on the wire.
///
/// `kind_seq` is kept packed so that a corrupted kind code (2 or 3) survives
/// decoding and can be rejected by whoever interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    payload_len: u8,
    kind_seq: u8,
    checksum: u32,
}

pub struct PacketHeaderBuilder {
    pub payload_len: u8,
    pub kind: PacketKind,
    pub seq: Seq,
}

impl PacketHeaderBuilder {
    #[must_use]
    pub fn build(self) -> PacketHeader {
        let kind: u8 = self.kind.into();
        PacketHeader {
            payload_len: self.payload_len,
            kind_seq: (kind << KIND_SHIFT) | Seq::from_wire(self.seq.to_u8()).to_u8(),
            checksum: 0,
        }
    }
}

impl PacketHeader {
    #[must_use]
    pub fn zeroed() -> Self {
        PacketHeader {
            payload_len: 0,
            kind_seq: 0,
            checksum: 0,
        }
    }

    pub fn from_bytes(rdr: &mut Cursor<&[u8]>) -> Result<Self, DecodingError> {
        let payload_len = rdr
            .read_u8()
            .map_err(|_e| DecodingError::Decoding { field: "len" })?;
        let kind_seq = rdr
            .read_u8()
            .map_err(|_e| DecodingError::Decoding { field: "kind_seq" })?;
        let checksum = rdr
            .read_u32::<LittleEndian>()
            .map_err(|_e| DecodingError::Decoding { field: "checksum" })?;
        Ok(PacketHeader {
            payload_len,
            kind_seq,
            checksum,
        })
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut hdr = Vec::with_capacity(HDR_LEN);
        hdr.write_u8(self.payload_len).unwrap();
        hdr.write_u8(self.kind_seq).unwrap();
        hdr.write_u32::<LittleEndian>(self.checksum).unwrap();
        assert_eq!(hdr.len(), HDR_LEN);
        hdr
    }

    /// The header bytes covered by the checksum, in wire order.
    #[must_use]
    #[inline]
    pub fn checksummed_bytes(&self) -> [u8; 2] {
        [self.payload_len, self.kind_seq]
    }

    #[must_use]
    #[inline]
    pub fn payload_len(&self) -> u8 {
        self.payload_len
    }

    /// `None` for the two codes the 2-bit field can hold but the protocol never sends.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> Option<PacketKind> {
        PacketKind::try_from((self.kind_seq >> KIND_SHIFT) & KIND_MASK).ok()
    }

    #[must_use]
    #[inline]
    pub fn seq(&self) -> Seq {
        Seq::from_wire(self.kind_seq)
    }

    #[must_use]
    #[inline]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    #[inline]
    pub(crate) fn set_checksum(&mut self, checksum: u32) {
        self.checksum = checksum;
    }
}
