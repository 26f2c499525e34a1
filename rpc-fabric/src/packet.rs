//! Wire layout of an RPC packet: 13-byte header plus a method-specific payload.

/// Constant sync value at the front of every packet header. Not a reliable
/// delimiter by itself — [`byte_framer`] supplies delimitation — but it lets
/// a parser sanity-check that it's looking at a packet and not raw noise.
pub const MAGIC: u16 = 0xABCD;
/// Size of the fixed packet header in bytes.
pub const HEADER_LEN: usize = 13;
/// Implementation ceiling on total packet length (header + payload).
///
/// Bounded by the byte-framer's content capacity, not picked independently:
/// a packet is always framed before it goes on the wire, so it can never
/// exceed what `byte_framer::MAX_CONTENT_LEN` can carry as frame content.
pub const MAX_PACKET_LEN: usize = byte_framer::MAX_CONTENT_LEN;

/// Bit 0 of the flags byte: this packet is a reply rather than a request.
pub const FLAG_REPLY: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Total length is below the header size or above [`MAX_PACKET_LEN`].
    InvalidLength,
    /// Header bytes shorter than [`HEADER_LEN`].
    Truncated,
}

/// Parsed packet header. The payload is never copied here; callers index
/// into the original buffer with [`PacketHeader::payload_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub length: u16,
    pub provider_id: u16,
    pub method_id: u16,
    pub flags: u8,
    pub call_id: u32,
}

impl PacketHeader {
    pub fn is_reply(&self) -> bool {
        self.flags & FLAG_REPLY != 0
    }

    /// Byte range of the payload within a buffer that starts at this header.
    pub fn payload_range(&self) -> core::ops::Range<usize> {
        HEADER_LEN..self.length as usize
    }

    /// Parse a header from the front of `bytes`. Does not require `bytes` to
    /// contain the full payload — only the header plus however much of the
    /// payload the caller has buffered matters for later decoding.
    pub fn parse(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < HEADER_LEN {
            return Err(PacketError::Truncated);
        }
        let length = u16::from_le_bytes([bytes[2], bytes[3]]);
        if (length as usize) < HEADER_LEN || length as usize > MAX_PACKET_LEN {
            return Err(PacketError::InvalidLength);
        }
        Ok(Self {
            length,
            provider_id: u16::from_le_bytes([bytes[4], bytes[5]]),
            method_id: u16::from_le_bytes([bytes[6], bytes[7]]),
            flags: bytes[8],
            call_id: u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]),
        })
    }

    /// Write this header (with `length` computed from `payload_len`) plus
    /// `payload` into `out`. Returns the total bytes written.
    pub fn write(
        provider_id: u16,
        method_id: u16,
        flags: u8,
        call_id: u32,
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, PacketError> {
        let total = HEADER_LEN + payload.len();
        if total > MAX_PACKET_LEN {
            return Err(PacketError::InvalidLength);
        }
        if out.len() < total {
            return Err(PacketError::Truncated);
        }
        out[0..2].copy_from_slice(&MAGIC.to_le_bytes());
        out[2..4].copy_from_slice(&(total as u16).to_le_bytes());
        out[4..6].copy_from_slice(&provider_id.to_le_bytes());
        out[6..8].copy_from_slice(&method_id.to_le_bytes());
        out[8] = flags;
        out[9..13].copy_from_slice(&call_id.to_le_bytes());
        out[13..total].copy_from_slice(payload);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let payload = [1u8, 2, 3, 4, 5];
        let mut buf = [0u8; HEADER_LEN + 5];
        let n = PacketHeader::write(100, 3, FLAG_REPLY, 0xDEAD_BEEF, &payload, &mut buf).unwrap();
        assert_eq!(n, buf.len());

        let header = PacketHeader::parse(&buf).unwrap();
        assert_eq!(header.provider_id, 100);
        assert_eq!(header.method_id, 3);
        assert!(header.is_reply());
        assert_eq!(header.call_id, 0xDEAD_BEEF);
        assert_eq!(&buf[header.payload_range()], &payload);
    }

    #[test]
    fn rejects_length_below_header() {
        let mut buf = [0u8; HEADER_LEN];
        buf[2..4].copy_from_slice(&5u16.to_le_bytes());
        assert_eq!(PacketHeader::parse(&buf), Err(PacketError::InvalidLength));
    }

    #[test]
    fn rejects_length_over_ceiling() {
        let mut buf = [0u8; HEADER_LEN];
        buf[2..4].copy_from_slice(&(MAX_PACKET_LEN as u16 + 1).to_le_bytes());
        assert_eq!(PacketHeader::parse(&buf), Err(PacketError::InvalidLength));
    }
}
