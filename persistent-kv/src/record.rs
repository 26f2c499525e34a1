//! The on-flash record layout: `{ magic: u32, length: u32, data: [u8; length] }`.

pub const MAGIC: u32 = 0x494E_5058; // "INPX"
pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    BadMagic,
    LengthOutOfRange,
    Truncated,
}

pub struct RecordHeader {
    pub length: u32,
}

impl RecordHeader {
    /// Parses the 8-byte header at the start of `bytes`, rejecting a length
    /// that would run past `max_data_len` (the sector minus the header).
    pub fn parse(bytes: &[u8], max_data_len: usize) -> Result<Self, RecordError> {
        if bytes.len() < HEADER_LEN {
            return Err(RecordError::Truncated);
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(RecordError::BadMagic);
        }
        let length = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if length == 0 || length as usize > max_data_len {
            return Err(RecordError::LengthOutOfRange);
        }
        Ok(Self { length })
    }

    pub fn write(length: u32, out: &mut [u8]) -> Result<(), RecordError> {
        if out.len() < HEADER_LEN {
            return Err(RecordError::Truncated);
        }
        out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        out[4..8].copy_from_slice(&length.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let mut buf = [0u8; HEADER_LEN];
        RecordHeader::write(42, &mut buf).unwrap();
        let header = RecordHeader::parse(&buf, 4096).unwrap();
        assert_eq!(header.length, 42);
    }

    #[test]
    fn rejects_wrong_magic() {
        let buf = [0xFFu8; HEADER_LEN];
        assert_eq!(RecordHeader::parse(&buf, 4096), Err(RecordError::BadMagic));
    }

    #[test]
    fn rejects_length_over_ceiling() {
        let mut buf = [0u8; HEADER_LEN];
        RecordHeader::write(5000, &mut buf).unwrap();
        assert_eq!(RecordHeader::parse(&buf, 4096), Err(RecordError::LengthOutOfRange));
    }

    #[test]
    fn rejects_zero_length() {
        let mut buf = [0u8; HEADER_LEN];
        RecordHeader::write(0, &mut buf).unwrap();
        assert_eq!(RecordHeader::parse(&buf, 4096), Err(RecordError::LengthOutOfRange));
    }
}
