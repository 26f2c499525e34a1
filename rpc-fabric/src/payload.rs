//! Length-table argument encoding: a fixed-count length table (2 bytes per
//! argument, little-endian) followed by the concatenated argument bytes.
//! Arguments are either a trivially-copyable fixed-size value or a variable
//! length byte slice (a string or byte array is just a slice as far as this
//! codec is concerned — the length table already carries its size).

use crate::error::RpcError;

/// One argument (or return value) about to be written to, or just read from,
/// a payload buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    /// A `Copy` scalar's little-endian byte representation (e.g. `i32`,
    /// `u8`, `bool`-as-u8).
    Fixed(&'a [u8]),
    /// A string or byte array: length carried in the length table, data
    /// carried verbatim (no escaping, no terminator).
    Bytes(&'a [u8]),
}

impl<'a> Value<'a> {
    fn bytes(&self) -> &'a [u8] {
        match self {
            Value::Fixed(b) | Value::Bytes(b) => b,
        }
    }
}

/// Total encoded size of `values`: the length table plus every value's bytes.
pub fn encoded_len(values: &[Value<'_>]) -> usize {
    values.len() * 2 + values.iter().map(|v| v.bytes().len()).sum::<usize>()
}

/// Writes the length table followed by argument data into `out`. Returns the
/// number of bytes written, or `ArgumentsTooLarge` if `out` can't hold it.
pub fn encode(values: &[Value<'_>], out: &mut [u8]) -> Result<usize, RpcError> {
    let total = encoded_len(values);
    if out.len() < total {
        return Err(RpcError::ArgumentsTooLarge);
    }

    let table_len = values.len() * 2;
    let mut data_offset = table_len;
    for (i, v) in values.iter().enumerate() {
        let bytes = v.bytes();
        let len = bytes.len() as u16;
        out[i * 2..i * 2 + 2].copy_from_slice(&len.to_le_bytes());
        out[data_offset..data_offset + bytes.len()].copy_from_slice(bytes);
        data_offset += bytes.len();
    }
    Ok(total)
}

/// Reads the length table for `count` arguments, then returns a slice view
/// over each argument's data in order. Callers know from context (the
/// provider's method signature) whether to treat each slice as `Fixed` or
/// `Bytes`; this decoder itself is agnostic.
pub fn decode<'a, const MAX_ARGS: usize>(
    payload: &'a [u8],
    count: usize,
) -> Result<heapless::Vec<&'a [u8], MAX_ARGS>, RpcError> {
    if count == 0 {
        return Ok(heapless::Vec::new());
    }
    let table_len = count * 2;
    if payload.len() < table_len {
        return Err(RpcError::InvalidPacketLength);
    }

    let mut lengths = [0u16; MAX_ARGS];
    for i in 0..count {
        lengths[i] = u16::from_le_bytes([payload[i * 2], payload[i * 2 + 1]]);
    }

    let mut out = heapless::Vec::new();
    let mut offset = table_len;
    for &len in lengths.iter().take(count) {
        let len = len as usize;
        if offset + len > payload.len() {
            return Err(RpcError::InvalidPacketLength);
        }
        out.push(&payload[offset..offset + len])
            .map_err(|_| RpcError::InvalidPacketLength)?;
        offset += len;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_argument_kinds() {
        let a: i32 = -7;
        let a_bytes = a.to_le_bytes();
        let values = [Value::Fixed(&a_bytes), Value::Bytes(b"hello")];

        let mut buf = [0u8; 64];
        let n = encode(&values, &mut buf).unwrap();

        let decoded = decode::<2>(&buf[..n], 2).unwrap();
        assert_eq!(decoded[0], &a_bytes);
        assert_eq!(decoded[1], b"hello");
    }

    #[test]
    fn empty_argument_list_encodes_to_nothing() {
        let values: [Value<'_>; 0] = [];
        let mut buf = [0u8; 4];
        let n = encode(&values, &mut buf).unwrap();
        assert_eq!(n, 0);
        let decoded = decode::<0>(&buf[..0], 0).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn arguments_too_large_for_buffer_is_rejected() {
        let data = [0u8; 10];
        let values = [Value::Bytes(&data)];
        let mut buf = [0u8; 4];
        assert_eq!(encode(&values, &mut buf), Err(RpcError::ArgumentsTooLarge));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let buf = [5u8, 0]; // claims a 5-byte argument but supplies none
        assert_eq!(decode::<1>(&buf, 1), Err(RpcError::InvalidPacketLength));
    }
}
