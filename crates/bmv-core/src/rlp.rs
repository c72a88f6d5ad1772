//! Minimal RLP codec.
//!
//! Every structured value the verifier touches (relay messages, block
//! updates, proofs, receipts, its own persisted state) travels as RLP,
//! a length-prefixed recursive list encoding. The verifier decodes
//! untrusted wire bytes and encodes only its own state record, so the
//! codec stays deliberately small: no streaming, no zero-copy.

/// Decode an RLP-encoded list into its component items.
///
/// String items are returned as their raw payload; nested list items
/// are returned as their complete RLP encoding so callers can recurse
/// with another `decode_list` call.
pub fn decode_list(data: &[u8]) -> Result<Vec<Vec<u8>>, String> {
    if data.is_empty() {
        return Err("Empty RLP data".to_string());
    }

    let (items_data, consumed) = decode_list_payload(data)?;
    if consumed != data.len() {
        return Err(format!(
            "Trailing bytes after RLP list: {} of {} consumed",
            consumed,
            data.len()
        ));
    }

    let mut items = Vec::new();
    let mut offset = 0;
    while offset < items_data.len() {
        let (item, consumed) = decode_item(&items_data[offset..])?;
        items.push(item);
        offset += consumed;
    }

    Ok(items)
}

/// Decode the payload portion of an RLP list.
fn decode_list_payload(data: &[u8]) -> Result<(&[u8], usize), String> {
    let prefix = data[0];

    if prefix <= 0x7F {
        return Err("Expected list, got single byte".to_string());
    }

    if prefix <= 0xBF {
        return Err("Expected list, got string".to_string());
    }

    if prefix <= 0xF7 {
        // Short list: length is prefix - 0xC0
        let length = (prefix - 0xC0) as usize;
        if data.len() < 1 + length {
            return Err("Short list: insufficient data".to_string());
        }
        Ok((&data[1..1 + length], 1 + length))
    } else {
        // Long list: next (prefix - 0xF7) bytes are the length
        let len_bytes = (prefix - 0xF7) as usize;
        if data.len() < 1 + len_bytes {
            return Err("Long list: insufficient length bytes".to_string());
        }
        let mut length: usize = 0;
        for i in 0..len_bytes {
            length = (length << 8) | (data[1 + i] as usize);
        }
        let total = 1 + len_bytes + length;
        if data.len() < total {
            return Err("Long list: insufficient data".to_string());
        }
        Ok((&data[1 + len_bytes..total], total))
    }
}

/// Decode a single RLP item, returning the decoded bytes and how many
/// bytes were consumed. List items keep their header so they can be
/// re-decoded as lists.
pub fn decode_item(data: &[u8]) -> Result<(Vec<u8>, usize), String> {
    if data.is_empty() {
        return Err("Empty data in RLP item".to_string());
    }

    let prefix = data[0];

    if prefix <= 0x7F {
        // Single byte
        Ok((vec![prefix], 1))
    } else if prefix <= 0xB7 {
        // Short string (0-55 bytes)
        let length = (prefix - 0x80) as usize;
        if length == 0 {
            return Ok((vec![], 1));
        }
        if data.len() < 1 + length {
            return Err("Short string: insufficient data".to_string());
        }
        Ok((data[1..1 + length].to_vec(), 1 + length))
    } else if prefix <= 0xBF {
        // Long string (>55 bytes)
        let len_bytes = (prefix - 0xB7) as usize;
        if data.len() < 1 + len_bytes {
            return Err("Long string: insufficient length bytes".to_string());
        }
        let mut length: usize = 0;
        for i in 0..len_bytes {
            length = (length << 8) | (data[1 + i] as usize);
        }
        let total = 1 + len_bytes + length;
        if data.len() < total {
            return Err("Long string: insufficient data".to_string());
        }
        Ok((data[1 + len_bytes..total].to_vec(), total))
    } else if prefix <= 0xF7 {
        // Short list
        let length = (prefix - 0xC0) as usize;
        let total = 1 + length;
        if data.len() < total {
            return Err("Short list item: insufficient data".to_string());
        }
        Ok((data[..total].to_vec(), total))
    } else {
        // Long list
        let len_bytes = (prefix - 0xF7) as usize;
        if data.len() < 1 + len_bytes {
            return Err("Long list item: insufficient length bytes".to_string());
        }
        let mut length: usize = 0;
        for i in 0..len_bytes {
            length = (length << 8) | (data[1 + i] as usize);
        }
        let total = 1 + len_bytes + length;
        if data.len() < total {
            return Err("Long list item: insufficient data".to_string());
        }
        Ok((data[..total].to_vec(), total))
    }
}

/// Decode an RLP string item into a fixed-size array.
pub fn decode_fixed<const N: usize>(item: &[u8], what: &str) -> Result<[u8; N], String> {
    if item.len() != N {
        return Err(format!("{}: expected {} bytes, got {}", what, N, item.len()));
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(item);
    Ok(arr)
}

/// Decode an RLP-encoded unsigned integer payload (big-endian, no
/// leading zeros; an empty payload is zero).
pub fn decode_u64(item: &[u8]) -> Result<u64, String> {
    if item.len() > 8 {
        return Err(format!("Integer too large: {} bytes", item.len()));
    }
    if item.len() > 1 && item[0] == 0 {
        return Err("Integer has leading zero".to_string());
    }
    let mut result: u64 = 0;
    for &byte in item {
        result = (result << 8) | (byte as u64);
    }
    Ok(result)
}

/// RLP encode a byte string.
pub fn encode_bytes(value: &[u8]) -> Vec<u8> {
    if value.len() == 1 && value[0] <= 0x7F {
        return vec![value[0]];
    }
    let mut out = encode_length(value.len(), 0x80);
    out.extend_from_slice(value);
    out
}

/// RLP encode an unsigned integer (big-endian, minimal bytes).
pub fn encode_u64(value: u64) -> Vec<u8> {
    if value == 0 {
        return vec![0x80]; // RLP empty string for zero
    }
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    encode_bytes(&bytes[start..])
}

/// RLP encode a list from already-encoded items.
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_len: usize = items.iter().map(|i| i.len()).sum();
    let mut out = encode_length(payload_len, 0xC0);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

fn encode_length(len: usize, base: u8) -> Vec<u8> {
    if len < 56 {
        vec![base + len as u8]
    } else {
        let bytes = (len as u64).to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
        let significant = &bytes[start..];
        let mut out = Vec::with_capacity(1 + significant.len());
        out.push(base + 55 + significant.len() as u8);
        out.extend_from_slice(significant);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_u64() {
        assert_eq!(encode_u64(0), vec![0x80]);
        assert_eq!(encode_u64(1), vec![0x01]);
        assert_eq!(encode_u64(127), vec![0x7F]);
        assert_eq!(encode_u64(128), vec![0x81, 0x80]);
        assert_eq!(encode_u64(256), vec![0x82, 0x01, 0x00]);
    }

    #[test]
    fn test_decode_single_byte() {
        let (item, consumed) = decode_item(&[0x42]).unwrap();
        assert_eq!(item, vec![0x42]);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_decode_empty_string() {
        let (item, consumed) = decode_item(&[0x80]).unwrap();
        assert_eq!(item, Vec::<u8>::new());
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_decode_short_string() {
        // 0x83 means 3-byte string
        let data = vec![0x83, 0x61, 0x62, 0x63]; // "abc"
        let (item, consumed) = decode_item(&data).unwrap();
        assert_eq!(item, vec![0x61, 0x62, 0x63]);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_decode_list() {
        // RLP encoding of [0x01, 0x02, 0x03]
        let data = vec![0xC3, 0x01, 0x02, 0x03];
        let items = decode_list(&data).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], vec![0x01]);
        assert_eq!(items[1], vec![0x02]);
        assert_eq!(items[2], vec![0x03]);
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let data = vec![0xC1, 0x01, 0xFF];
        assert!(decode_list(&data).is_err());
    }

    #[test]
    fn test_decode_u64() {
        assert_eq!(decode_u64(&[]).unwrap(), 0);
        assert_eq!(decode_u64(&[0x01]).unwrap(), 1);
        assert_eq!(decode_u64(&[0x01, 0x00]).unwrap(), 256);
        assert!(decode_u64(&[0x00, 0x01]).is_err());
        assert!(decode_u64(&[0x01; 9]).is_err());
    }

    #[test]
    fn test_round_trip_nested_list() {
        let inner = encode_list(&[encode_u64(7), encode_bytes(b"abc")]);
        let outer = encode_list(&[encode_bytes(&[0xAA; 32]), inner.clone()]);

        let items = decode_list(&outer).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], vec![0xAA; 32]);
        // Nested lists keep their header for re-decoding
        assert_eq!(items[1], inner);

        let inner_items = decode_list(&items[1]).unwrap();
        assert_eq!(decode_u64(&inner_items[0]).unwrap(), 7);
        assert_eq!(inner_items[1], b"abc".to_vec());
    }

    #[test]
    fn test_long_string_round_trip() {
        let payload = vec![0x5A; 300];
        let encoded = encode_bytes(&payload);
        assert_eq!(encoded[0], 0xB9); // long string, 2 length bytes
        let (item, consumed) = decode_item(&encoded).unwrap();
        assert_eq!(item, payload);
        assert_eq!(consumed, encoded.len());
    }
}
