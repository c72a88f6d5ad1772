use serde::{Deserialize, Serialize};

/// A transaction receipt recovered from the receipts trie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Post-Byzantium status (0 or 1); pre-Byzantium state root bytes
    /// are accepted but never inspected.
    pub status_or_state: Vec<u8>,
    /// Cumulative gas used in the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Bloom filter for quick log searching (256 bytes, hex-encoded for serde).
    #[serde(with = "bloom_serde")]
    pub logs_bloom: [u8; 256],
    /// The logs emitted by this transaction.
    pub logs: Vec<Log>,
}

mod bloom_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bloom: &[u8; 256], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bloom))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 256], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 256 {
            return Err(serde::de::Error::custom("bloom must be 256 bytes"));
        }
        let mut arr = [0u8; 256];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

/// A log entry emitted by a smart contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Address of the contract that emitted the log.
    pub address: [u8; 20],
    /// Indexed topics (up to 4, first is the event signature hash).
    pub topics: Vec<[u8; 32]>,
    /// Non-indexed data.
    pub data: Vec<u8>,
}

impl Log {
    /// Extract the message payload from the log data.
    ///
    /// The bridge event carries a single non-indexed `bytes` argument,
    /// so `data` is its ABI encoding: a 32-byte offset word, a 32-byte
    /// length word, then the payload padded to a 32-byte boundary.
    pub fn message_payload(&self) -> Result<Vec<u8>, String> {
        if self.data.len() < 64 {
            return Err(format!("Log data too short: {} bytes", self.data.len()));
        }
        let offset = be_word(&self.data[..32])?;
        if offset != 32 {
            return Err(format!("Unexpected payload offset {}", offset));
        }
        let length = be_word(&self.data[32..64])? as usize;
        if self.data.len() < 64 + length {
            return Err(format!(
                "Log data truncated: need {} bytes, have {}",
                64 + length,
                self.data.len()
            ));
        }
        Ok(self.data[64..64 + length].to_vec())
    }
}

fn be_word(word: &[u8]) -> Result<u64, String> {
    if word[..24].iter().any(|&b| b != 0) {
        return Err("ABI word out of range".to_string());
    }
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&word[24..32]);
    Ok(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ABI-encode a single dynamic `bytes` argument.
    pub(crate) fn abi_encode_bytes(payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[31] = 32;
        data[56..64].copy_from_slice(&(payload.len() as u64).to_be_bytes());
        data.extend_from_slice(payload);
        let padding = (32 - payload.len() % 32) % 32;
        data.extend(std::iter::repeat(0).take(padding));
        data
    }

    #[test]
    fn test_message_payload_extraction() {
        let log = Log {
            address: [0xAA; 20],
            topics: vec![[0x01; 32]],
            data: abi_encode_bytes(b"btp payload"),
        };
        assert_eq!(log.message_payload().unwrap(), b"btp payload".to_vec());
    }

    #[test]
    fn test_message_payload_rejects_truncated_data() {
        let mut data = abi_encode_bytes(b"btp payload");
        data.truncate(70);
        let log = Log {
            address: [0xAA; 20],
            topics: vec![],
            data,
        };
        assert!(log.message_payload().is_err());
    }
}
