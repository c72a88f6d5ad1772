use crate::rlp;
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Errors during Merkle-Patricia trie proof verification.
#[derive(Debug, Error)]
pub enum TrieError {
    #[error("Empty proof: no trie nodes provided")]
    EmptyProof,

    #[error("Invalid trie node at depth {depth}: {reason}")]
    InvalidNode { depth: usize, reason: String },

    #[error("Trie node hash mismatch at depth {depth}: computed {computed}, expected {expected}")]
    HashMismatch {
        depth: usize,
        computed: String,
        expected: String,
    },

    #[error("Key not present in receipts trie")]
    KeyNotFound,

    #[error("Proof path incomplete: trie traversal ended at depth {depth} without reaching the key")]
    IncompleteProof { depth: usize },
}

/// Compute keccak256 hash of data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Prove a key's inclusion in a Merkle-Patricia trie and return the
/// stored value.
///
/// Walks the trie from root to leaf following the proof nodes. At each
/// step the node must hash to the reference its parent (or the root)
/// claims. The key is used as-is: receipts tries are keyed by the
/// RLP-encoded transaction index, not by a hashed key.
///
/// Absence is never acceptable here: the verifier only ever proves
/// receipts it was told exist, so a divergent path is an error.
pub fn prove(root: &[u8; 32], key: &[u8], nodes: &[Vec<u8>]) -> Result<Vec<u8>, TrieError> {
    if nodes.is_empty() {
        return Err(TrieError::EmptyProof);
    }

    let nibbles = to_nibbles(key);
    let mut nibble_index: usize = 0;
    let mut expected: [u8; 32] = *root;

    for (depth, node) in nodes.iter().enumerate() {
        let computed = keccak256(node);
        if computed != expected {
            return Err(TrieError::HashMismatch {
                depth,
                computed: hex::encode(computed),
                expected: hex::encode(expected),
            });
        }

        let items = rlp::decode_list(node).map_err(|reason| TrieError::InvalidNode {
            depth,
            reason,
        })?;

        match items.len() {
            17 => {
                // Branch node: 16 children + value
                if nibble_index == nibbles.len() {
                    let value = &items[16];
                    if value.is_empty() {
                        return Err(TrieError::KeyNotFound);
                    }
                    return Ok(value.clone());
                }

                let child = &items[nibbles[nibble_index] as usize];
                nibble_index += 1;
                if child.is_empty() {
                    return Err(TrieError::KeyNotFound);
                }
                expected = child_hash(child, depth)?;
            }
            2 => {
                // Extension or leaf node
                let (prefix_nibbles, is_leaf) =
                    decode_compact_path(&items[0]).map_err(|reason| TrieError::InvalidNode {
                        depth,
                        reason,
                    })?;
                let remaining = &nibbles[nibble_index..];

                if is_leaf {
                    if remaining != prefix_nibbles.as_slice() || items[1].is_empty() {
                        return Err(TrieError::KeyNotFound);
                    }
                    return Ok(items[1].clone());
                }

                if !remaining.starts_with(&prefix_nibbles) {
                    return Err(TrieError::KeyNotFound);
                }
                nibble_index += prefix_nibbles.len();
                expected = child_hash(&items[1], depth)?;
            }
            _ => {
                return Err(TrieError::InvalidNode {
                    depth,
                    reason: format!("{}-element list", items.len()),
                });
            }
        }
    }

    Err(TrieError::IncompleteProof { depth: nodes.len() })
}

/// A child reference must be a 32-byte hash pointing at the next proof
/// node; sub-32-byte embedded nodes do not occur for receipt values.
fn child_hash(child: &[u8], depth: usize) -> Result<[u8; 32], TrieError> {
    if child.len() != 32 {
        return Err(TrieError::InvalidNode {
            depth,
            reason: format!("child reference of {} bytes", child.len()),
        });
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(child);
    Ok(hash)
}

/// Convert key bytes to nibbles (4 bits each).
fn to_nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(bytes.len() * 2);
    for byte in bytes {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }
    nibbles
}

/// Decode compact (hex-prefix) encoding used in trie nodes.
/// Returns (nibbles, is_leaf).
fn decode_compact_path(encoded: &[u8]) -> Result<(Vec<u8>, bool), String> {
    if encoded.is_empty() {
        return Err("Empty compact path".to_string());
    }

    let first_nibble = encoded[0] >> 4;
    if first_nibble > 3 {
        return Err(format!("Invalid compact path prefix {:#x}", first_nibble));
    }
    let is_leaf = first_nibble >= 2;
    let is_odd = first_nibble % 2 == 1;

    let mut nibbles = Vec::new();

    if is_odd {
        nibbles.push(encoded[0] & 0x0F);
    }

    for &byte in &encoded[1..] {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0F);
    }

    Ok((nibbles, is_leaf))
}

/// Hex-prefix encode nibbles for building test tries.
#[cfg(test)]
pub(crate) fn encode_compact_path(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let mut flag: u8 = if is_leaf { 2 } else { 0 };
    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);
    if nibbles.len() % 2 == 1 {
        flag |= 1;
        out.push((flag << 4) | nibbles[0]);
        for pair in nibbles[1..].chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    } else {
        out.push(flag << 4);
        for pair in nibbles.chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_node(path: &[u8], value: &[u8]) -> Vec<u8> {
        rlp::encode_list(&[
            rlp::encode_bytes(&encode_compact_path(path, true)),
            rlp::encode_bytes(value),
        ])
    }

    #[test]
    fn test_keccak256_known_vector() {
        use hex_literal::hex;
        assert_eq!(
            keccak256(b""),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn test_decode_compact_path_variants() {
        // 0x00 prefix: even extension
        let (nibbles, is_leaf) = decode_compact_path(&[0x00, 0xAB, 0xCD]).unwrap();
        assert!(!is_leaf);
        assert_eq!(nibbles, vec![0xA, 0xB, 0xC, 0xD]);

        // 0x1X prefix: odd extension, first nibble is X
        let (nibbles, is_leaf) = decode_compact_path(&[0x1A, 0xBC]).unwrap();
        assert!(!is_leaf);
        assert_eq!(nibbles, vec![0xA, 0xB, 0xC]);

        // 0x20 prefix: even leaf
        let (nibbles, is_leaf) = decode_compact_path(&[0x20, 0xAB]).unwrap();
        assert!(is_leaf);
        assert_eq!(nibbles, vec![0xA, 0xB]);

        // 0x3X prefix: odd leaf, first nibble is X
        let (nibbles, is_leaf) = decode_compact_path(&[0x3A, 0xBC]).unwrap();
        assert!(is_leaf);
        assert_eq!(nibbles, vec![0xA, 0xB, 0xC]);
    }

    #[test]
    fn test_compact_path_round_trip() {
        for (path, is_leaf) in [
            (vec![0x8u8, 0x0], true),
            (vec![0x1, 0x2, 0x3], false),
            (vec![], true),
        ] {
            let encoded = encode_compact_path(&path, is_leaf);
            assert_eq!(decode_compact_path(&encoded).unwrap(), (path, is_leaf));
        }
    }

    #[test]
    fn test_prove_single_leaf() {
        let key = vec![0x80]; // RLP(0), the first transaction
        let node = leaf_node(&[0x8, 0x0], b"receipt bytes");
        let root = keccak256(&node);

        let value = prove(&root, &key, &[node]).unwrap();
        assert_eq!(value, b"receipt bytes".to_vec());
    }

    #[test]
    fn test_prove_branch_then_leaf() {
        // Key 0x01 → nibbles [0, 1]; branch on first nibble, leaf on the rest
        let key = vec![0x01];
        let leaf = leaf_node(&[0x1], b"second receipt");
        let leaf_hash = keccak256(&leaf);

        let mut branch_items: Vec<Vec<u8>> = (0..17).map(|_| rlp::encode_bytes(&[])).collect();
        branch_items[0] = rlp::encode_bytes(&leaf_hash);
        let branch = rlp::encode_list(&branch_items);
        let root = keccak256(&branch);

        let value = prove(&root, &key, &[branch.clone(), leaf.clone()]).unwrap();
        assert_eq!(value, b"second receipt".to_vec());

        // A key steering into an empty branch slot is not provable
        assert!(matches!(
            prove(&root, &[0x21], &[branch, leaf]),
            Err(TrieError::KeyNotFound)
        ));
    }

    #[test]
    fn test_prove_rejects_tampered_node() {
        let key = vec![0x80];
        let node = leaf_node(&[0x8, 0x0], b"receipt bytes");
        let root = keccak256(&node);

        for i in 0..node.len() {
            let mut tampered = node.clone();
            tampered[i] ^= 0x01;
            assert!(prove(&root, &key, &[tampered]).is_err());
        }
    }

    #[test]
    fn test_prove_rejects_wrong_key() {
        let node = leaf_node(&[0x8, 0x0], b"receipt bytes");
        let root = keccak256(&node);
        assert!(matches!(
            prove(&root, &[0x81], &[node]),
            Err(TrieError::KeyNotFound)
        ));
    }

    #[test]
    fn test_prove_requires_nodes() {
        assert!(matches!(
            prove(&[0u8; 32], &[0x80], &[]),
            Err(TrieError::EmptyProof)
        ));
    }
}
