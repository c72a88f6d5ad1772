use crate::rlp;
use crate::types::execution::{Log, Receipt};

/// Decode a transaction receipt from its RLP encoding.
/// Post-EIP-2718, receipts may be typed (prefixed with a type byte).
pub fn decode_receipt(data: &[u8]) -> Result<Receipt, String> {
    let rlp_data = if !data.is_empty() && data[0] <= 0x7F {
        // Typed receipt: skip the type byte
        &data[1..]
    } else {
        data
    };

    let items = rlp::decode_list(rlp_data).map_err(|e| format!("Invalid receipt RLP: {}", e))?;
    if items.len() != 4 {
        return Err(format!("Receipt should have 4 items, got {}", items.len()));
    }

    Ok(Receipt {
        status_or_state: items[0].clone(),
        cumulative_gas_used: rlp::decode_u64(&items[1])
            .map_err(|e| format!("Invalid receipt gas: {}", e))?,
        logs_bloom: rlp::decode_fixed(&items[2], "logs bloom")?,
        logs: decode_logs(&items[3])?,
    })
}

/// Decode the receipt's log list.
fn decode_logs(data: &[u8]) -> Result<Vec<Log>, String> {
    let log_items = rlp::decode_list(data).map_err(|e| format!("Invalid logs RLP: {}", e))?;

    let mut logs = Vec::with_capacity(log_items.len());
    for log_rlp in &log_items {
        let fields =
            rlp::decode_list(log_rlp).map_err(|e| format!("Invalid log RLP: {}", e))?;
        if fields.len() != 3 {
            return Err(format!("Log should have 3 fields, got {}", fields.len()));
        }

        let topics = rlp::decode_list(&fields[1])
            .map_err(|e| format!("Invalid topics RLP: {}", e))?
            .iter()
            .map(|t| rlp::decode_fixed(t, "log topic"))
            .collect::<Result<Vec<[u8; 32]>, String>>()?;

        logs.push(Log {
            address: rlp::decode_fixed(&fields[0], "log address")?,
            topics,
            data: fields[2].clone(),
        });
    }

    Ok(logs)
}

/// RLP encode a receipt. Fixtures and the verifier's own tests only;
/// wire receipts always arrive pre-encoded inside trie proofs.
pub fn encode_receipt(receipt: &Receipt) -> Vec<u8> {
    let logs: Vec<Vec<u8>> = receipt
        .logs
        .iter()
        .map(|log| {
            let topics: Vec<Vec<u8>> =
                log.topics.iter().map(|t| rlp::encode_bytes(t)).collect();
            rlp::encode_list(&[
                rlp::encode_bytes(&log.address),
                rlp::encode_list(&topics),
                rlp::encode_bytes(&log.data),
            ])
        })
        .collect();
    rlp::encode_list(&[
        rlp::encode_bytes(&receipt.status_or_state),
        rlp::encode_u64(receipt.cumulative_gas_used),
        rlp::encode_bytes(&receipt.logs_bloom),
        rlp::encode_list(&logs),
    ])
}
