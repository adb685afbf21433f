//! Large payloads spread across bounded metadata slots.
//!
//! The payload is base64 encoded and cut into slots of at most
//! [`SLOT_LEN`] characters keyed `order_b64_01`, `order_b64_02`, ... with the
//! slot count stored under `order_chunks`. Decoding concatenates the slots in
//! index order.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use quote_engine::OrderRecord;
use thiserror::Error;

pub const SLOT_LEN: usize = 500;
pub const MAX_SLOTS: usize = 40;
pub const COUNT_KEY: &str = "order_chunks";
const SLOT_PREFIX: &str = "order_b64_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("payload needs {0} slots, limit is {MAX_SLOTS}")]
    TooLarge(usize),
    #[error("no order slots in metadata")]
    Missing,
    #[error("missing slot {0}")]
    MissingSlot(String),
    #[error("invalid base64 payload")]
    Encoding,
    #[error("invalid order payload")]
    Payload,
}

pub fn slot_key(index: usize) -> String {
    format!("{SLOT_PREFIX}{index:02}")
}

/// Splits `payload` into slots. Returns the slot entries plus the count entry.
pub fn encode(payload: &[u8]) -> Result<Vec<(String, String)>, ChunkError> {
    let encoded = STANDARD.encode(payload);
    // base64 output is ASCII so byte chunks are char chunks
    let slots: Vec<&[u8]> = encoded.as_bytes().chunks(SLOT_LEN).collect();
    if slots.len() > MAX_SLOTS {
        return Err(ChunkError::TooLarge(slots.len()));
    }

    let mut entries: Vec<(String, String)> = slots
        .iter()
        .enumerate()
        .map(|(i, chunk)| (slot_key(i + 1), String::from_utf8_lossy(chunk).into_owned()))
        .collect();
    entries.push((COUNT_KEY.to_string(), slots.len().to_string()));
    Ok(entries)
}

pub fn decode(metadata: &BTreeMap<String, String>) -> Result<Vec<u8>, ChunkError> {
    let declared = metadata
        .get(COUNT_KEY)
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|n| *n > 0);

    let joined = match declared {
        Some(count) => {
            let mut joined = String::new();
            for i in 1..=count {
                let key = slot_key(i);
                let slot = metadata
                    .get(&key)
                    .ok_or(ChunkError::MissingSlot(key))?;
                joined.push_str(slot);
            }
            joined
        }
        None => {
            let mut slots: Vec<(u32, &String)> = metadata
                .iter()
                .filter_map(|(k, v)| {
                    let digits = k.strip_prefix(SLOT_PREFIX)?;
                    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    Some((digits.parse().ok()?, v))
                })
                .collect();
            if slots.is_empty() {
                return Err(ChunkError::Missing);
            }
            slots.sort_by_key(|(i, _)| *i);
            slots.into_iter().map(|(_, v)| v.as_str()).collect()
        }
    };

    STANDARD.decode(joined.trim()).map_err(|_| ChunkError::Encoding)
}

pub fn encode_order(order: &OrderRecord) -> Result<Vec<(String, String)>, ChunkError> {
    let json = serde_json::to_vec(order).map_err(|_| ChunkError::Payload)?;
    encode(&json)
}

pub fn decode_order(metadata: &BTreeMap<String, String>) -> Result<OrderRecord, ChunkError> {
    let bytes = decode(metadata)?;
    serde_json::from_slice(&bytes).map_err(|_| ChunkError::Payload)
}
