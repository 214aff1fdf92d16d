// Key encoding and timestamp helpers

use crate::error::{Result, StoreError};

/// Encode a task id as 8 big-endian bytes, so that ascending byte-order
/// iteration over keys equals ascending numeric order.
pub fn encode_task_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decode an 8-byte big-endian task key back into its id.
pub fn decode_task_id(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| StoreError::CorruptKey { len: key.len() })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Current local time formatted as `MM-DD-YYYY hh:mm:ss`.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%m-%d-%Y %H:%M:%S").to_string()
}
