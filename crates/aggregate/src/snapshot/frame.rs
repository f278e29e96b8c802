use std::io::{self, Read};

use super::error::SnapshotError;

/// Upper bound on one encoded entry: a maximal owner name plus fixed fields.
pub(super) const MAX_PAYLOAD: usize = 2 + u16::MAX as usize + 64;

pub(super) fn encode(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    let crc = crc32fast::hash(payload);
    let mut buf = Vec::with_capacity(4 + payload.len() + 4);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&crc.to_le_bytes());
    buf
}

pub(super) fn decode(reader: &mut impl Read, index: u64) -> Result<Vec<u8>, SnapshotError> {
    let mut len_buf = [0u8; 4];
    read_exact(reader, &mut len_buf, index)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_PAYLOAD {
        return Err(SnapshotError::Malformed {
            index,
            reason: format!("entry length {len} exceeds {MAX_PAYLOAD}"),
        });
    }

    let mut payload = vec![0u8; len];
    read_exact(reader, &mut payload, index)?;

    let mut crc_buf = [0u8; 4];
    read_exact(reader, &mut crc_buf, index)?;
    if u32::from_le_bytes(crc_buf) != crc32fast::hash(&payload) {
        return Err(SnapshotError::CrcMismatch { index });
    }

    Ok(payload)
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], index: u64) -> Result<(), SnapshotError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => SnapshotError::Truncated { index },
        _ => SnapshotError::Io(e),
    })
}
