use std::collections::HashSet;
use std::io::{Read, Write};

use beacon_common::PinType;

use super::error::SnapshotError;
use super::frame;
use crate::accumulator::Accumulator;
use crate::key::AggregationKey;

pub const MAGIC: &[u8; 4] = b"BSNP";
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 8;
// owner length prefix, dashboard, device, pin type, pin, bucket, sum, count
const FIXED_PAYLOAD_LEN: usize = 2 + 4 + 4 + 1 + 4 + 8 + 8 + 8;

pub fn write_snapshot<W: Write>(
    writer: &mut W,
    entries: &[(AggregationKey, Accumulator)],
) -> Result<(), SnapshotError> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(MAGIC);
    header.push(FORMAT_VERSION);
    header.extend_from_slice(&(entries.len() as u64).to_le_bytes());
    writer.write_all(&header)?;

    for (index, (key, acc)) in entries.iter().enumerate() {
        let payload = encode_entry(key, acc, index as u64)?;
        writer.write_all(&frame::encode(&payload))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_snapshot<R: Read>(
    reader: &mut R,
) -> Result<Vec<(AggregationKey, Accumulator)>, SnapshotError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => SnapshotError::BadMagic,
        _ => SnapshotError::Io(e),
    })?;
    if &header[..4] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    if header[4] != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(header[4]));
    }
    let mut count_buf = [0u8; 8];
    count_buf.copy_from_slice(&header[5..]);
    let count = u64::from_le_bytes(count_buf);

    // The count comes from disk; cap the preallocation.
    let mut entries = Vec::with_capacity(count.min(4096) as usize);
    let mut seen = HashSet::with_capacity(count.min(4096) as usize);
    for index in 0..count {
        let payload = frame::decode(reader, index)?;
        let (key, acc) = decode_entry(&payload, index)?;
        if !seen.insert(key.clone()) {
            return Err(SnapshotError::DuplicateKey { index });
        }
        entries.push((key, acc));
    }

    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? != 0 {
        return Err(SnapshotError::TrailingData { expected: count });
    }

    Ok(entries)
}

fn encode_entry(
    key: &AggregationKey,
    acc: &Accumulator,
    index: u64,
) -> Result<Vec<u8>, SnapshotError> {
    let owner = key.owner().as_bytes();
    let owner_len = u16::try_from(owner.len()).map_err(|_| SnapshotError::Malformed {
        index,
        reason: format!("owner name of {} bytes does not fit", owner.len()),
    })?;

    let mut buf = Vec::with_capacity(FIXED_PAYLOAD_LEN + owner.len());
    buf.extend_from_slice(&owner_len.to_le_bytes());
    buf.extend_from_slice(owner);
    buf.extend_from_slice(&key.dashboard_id().to_le_bytes());
    buf.extend_from_slice(&key.device_id().to_le_bytes());
    buf.push(key.pin_type().as_char() as u8);
    buf.extend_from_slice(&key.pin().to_le_bytes());
    buf.extend_from_slice(&key.bucket().to_le_bytes());
    buf.extend_from_slice(&acc.sum().to_bits().to_le_bytes());
    buf.extend_from_slice(&acc.count().to_le_bytes());
    Ok(buf)
}

fn decode_entry(
    payload: &[u8],
    index: u64,
) -> Result<(AggregationKey, Accumulator), SnapshotError> {
    let mut cur = PayloadReader { buf: payload, pos: 0, index };

    let owner_len = u16::from_le_bytes(cur.take()?) as usize;
    let owner = std::str::from_utf8(cur.slice(owner_len)?)
        .map_err(|e| cur.malformed(format!("owner is not utf-8: {e}")))?
        .to_string();
    let dashboard_id = i32::from_le_bytes(cur.take()?);
    let device_id = i32::from_le_bytes(cur.take()?);
    let [code] = cur.take::<1>()?;
    let pin_type = PinType::from_char(code as char)
        .ok_or_else(|| cur.malformed(format!("unknown pin type byte 0x{code:02x}")))?;
    let pin = i32::from_le_bytes(cur.take()?);
    let bucket = i64::from_le_bytes(cur.take()?);
    let sum = f64::from_bits(u64::from_le_bytes(cur.take()?));
    let count = u64::from_le_bytes(cur.take()?);

    if cur.pos != payload.len() {
        return Err(cur.malformed(format!(
            "{} unused bytes in entry",
            payload.len() - cur.pos
        )));
    }
    if count == 0 {
        return Err(cur.malformed("accumulator with zero samples".to_string()));
    }

    Ok((
        AggregationKey::new(owner, dashboard_id, device_id, pin_type, pin, bucket),
        Accumulator::from_parts(sum, count),
    ))
}

struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
    index: u64,
}

impl<'a> PayloadReader<'a> {
    fn slice(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| self.malformed("entry shorter than its fields".to_string()))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], SnapshotError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(N)?);
        Ok(out)
    }

    fn malformed(&self, reason: String) -> SnapshotError {
        SnapshotError::Malformed {
            index: self.index,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_entries() -> Vec<(AggregationKey, Accumulator)> {
        vec![
            (
                AggregationKey::new("test", 1, 0, PinType::Virtual, 1, 399_552),
                Accumulator::from_parts(4950.0, 100),
            ),
            (
                AggregationKey::new("ünïcode", -3, i32::MAX, PinType::Analog, 255, -1),
                Accumulator::from_parts(0.1 + 0.2, 3),
            ),
        ]
    }

    fn encode(entries: &[(AggregationKey, Accumulator)]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_snapshot(&mut buf, entries).unwrap();
        buf
    }

    #[test]
    fn restores_every_field_bit_for_bit() {
        let entries = sample_entries();
        let decoded = read_snapshot(&mut Cursor::new(encode(&entries))).unwrap();
        assert_eq!(decoded.len(), 2);
        for ((k1, a1), (k2, a2)) in entries.iter().zip(decoded.iter()) {
            assert_eq!(k1, k2);
            assert_eq!(a1.sum().to_bits(), a2.sum().to_bits());
            assert_eq!(a1.count(), a2.count());
            assert_eq!(a1.average(), a2.average());
        }
    }

    #[test]
    fn empty_store_is_header_only() {
        let bytes = encode(&[]);
        assert_eq!(bytes.len(), HEADER_LEN);
        assert!(read_snapshot(&mut Cursor::new(bytes)).unwrap().is_empty());
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = encode(&sample_entries());
        bytes[0] = b'X';
        assert!(matches!(
            read_snapshot(&mut Cursor::new(bytes)),
            Err(SnapshotError::BadMagic)
        ));
    }

    #[test]
    fn empty_file_rejected() {
        assert!(matches!(
            read_snapshot(&mut Cursor::new(Vec::new())),
            Err(SnapshotError::BadMagic)
        ));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut bytes = encode(&sample_entries());
        bytes[4] = 9;
        assert!(matches!(
            read_snapshot(&mut Cursor::new(bytes)),
            Err(SnapshotError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn truncated_stream_rejected() {
        let bytes = encode(&sample_entries());
        let cut = &bytes[..bytes.len() - 5];
        assert!(matches!(
            read_snapshot(&mut Cursor::new(cut)),
            Err(SnapshotError::Truncated { index: 1 })
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode(&sample_entries());
        bytes.push(0);
        assert!(matches!(
            read_snapshot(&mut Cursor::new(bytes)),
            Err(SnapshotError::TrailingData { expected: 2 })
        ));
    }

    #[test]
    fn flipped_payload_bit_fails_crc() {
        let mut bytes = encode(&sample_entries());
        // first byte of the first entry's owner
        bytes[HEADER_LEN + 4 + 2] ^= 0x01;
        assert!(matches!(
            read_snapshot(&mut Cursor::new(bytes)),
            Err(SnapshotError::CrcMismatch { index: 0 })
        ));
    }

    #[test]
    fn duplicate_keys_rejected() {
        let entry = sample_entries().remove(0);
        let bytes = encode(&[entry.clone(), entry]);
        assert!(matches!(
            read_snapshot(&mut Cursor::new(bytes)),
            Err(SnapshotError::DuplicateKey { index: 1 })
        ));
    }

    #[test]
    fn unknown_pin_type_is_malformed() {
        let key = AggregationKey::new("o", 1, 1, PinType::Digital, 1, 1);
        let mut payload = encode_entry(&key, &Accumulator::from_parts(1.0, 1), 0).unwrap();
        // pin type byte follows the owner, dashboard and device fields
        payload[2 + 1 + 4 + 4] = b'z';
        assert!(matches!(
            decode_entry(&payload, 0),
            Err(SnapshotError::Malformed { index: 0, .. })
        ));
    }
}
