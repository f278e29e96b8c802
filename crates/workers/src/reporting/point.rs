use serde::Serialize;

/// Encoded size of one point: bucket start millis then average, both 8 bytes.
pub const POINT_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub timestamp_ms: i64,
    pub average: f64,
}

impl HistoryPoint {
    pub fn encode(&self) -> [u8; POINT_SIZE] {
        let mut buf = [0u8; POINT_SIZE];
        buf[..8].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        buf[8..].copy_from_slice(&self.average.to_bits().to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; POINT_SIZE]) -> Self {
        let mut ts = [0u8; 8];
        let mut avg = [0u8; 8];
        ts.copy_from_slice(&buf[..8]);
        avg.copy_from_slice(&buf[8..]);
        Self {
            timestamp_ms: i64::from_le_bytes(ts),
            average: f64::from_bits(u64::from_le_bytes(avg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_layout() {
        let p = HistoryPoint {
            timestamp_ms: 1_438_387_200_000,
            average: 49.5,
        };
        let bytes = p.encode();
        assert_eq!(&bytes[..8], &1_438_387_200_000i64.to_le_bytes());
        assert_eq!(HistoryPoint::decode(&bytes), p);
    }
}
