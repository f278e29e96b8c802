use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const HOUR: i64 = 3_600_000;
pub const DAY: i64 = 86_400_000;

/// Fixed, epoch-aligned window sizes. Not calendar or timezone aware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
}

impl Granularity {
    pub const ALL: [Granularity; 2] = [Granularity::Hourly, Granularity::Daily];

    pub fn millis(self) -> i64 {
        match self {
            Self::Hourly => HOUR,
            Self::Daily => DAY,
        }
    }

    /// Index of the window containing `timestamp_ms`. Floors toward negative
    /// infinity so pre-epoch timestamps stay in their own window.
    pub fn bucket(self, timestamp_ms: i64) -> i64 {
        timestamp_ms.div_euclid(self.millis())
    }

    pub fn bucket_start_ms(self, bucket: i64) -> i64 {
        bucket.saturating_mul(self.millis())
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" | "hour" => Ok(Self::Hourly),
            "daily" | "day" => Ok(Self::Daily),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_is_integer_division() {
        // 2015-08-01T00:00:00Z
        let ts = 1_438_387_200_000;
        assert_eq!(Granularity::Hourly.bucket(ts), ts / HOUR);
        assert_eq!(Granularity::Daily.bucket(ts), ts / DAY);
        assert_eq!(Granularity::Hourly.bucket(ts + HOUR - 1), ts / HOUR);
        assert_eq!(Granularity::Hourly.bucket(ts + HOUR), ts / HOUR + 1);
    }

    #[test]
    fn negative_timestamps_floor() {
        assert_eq!(Granularity::Hourly.bucket(-1), -1);
        assert_eq!(Granularity::Daily.bucket(-DAY), -1);
        assert_eq!(Granularity::Daily.bucket(-DAY - 1), -2);
    }

    #[test]
    fn every_hour_of_a_day_shares_the_day_bucket() {
        let day_start = 1_438_387_200_000;
        let day = Granularity::Daily.bucket(day_start);
        for h in 0..24 {
            assert_eq!(Granularity::Daily.bucket(day_start + h * HOUR), day);
        }
        assert_eq!(Granularity::Daily.bucket_start_ms(day), day_start);
    }

    #[test]
    fn parse_labels() {
        assert_eq!("hourly".parse::<Granularity>(), Ok(Granularity::Hourly));
        assert_eq!("DAY".parse::<Granularity>(), Ok(Granularity::Daily));
        assert!("minute".parse::<Granularity>().is_err());
    }
}
