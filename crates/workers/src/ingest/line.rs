use beacon_common::{PinIdentity, PinType};

/// One raw sample as delivered by a source. The value stays unparsed; the
/// aggregator decides whether it is numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub identity: PinIdentity,
    pub timestamp_ms: i64,
    pub raw_value: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LineError {
    #[error("expected 7 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
}

/// Parses `owner dashboard device pintype pin timestamp value`.
pub fn parse_line(line: &str) -> Result<Sample, LineError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[owner, dashboard, device, pin_type, pin, ts, value] = fields.as_slice() else {
        return Err(LineError::FieldCount(fields.len()));
    };

    Ok(Sample {
        identity: PinIdentity::new(
            owner,
            number(dashboard, "dashboard")?,
            number(device, "device")?,
            pin_type.parse::<PinType>().map_err(|_| invalid("pin type", pin_type))?,
            number(pin, "pin")?,
        ),
        timestamp_ms: number(ts, "timestamp")?,
        raw_value: value.to_string(),
    })
}

fn number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, LineError> {
    value.parse().map_err(|_| invalid(field, value))
}

fn invalid(field: &'static str, value: &str) -> LineError {
    LineError::InvalidField {
        field,
        value: value.to_string(),
    }
}
