use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of pin a value was reported on. Serialized as its single-char code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum PinType {
    Digital,
    Analog,
    Virtual,
}

impl PinType {
    pub const ALL: [PinType; 3] = [PinType::Digital, PinType::Analog, PinType::Virtual];

    pub fn as_char(self) -> char {
        match self {
            Self::Digital => 'd',
            Self::Analog => 'a',
            Self::Virtual => 'v',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'd' => Some(Self::Digital),
            'a' => Some(Self::Analog),
            'v' => Some(Self::Virtual),
            _ => None,
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<PinType> for char {
    fn from(p: PinType) -> char {
        p.as_char()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPinType(pub String);

impl fmt::Display for UnknownPinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pin type '{}'", self.0)
    }
}

impl std::error::Error for UnknownPinType {}

impl TryFrom<char> for PinType {
    type Error = UnknownPinType;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_char(c).ok_or_else(|| UnknownPinType(c.to_string()))
    }
}

impl FromStr for PinType {
    type Err = UnknownPinType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "digital" => Ok(Self::Digital),
            "analog" => Ok(Self::Analog),
            "virtual" => Ok(Self::Virtual),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::try_from(c),
                    _ => Err(UnknownPinType(s.to_string())),
                }
            }
        }
    }
}
