use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pin::PinType;

/// One reporting source: a pin on a device within an owner's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinIdentity {
    pub owner: String,
    pub dashboard_id: i32,
    pub device_id: i32,
    pub pin_type: PinType,
    pub pin: i32,
}

impl PinIdentity {
    pub fn new(
        owner: impl Into<String>,
        dashboard_id: i32,
        device_id: i32,
        pin_type: PinType,
        pin: i32,
    ) -> Self {
        Self {
            owner: owner.into(),
            dashboard_id,
            device_id,
            pin_type,
            pin,
        }
    }
}

impl fmt::Display for PinIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}{}",
            self.owner, self.dashboard_id, self.device_id, self.pin_type, self.pin
        )
    }
}
