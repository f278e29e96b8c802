use beacon_common::{Granularity, PinIdentity, PinType};

/// Identity of one accumulator: a pin plus the index of its time window.
/// Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregationKey {
    owner: String,
    dashboard_id: i32,
    device_id: i32,
    pin_type: PinType,
    pin: i32,
    bucket: i64,
}

impl AggregationKey {
    pub fn new(
        owner: impl Into<String>,
        dashboard_id: i32,
        device_id: i32,
        pin_type: PinType,
        pin: i32,
        bucket: i64,
    ) -> Self {
        Self {
            owner: owner.into(),
            dashboard_id,
            device_id,
            pin_type,
            pin,
            bucket,
        }
    }

    /// Key for the window of `granularity` that contains `timestamp_ms`.
    pub fn for_sample(identity: &PinIdentity, granularity: Granularity, timestamp_ms: i64) -> Self {
        Self::new(
            identity.owner.clone(),
            identity.dashboard_id,
            identity.device_id,
            identity.pin_type,
            identity.pin,
            granularity.bucket(timestamp_ms),
        )
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn dashboard_id(&self) -> i32 {
        self.dashboard_id
    }

    pub fn device_id(&self) -> i32 {
        self.device_id
    }

    pub fn pin_type(&self) -> PinType {
        self.pin_type
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    pub fn bucket(&self) -> i64 {
        self.bucket
    }

    pub fn identity(&self) -> PinIdentity {
        PinIdentity::new(
            self.owner.clone(),
            self.dashboard_id,
            self.device_id,
            self.pin_type,
            self.pin,
        )
    }
}
