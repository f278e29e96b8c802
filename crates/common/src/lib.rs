pub mod clock;
pub mod granularity;
pub mod identity;
pub mod pin;

pub use granularity::{Granularity, DAY, HOUR};
pub use identity::PinIdentity;
pub use pin::PinType;
