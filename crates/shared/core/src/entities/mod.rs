mod alarm;
mod announcement;
mod message;
mod price_state;

pub use alarm::{Alarm, AlarmKind};
pub use announcement::{Announcement, SensorDescriptor};
pub use message::{PriceMessage, QueueEntry};
pub use price_state::{PriceSample, PriceState};
