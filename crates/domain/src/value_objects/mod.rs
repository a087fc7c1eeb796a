//! Value Objects - Immutable, identity-less domain primitives

mod duration;
mod message_type;
mod test_id;
mod tracking_header;

pub use duration::parse_duration;
pub use message_type::{Distribution, MessageType};
pub use test_id::TestId;
pub use tracking_header::{DEFAULT_TRACKING_HEADER, TrackingHeader};
