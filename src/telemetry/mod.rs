//! UDP multicast telemetry: fixed 64-byte wire packets, a fire-and-forget
//! publisher, and a background-thread subscriber.

pub mod packet;
pub mod publisher;
pub mod subscriber;

pub use packet::{Side, TelemetryPacket, TelemetryType};
pub use publisher::TelemetryPublisher;
pub use subscriber::TelemetrySubscriber;
