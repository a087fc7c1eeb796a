//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod control_plane_port;
mod event_store_port;
mod proxy_control_port;

#[cfg(test)]
pub use control_plane_port::MockControlPlanePort;
pub use control_plane_port::ControlPlanePort;
#[cfg(test)]
pub use event_store_port::MockEventStorePort;
pub use event_store_port::{EventQuery, EventSet, EventStorePort, GroupCount};
#[cfg(test)]
pub use proxy_control_port::MockProxyControlPort;
pub use proxy_control_port::ProxyControlPort;
