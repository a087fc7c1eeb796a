//! Domain entities - Objects with identity and lifecycle

mod event;
mod fault_rule;
mod topology;

pub use event::{ABORT_ACTION, Event, EventKind, GroupKey};
pub use fault_rule::{FaultRule, RESET_CONNECTION, Trigger};
pub use topology::{Service, ServiceSpec, Topology, TopologyModel};
