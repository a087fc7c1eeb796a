//! Adapters implementing the application ports

mod control_plane_adapter;
mod event_store_adapter;
mod log_document;
mod proxy_adapter;

pub use control_plane_adapter::ControlPlaneAdapter;
pub use event_store_adapter::ElasticsearchEventStore;
pub use proxy_adapter::GremlinProxyAdapter;
