//! Port definitions (interfaces to the outside world)

pub mod decision_store;
pub mod observer;
pub mod provider_gateway;
pub mod research;
