// Domain layer: transient request-scoped models and ports (interfaces).

pub mod model;
pub mod ports;
