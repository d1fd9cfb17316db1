//! Constants shared across modules

/// Default port of the users service HTTP API
pub const PORT_USERS: &str = "3001";

/// Default port of the orders service HTTP API
pub const PORT_ORDERS: &str = "3002";

/// Default queue consumed by the orders service
pub const QUEUE_ORDERS: &str = "orders.q";
