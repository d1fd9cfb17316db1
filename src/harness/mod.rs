//! Runtime harness to execute services in the context of modules

mod broker;
mod consumer;
mod heart;
mod module;
mod server;

pub use broker::*;
pub use consumer::*;
pub use heart::*;
pub use module::*;
pub use server::*;
