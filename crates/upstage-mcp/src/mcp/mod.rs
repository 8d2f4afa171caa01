//! Model Context Protocol bindings.
//!
//! One routing table, two transports: [`dispatcher::Dispatcher`] owns the
//! tool registry and the JSON-RPC semantics, while [`stdio`] and [`http`]
//! only move bytes in and out.

pub mod dispatcher;
pub mod http;
pub mod protocol;
pub mod stdio;

pub use dispatcher::Dispatcher;
