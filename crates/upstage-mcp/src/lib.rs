//! Upstage MCP - Document Intelligence over the Model Context Protocol
//!
//! This crate exposes four Upstage document-intelligence operations (parse,
//! extract, schema generation, classification) as MCP tools, over two
//! transports: newline-delimited JSON-RPC on stdio and HTTP with
//! Server-Sent Events.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use upstage_mcp::{ServerConfig, mcp::{Dispatcher, stdio}};
//!
//! #[tokio::main]
//! async fn main() -> upstage_mcp::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let dispatcher = Dispatcher::new(Arc::new(config))?;
//!     stdio::run(&dispatcher).await
//! }
//! ```
//!
//! # Architecture
//!
//! - **Validation** (`validation`): existence, extension allow-list, and
//!   size checks before any network call
//! - **Schemas** (`schema`): typed extraction/classification schemas, shape
//!   validation, and static templates
//! - **Client** (`client`): the Upstage API client with bounded
//!   exponential-backoff retry
//! - **Tools** (`tools`): the four tool handler pipelines and their registry
//! - **MCP** (`mcp`): JSON-RPC envelope types, transport-agnostic dispatch,
//!   stdio and HTTP bindings

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod output;
pub mod progress;
pub mod schema;
pub mod tools;
pub mod validation;

pub use client::ApiClient;
pub use config::{RetryPolicy, ServerConfig};
pub use error::{Result, UpstageError};
pub use tools::{ToolOutput, ToolRegistry};
