//! NotaryPy Gateway - hosting surfaces for the badge resolver.
//!
//! This crate provides:
//! - An axum HTTP server that sends every request to the badge handler
//! - A serverless function adapter speaking the `{ path,
//!   queryStringParameters }` / `{ statusCode, headers, body }` event shape
//! - Conversion from the layered config into resolver and logging settings
//!
//! # Example
//!
//! ```rust,no_run
//! use notarypy_config::Config;
//! use notarypy_gateway::{config_bridge, server};
//!
//! # async fn run() -> Result<(), notarypy_gateway::GatewayError> {
//! let config = Config::default();
//! let resolver = config_bridge::build_resolver(&config)?;
//! let addr = config_bridge::bind_addr(&config)?;
//! server::serve(addr, resolver, server::ctrl_c()).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod function;
pub mod server;

mod dispatch;
mod error;

pub use dispatch::dispatch;
pub use error::{GatewayError, GatewayResult};
pub use function::{FunctionEvent, FunctionResponse, handle_event, handle_event_json};
