//! NotaryPy Telemetry - Logging and request tracing for the badge service.
//!
//! This crate provides:
//! - Configurable logging setup with several output formats
//! - Request context for correlating log lines of one badge request
//!
//! # Example
//!
//! ```rust,no_run
//! use notarypy_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), notarypy_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("notarypy_core=debug");
//!
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("gateway", "/badge/sampleproject/4.0.0/sampleproject-4.0.0.tar.gz");
//! let _guard = ctx.span().entered();
//! ctx.finish(302);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_logging};
