//! Core types shared by the envelope and the transport adapter.
//!
//! - **Errors**: error enum with thiserror derives
//! - **Config**: decode limit, debug toggle, server and logging settings

mod config;
mod errors;

pub use config::{
    Config, EnvelopeConfig, ObservabilityConfig, ServerConfig, DEFAULT_MAX_DECODE_BYTES, KB, MB,
};
pub use errors::{Error, Result};
