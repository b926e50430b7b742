//! # iojson - JSON envelope with deferred decoding
//!
//! A response/request envelope for JSON services:
//! - Stage heterogeneous values as raw JSON fragments (`add_obj`, `add_data`)
//! - Decode them later into a caller-chosen type (`get_obj`, `get_data`)
//! - Collect error messages that flip `Status` and drop the staged payload
//! - Encode the whole envelope to one document, or decode one with a size cap
//! - Serve it over HTTP with an axum adapter
//!
//! ## Wire format
//!
//! ```text
//! {"Status":true,"ErrArr":[],"ObjArr":[{"Name":"Car"}],"ObjMap":{"Car":{"Name":"BMW"}}}
//! ```
//!
//! ## Example
//!
//! ```
//! use iojson::Envelope;
//!
//! let mut envelope = Envelope::new();
//! envelope.add_data("Amt", &123.8).unwrap();
//!
//! let mut amount = 0.0f64;
//! envelope.get_data("Amt", &mut amount).unwrap();
//! assert_eq!(amount, 123.8);
//!
//! assert_eq!(
//!     envelope.encode_string(),
//!     r#"{"Status":true,"ErrArr":[],"ObjArr":[],"ObjMap":{"Amt":123.8}}"#
//! );
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod envelope;
pub mod http;
pub mod types;

// Internal utilities
pub mod observability;

pub use envelope::{Envelope, RawFragment};
pub use types::{Config, EnvelopeConfig, Error, Result};
