//! Envelope - the response/request container.
//!
//! An Envelope collects payload fragments and error messages while a unit of
//! work runs, and is serialized once at the end:
//!
//! ```text
//! {
//!   "Status": bool,
//!   "ErrArr": [string, ...],
//!   "ObjArr": [<raw JSON value>, ...],
//!   "ObjMap": {"<key>": <raw JSON value>, ...}
//! }
//! ```
//!
//! Values are serialized when staged (`add_obj`, `add_data`) and only decoded
//! when a caller asks for them with a concrete target type (`get_obj`,
//! `get_data`). If any error was recorded by the time the envelope is encoded,
//! the staged payload is dropped and only the error list is emitted.
//!
//! Locking: the keyed store (`ObjMap`) sits behind a reader/writer lock so
//! `add_data`/`get_data` take `&self` and work on an envelope shared between
//! tasks. The indexed store and the error list need `&mut self`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::{EnvelopeConfig, Error, Result};

pub mod export;
pub mod fragment;
pub mod import;

pub use export::{fallback_document, FALLBACK_MESSAGE};
pub use fragment::{materialize, FragmentArray, FragmentMap, RawFragment};

/// Main envelope structure.
///
/// Create one per request; it is not meant to be reused once encoded.
#[derive(Debug, Default)]
pub struct Envelope {
    status: bool,
    errors: Vec<String>,
    objects: FragmentArray,
    data: RwLock<FragmentMap>,
    config: EnvelopeConfig,
}

impl Envelope {
    /// Create an empty envelope with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty envelope with explicit settings.
    pub fn with_config(config: EnvelopeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    // =========================================================================
    // Indexed store
    // =========================================================================

    /// Serialize `value` and append it to `ObjArr`.
    ///
    /// Nothing is appended when serialization fails.
    pub fn add_obj<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let fragment = RawFragment::put(value)?;
        self.objects.push(fragment);
        Ok(())
    }

    /// Decode the fragment at `index` into `target` and hand the same reference back.
    pub fn get_obj<'t, T: DeserializeOwned>(&self, index: usize, target: &'t mut T) -> Result<&'t mut T> {
        let fragment = self
            .objects
            .get(index)
            .ok_or_else(|| Error::index_out_of_range(index, self.objects.len()))?;
        materialize(Some(fragment), target)?;
        Ok(target)
    }

    /// Decode the fragment at `index` into a new value.
    pub fn obj<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        self.objects
            .get(index)
            .ok_or_else(|| Error::index_out_of_range(index, self.objects.len()))?
            .decode()
    }

    /// The stored fragment at `index`, undecoded.
    pub fn raw_obj(&self, index: usize) -> Option<&RawFragment> {
        self.objects.get(index)
    }

    pub fn obj_len(&self) -> usize {
        self.objects.len()
    }

    // =========================================================================
    // Keyed store
    // =========================================================================

    /// Serialize `value` and store it under `key`, replacing any previous value.
    pub fn add_data<T: Serialize + ?Sized>(&self, key: impl Into<String>, value: &T) -> Result<()> {
        let fragment = RawFragment::put(value)?;
        self.write_data().insert(key, fragment);
        Ok(())
    }

    /// Decode the fragment under `key` into `target` and hand the same reference back.
    pub fn get_data<'t, T: DeserializeOwned>(&self, key: &str, target: &'t mut T) -> Result<&'t mut T> {
        {
            let data = self.read_data();
            let fragment = data.get(key).ok_or_else(|| Error::key_not_found(key))?;
            materialize(Some(fragment), target)?;
        }
        Ok(target)
    }

    /// Decode the fragment under `key` into a new value.
    pub fn data<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.read_data()
            .get(key)
            .ok_or_else(|| Error::key_not_found(key))?
            .decode()
    }

    /// A copy of the stored fragment under `key`, undecoded.
    pub fn raw_data(&self, key: &str) -> Option<RawFragment> {
        self.read_data().get(key).cloned()
    }

    pub fn has_data(&self, key: &str) -> bool {
        self.read_data().contains_key(key)
    }

    pub fn data_len(&self) -> usize {
        self.read_data().len()
    }

    // =========================================================================
    // Errors and status
    // =========================================================================

    /// Record an error message; reported in `ErrArr` in the order recorded.
    ///
    /// With `debug_caller` enabled the caller's `file:line` is appended.
    #[track_caller]
    pub fn add_error(&mut self, message: impl Into<String>) {
        let mut message = message.into();
        if self.config.debug_caller {
            let caller = std::panic::Location::caller();
            message = format!("{message} [{}:{}]", caller.file(), caller.line());
        }
        tracing::debug!(error = %message, "envelope error recorded");
        self.errors.push(message);
    }

    /// Status as of the last encode or decode; `false` before either ran.
    pub fn status(&self) -> bool {
        self.status
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Derive status from the error list and drop the payload if any error exists.
    fn finalize(&mut self) {
        self.status = self.errors.is_empty();
        if !self.status {
            self.objects.clear();
            self.data
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    // Inserts never leave the map half-written, so a poisoned lock is still usable.
    fn read_data(&self) -> RwLockReadGuard<'_, FragmentMap> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_data(&self) -> RwLockWriteGuard<'_, FragmentMap> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}
