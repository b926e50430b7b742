//! Envelope import from JSON.
//!
//! Inbound documents use the same shape `encode` produces. Payload fragments
//! are stored as raw text and only decoded by later `get_*` calls. Every field
//! is optional; fields absent from the document leave the envelope unchanged
//! and `ObjMap` entries are merged key by key.

use serde::Deserialize;
use std::io::Read;

use super::{Envelope, FragmentArray, FragmentMap};
use crate::types::{Error, Result};

#[derive(Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "Status", default)]
    status: Option<bool>,
    #[serde(rename = "ErrArr", default)]
    errors: Option<Vec<String>>,
    #[serde(rename = "ObjArr", default)]
    objects: Option<FragmentArray>,
    #[serde(rename = "ObjMap", default)]
    data: Option<FragmentMap>,
}

impl Envelope {
    /// Read and decode one document from `source`, capped at the configured limit.
    pub fn decode<R: Read>(&mut self, source: R) -> Result<()> {
        let limit = self.config.max_decode_bytes;
        self.decode_with_limit(source, limit)
    }

    /// Read and decode one document of at most `max_bytes` from `source`.
    ///
    /// At most `max_bytes + 1` bytes are read; a longer stream fails with
    /// [`Error::SizeLimitExceeded`] before any parsing happens.
    pub fn decode_with_limit<R: Read>(&mut self, source: R, max_bytes: u64) -> Result<()> {
        let mut buf = Vec::new();
        source
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut buf)?;
        self.decode_slice_with_limit(&buf, max_bytes)
    }

    /// Decode an already-buffered document, capped at the configured limit.
    pub fn decode_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let limit = self.config.max_decode_bytes;
        self.decode_slice_with_limit(bytes, limit)
    }

    fn decode_slice_with_limit(&mut self, bytes: &[u8], max_bytes: u64) -> Result<()> {
        if bytes.len() as u64 > max_bytes {
            tracing::warn!(limit = max_bytes, "inbound envelope rejected: over size limit");
            return Err(Error::SizeLimitExceeded { limit: max_bytes });
        }

        let inbound: InboundEnvelope = serde_json::from_slice(bytes).map_err(Error::Decode)?;
        self.apply(inbound);
        tracing::debug!(
            objects = self.obj_len(),
            data = self.data_len(),
            errors = self.errors.len(),
            "inbound envelope decoded"
        );
        Ok(())
    }

    fn apply(&mut self, inbound: InboundEnvelope) {
        if let Some(status) = inbound.status {
            self.status = status;
        }
        if let Some(errors) = inbound.errors {
            self.errors = errors;
        }
        if let Some(objects) = inbound.objects {
            self.objects = objects;
        }
        if let Some(data) = inbound.data {
            self.write_data().extend(data);
        }
    }
}
