//! Raw fragment store.
//!
//! Values are serialized the moment they are staged and kept as unparsed JSON
//! text until a caller supplies a concrete target type. A stored fragment is
//! never edited in place; a slot is only ever replaced or cleared.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{Error, Result};

/// One JSON value kept in its encoded form.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFragment(Box<RawValue>);

impl RawFragment {
    /// Serialize `value` into a new fragment.
    pub fn put<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::value::to_raw_value(value)
            .map(Self)
            .map_err(Error::Encoding)
    }

    /// Wrap already-encoded JSON text, validating that it holds one value.
    pub fn from_json(json: impl Into<String>) -> Result<Self> {
        RawValue::from_string(json.into())
            .map(Self)
            .map_err(Error::Decode)
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.get().as_bytes()
    }

    /// True when the fragment is the JSON literal `null`.
    pub fn is_null(&self) -> bool {
        self.0.get().trim() == "null"
    }

    /// Decode into a new value of type `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        decode_text(self.as_str())
    }
}

impl fmt::Debug for RawFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawFragment").field(&self.as_str()).finish()
    }
}

impl fmt::Display for RawFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for RawFragment {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RawFragment {}

/// Decode `fragment` into the caller's `target`, writing through the reference.
///
/// An absent fragment is treated as JSON `null`: targets that accept null
/// (`Option<T>`, `()`, `serde_json::Value`) decode it, every other target
/// fails with [`Error::NilFragment`]. On failure `target` is left untouched.
pub fn materialize<T: DeserializeOwned>(fragment: Option<&RawFragment>, target: &mut T) -> Result<()> {
    let text = fragment.map_or("null", RawFragment::as_str);
    *target = decode_text(text)?;
    Ok(())
}

fn decode_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|err| {
        if text.trim() == "null" {
            Error::nil_fragment(format!(
                "null cannot be decoded into {}",
                std::any::type_name::<T>()
            ))
        } else {
            Error::Decode(err)
        }
    })
}

// =============================================================================
// Stores
// =============================================================================

/// Index-addressed fragments in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentArray {
    items: Vec<RawFragment>,
}

impl FragmentArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: RawFragment) {
        self.items.push(fragment);
    }

    pub fn get(&self, index: usize) -> Option<&RawFragment> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawFragment> {
        self.items.iter()
    }
}

impl From<Vec<RawFragment>> for FragmentArray {
    fn from(items: Vec<RawFragment>) -> Self {
        Self { items }
    }
}

/// Key-addressed fragments; the last write for a key wins.
///
/// Keys are kept sorted so the encoded `ObjMap` is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentMap {
    entries: BTreeMap<String, RawFragment>,
}

impl FragmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `fragment` under `key`, returning the fragment it replaced.
    pub fn insert(&mut self, key: impl Into<String>, fragment: RawFragment) -> Option<RawFragment> {
        self.entries.insert(key.into(), fragment)
    }

    pub fn get(&self, key: &str) -> Option<&RawFragment> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Move every entry of `other` into this map, overwriting shared keys.
    pub fn extend(&mut self, other: FragmentMap) {
        self.entries.extend(other.entries);
    }
}
