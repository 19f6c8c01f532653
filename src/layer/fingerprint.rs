//! Canonical fingerprint of everything a layer's content depends on

use crate::checksum::sha256_bytes;
use crate::error::JvmLayerResult;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered key -> value payload compared byte-for-byte in canonical form.
///
/// Keys are kept sorted and nested objects serialize with sorted keys, so
/// two payloads built from the same inputs in any order are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint(BTreeMap<String, Value>);

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `key`, replacing any earlier value
    pub fn insert<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> JvmLayerResult<()> {
        self.0.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON with sorted keys
    pub fn canonical(&self) -> JvmLayerResult<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// SHA256 of the canonical form
    pub fn digest(&self) -> JvmLayerResult<String> {
        Ok(sha256_bytes(self.canonical()?.as_bytes()))
    }
}
