//! # Transient storage
//!
//! The order travels from the configurator to the checkout page, and later to
//! the thank-you page, through a single per-tab storage slot.
//!
//! | Key                       | Value                     |
//! |---------------------------|---------------------------|
//! | [`ORDER_STORAGE_KEY`]     | JSON [`OrderRecord`]      |
//!
//! The slot is written once on submission and cleared once the post-payment
//! confirmation went through.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::StorageError;
use crate::order::OrderRecord;

pub const ORDER_STORAGE_KEY: &str = "ecomshop_order_v1";

/// Key/value storage scoped to one browser tab.
pub trait TransientStorage {
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Every call fails, as in a locked-down private window.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl TransientStorage for MemoryStorage {
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        if let Some(quota) = self.quota {
            if self.used_without(key) + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        Ok(self.items.get(key).cloned())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        self.items.remove(key);
        Ok(())
    }
}

/// Read the stored order. Unreadable or malformed entries count as absent, as
/// do entries lacking a `config` or `customer` object.
pub fn load_order(storage: &impl TransientStorage) -> Option<OrderRecord> {
    let raw = storage.get_item(ORDER_STORAGE_KEY).ok()??;
    let value: Value = serde_json::from_str(&raw).ok()?;
    if !["config", "customer"].iter().all(|k| value.get(k).is_some_and(Value::is_object)) {
        return None;
    }
    serde_json::from_value(value).ok()
}
