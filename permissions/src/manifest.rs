//! Wire model of the permission manifest issued at login.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::bloom::{BloomError, BloomFilter};

/// Error returned by [`Manifest::from_json`] and [`Manifest::bloom_filter`].
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest bloom filter is invalid: {0}")]
    Bloom(#[from] BloomError),
}

/// Breadth of records a permission applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataScope {
    All,
    Organization,
    Own,
    #[default]
    None,
}

/// Per-field visibility lists attached to a detailed permission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRules {
    pub allowed: Vec<String>,
    pub read_only: Vec<String>,
    pub denied: Vec<String>,
    pub masked: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceDetail {
    pub standard_ops: u32,
    pub extended_ops: Vec<String>,
    pub data_scope: DataScope,
    pub field_rules: FieldRules,
}

/// Either a bare action bitmask or a detailed record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourcePermission {
    Simple(u32),
    Detailed(ResourceDetail),
}

impl ResourcePermission {
    /// Whether `action` is granted by this record.
    ///
    /// Standard actions are tested against the bitmask; detailed records also
    /// accept any name listed in `extendedOps`.
    #[must_use]
    pub fn allows(&self, action: &str) -> bool {
        let standard = Action::from_name(action);
        match self {
            Self::Simple(mask) => standard.is_some_and(|a| a.is_set_in(*mask)),
            Self::Detailed(detail) => {
                standard.is_some_and(|a| a.is_set_in(detail.standard_ops))
                    || detail.extended_ops.iter().any(|op| op == action)
            }
        }
    }

    #[must_use]
    pub fn standard_ops(&self) -> u32 {
        match self {
            Self::Simple(mask) => *mask,
            Self::Detailed(detail) => detail.standard_ops,
        }
    }
}

/// Base64 Bloom filter of granted `resource:action` keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomFilterBlob {
    pub bits: String,
    pub hash_count: u32,
}

/// Server-issued snapshot of a user's permissions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manifest {
    pub version: String,
    pub user_id: String,
    pub organization_id: String,
    pub business_unit_id: String,
    pub roles: Vec<String>,
    pub resources: HashMap<String, ResourcePermission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_filter: Option<BloomFilterBlob>,
    /// Unix seconds after which the manifest must be refreshed.
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Manifest {
    /// Parse a manifest from its JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Json`] when the payload does not match the
    /// manifest shape.
    pub fn from_json(body: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Decode the embedded Bloom filter, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Bloom`] for a malformed blob.
    pub fn bloom_filter(&self) -> Result<Option<BloomFilter>, ManifestError> {
        self.bloom_filter
            .as_ref()
            .map(|blob| BloomFilter::from_base64(&blob.bits, blob.hash_count))
            .transpose()
            .map_err(ManifestError::from)
    }

    #[must_use]
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.expires_at <= now_unix
    }
}

/// Key format used for Bloom filter membership.
#[must_use]
pub fn bloom_key(resource: &str, action: &str) -> String {
    format!("{resource}:{action}")
}
