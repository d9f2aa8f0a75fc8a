//! Client-side permission evaluation for the back-office apps.
//!
//! DESIGN
//! ======
//! The server issues a [`Manifest`] at login mapping resource names to either
//! a plain action bitmask or a detailed record with extended operations, a
//! data scope and per-field rules. [`PermissionClient`] answers "can the user
//! do X on Y" from that snapshot without a round-trip.
//!
//! An optional Bloom filter of granted `resource:action` keys is consulted
//! first. It can only short-circuit a definite "no"; every "maybe" is decided
//! by the manifest itself.
//!
//! ERROR HANDLING
//! ==============
//! Lookups never fail. Unknown resources, unknown actions and expired
//! manifests all read as "not allowed"; callers check [`PermissionClient::is_expired`]
//! to decide when to refresh.

pub mod action;
pub mod bloom;
pub mod manifest;
pub mod murmur;

pub use action::Action;
pub use bloom::{BloomError, BloomFilter, MAX_HASH_COUNT};
pub use manifest::{
    BloomFilterBlob, DataScope, FieldRules, Manifest, ManifestError, ResourceDetail, ResourcePermission, bloom_key,
};
pub use murmur::murmur3_32;

/// How a single field should be rendered for the current user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldAccess {
    Hidden,
    ReadOnly,
    ReadWrite,
}

/// Evaluates a [`Manifest`] with an optional Bloom pre-check.
#[derive(Clone, Debug)]
pub struct PermissionClient {
    manifest: Manifest,
    bloom: Option<BloomFilter>,
}

impl PermissionClient {
    /// Build a client, decoding the manifest's Bloom filter if present.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Bloom`] when the embedded filter is malformed.
    pub fn new(manifest: Manifest) -> Result<Self, ManifestError> {
        let bloom = manifest.bloom_filter()?;
        Ok(Self { manifest, bloom })
    }

    /// Build a client that ignores any Bloom filter.
    #[must_use]
    pub fn without_bloom(manifest: Manifest) -> Self {
        Self { manifest, bloom: None }
    }

    /// Parse a manifest body and build a client from it.
    ///
    /// # Errors
    ///
    /// Propagates JSON and Bloom decoding failures.
    pub fn from_json(body: &str) -> Result<Self, ManifestError> {
        Self::new(Manifest::from_json(body)?)
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Whether the user may perform `action` on `resource`.
    #[must_use]
    pub fn can(&self, resource: &str, action: &str) -> bool {
        if let Some(bloom) = &self.bloom {
            if !bloom.test(&bloom_key(resource, action)) {
                return false;
            }
        }
        self.manifest
            .resources
            .get(resource)
            .is_some_and(|perm| perm.allows(action))
    }

    #[must_use]
    pub fn can_any(&self, resource: &str, actions: &[&str]) -> bool {
        actions.iter().any(|a| self.can(resource, a))
    }

    #[must_use]
    pub fn can_all(&self, resource: &str, actions: &[&str]) -> bool {
        actions.iter().all(|a| self.can(resource, a))
    }

    /// Classify a field of `resource`.
    ///
    /// Detailed records check `denied`, `readOnly`, `masked`, then `allowed`;
    /// a field in none of them is hidden. Simple bitmasks grant field access
    /// from the resource bits: `update` is read-write, `read` is read-only.
    #[must_use]
    pub fn field_access(&self, resource: &str, field: &str) -> FieldAccess {
        let Some(perm) = self.manifest.resources.get(resource) else {
            return FieldAccess::Hidden;
        };

        match perm {
            ResourcePermission::Simple(mask) => {
                if Action::Update.is_set_in(*mask) {
                    FieldAccess::ReadWrite
                } else if Action::Read.is_set_in(*mask) {
                    FieldAccess::ReadOnly
                } else {
                    FieldAccess::Hidden
                }
            }
            ResourcePermission::Detailed(detail) => classify_field(&detail.field_rules, field),
        }
    }

    /// Breadth of records the user may see for `resource`.
    #[must_use]
    pub fn data_scope(&self, resource: &str) -> DataScope {
        match self.manifest.resources.get(resource) {
            Some(ResourcePermission::Detailed(detail)) => detail.data_scope,
            Some(ResourcePermission::Simple(mask)) if Action::Read.is_set_in(*mask) => DataScope::All,
            _ => DataScope::None,
        }
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.manifest.roles.iter().any(|r| r == role)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_unix())
    }

    #[must_use]
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.manifest.is_expired_at(now_unix)
    }

    /// Seconds until expiry, or zero once expired.
    #[must_use]
    pub fn expires_in(&self, now_unix: i64) -> u64 {
        u64::try_from(self.manifest.expires_at - now_unix).unwrap_or(0)
    }
}

fn classify_field(rules: &FieldRules, field: &str) -> FieldAccess {
    let listed = |list: &[String]| list.iter().any(|f| f == field);

    if listed(&rules.denied) {
        FieldAccess::Hidden
    } else if listed(&rules.read_only) || listed(&rules.masked) {
        FieldAccess::ReadOnly
    } else if listed(&rules.allowed) {
        FieldAccess::ReadWrite
    } else {
        FieldAccess::Hidden
    }
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod lib_test;
