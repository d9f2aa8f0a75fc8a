//! Users, outbound email profiles and the audit trail.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::common::{RecordMeta, Status};
use super::{Resource, WritableResource};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    #[validate(email)]
    pub email_address: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// IANA zone name, e.g. `America/New_York`.
    #[validate(length(min = 1))]
    pub timezone: String,
    #[serde(default)]
    pub role_ids: Vec<String>,
    #[validate(url)]
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    /// Unix seconds.
    #[serde(default)]
    pub last_login_at: Option<i64>,
}

impl Resource for User {
    const PATH: &'static str = "/users/";
    const NAME: &'static str = "user";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        format!("{} ({})", self.name, self.username)
    }
}

impl WritableResource for User {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmailProtocol {
    #[default]
    Tls,
    Ssl,
    Unencrypted,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailProfile {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub protocol: EmailProtocol,
    #[validate(length(min = 1, max = 255))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u32,
    #[serde(default)]
    pub username: Option<String>,
    /// Write-only; the server never echoes it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Resource for EmailProfile {
    const PATH: &'static str = "/email-profiles/";
    const NAME: &'static str = "email_profile";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

impl WritableResource for EmailProfile {}

/// One recorded change. The server writes these; clients only read them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub resource: String,
    pub resource_id: String,
    /// Action name as used in the permission manifest, e.g. `update`.
    pub action: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub changes: Value,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl AuditLog {
    /// Top-level keys touched by the change.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&str> {
        match &self.changes {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl Resource for AuditLog {
    const PATH: &'static str = "/audit-logs/";
    const NAME: &'static str = "audit_log";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        format!("{} {} {}", self.action, self.resource, self.resource_id)
    }
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
