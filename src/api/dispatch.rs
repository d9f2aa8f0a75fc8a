//! Dispatch-side records: distance overrides, consolidation groups and rates.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::common::{RecordMeta, Status};
use super::{Resource, WritableResource};

/// Replaces the routing engine's mileage for one origin/destination pair.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_distinct_locations"))]
pub struct DistanceOverride {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[validate(length(min = 1))]
    pub origin_location_id: String,
    #[validate(length(min = 1))]
    pub destination_location_id: String,
    /// Limits the override to one customer's shipments.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Miles.
    #[validate(range(exclusive_min = 0.0))]
    pub distance: f64,
}

fn validate_distinct_locations(d: &DistanceOverride) -> Result<(), ValidationError> {
    if d.origin_location_id == d.destination_location_id {
        return Err(ValidationError::new("same_origin_and_destination")
            .with_message("Origin and destination must be different locations".into()));
    }
    Ok(())
}

impl Resource for DistanceOverride {
    const PATH: &'static str = "/distance-overrides/";
    const NAME: &'static str = "distance_override";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        format!("{} -> {}", self.origin_location_id, self.destination_location_id)
    }
}

impl WritableResource for DistanceOverride {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsolidationStatus {
    #[default]
    New,
    InProgress,
    Completed,
    Canceled,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationGroup {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: ConsolidationStatus,
    /// Assigned by the server on create.
    #[serde(default)]
    pub consolidation_number: Option<String>,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shipment_ids: Vec<String>,
}

impl ConsolidationGroup {
    #[must_use]
    pub fn contains(&self, shipment_id: &str) -> bool {
        self.shipment_ids.iter().any(|id| id == shipment_id)
    }

    /// Add a shipment once; returns false if it was already grouped.
    pub fn add_shipment(&mut self, shipment_id: &str) -> bool {
        if self.contains(shipment_id) {
            return false;
        }
        self.shipment_ids.push(shipment_id.to_owned());
        true
    }

    pub fn remove_shipment(&mut self, shipment_id: &str) -> bool {
        let before = self.shipment_ids.len();
        self.shipment_ids.retain(|id| id != shipment_id);
        self.shipment_ids.len() != before
    }
}

impl Resource for ConsolidationGroup {
    const PATH: &'static str = "/consolidations/";
    const NAME: &'static str = "consolidation";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        self.consolidation_number
            .clone()
            .or_else(|| self.meta.id.clone())
            .unwrap_or_default()
    }
}

impl WritableResource for ConsolidationGroup {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateMethod {
    #[default]
    FlatRate,
    PerMile,
    PerStop,
    PerPound,
    PerPallet,
}

/// A customer rate for a lane, valid between two dates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_rate_dates"))]
pub struct Rate {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[serde(default)]
    pub rate_number: Option<String>,
    #[validate(length(min = 1))]
    pub customer_id: String,
    /// Unix seconds.
    pub effective_date: i64,
    /// Unix seconds.
    pub expiration_date: i64,
    #[serde(default)]
    pub commodity_id: Option<String>,
    #[serde(default)]
    pub equipment_type_id: Option<String>,
    #[serde(default)]
    pub origin_location_id: Option<String>,
    #[serde(default)]
    pub destination_location_id: Option<String>,
    pub rate_method: RateMethod,
    #[validate(range(min = 0.0))]
    pub rate_amount: f64,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub comment: Option<String>,
}

fn validate_rate_dates(r: &Rate) -> Result<(), ValidationError> {
    if r.effective_date > r.expiration_date {
        return Err(ValidationError::new("effective_after_expiration")
            .with_message("Effective date must not be after the expiration date".into()));
    }
    Ok(())
}

impl Rate {
    /// Whether `at` (unix seconds) falls inside the rate's validity window.
    #[must_use]
    pub fn is_effective_at(&self, at: i64) -> bool {
        self.status == Status::Active && (self.effective_date..=self.expiration_date).contains(&at)
    }
}

impl Resource for Rate {
    const PATH: &'static str = "/rates/";
    const NAME: &'static str = "rate";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        self.rate_number
            .clone()
            .unwrap_or_else(|| format!("{:?} {:.2}", self.rate_method, self.rate_amount))
    }
}

impl WritableResource for Rate {}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
