//! Trailers and the equipment lookups they reference.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{RecordMeta, Status};
use super::{Resource, WritableResource};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentClass {
    #[default]
    Trailer,
    Tractor,
    Container,
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentType {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[validate(length(min = 1, max = 10))]
    pub code: String,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub description: Option<String>,
    pub class: EquipmentClass,
    /// Hex color used to tag the type in tables, e.g. `#1f77b4`.
    #[validate(length(min = 4, max = 7))]
    #[serde(default)]
    pub color: Option<String>,
}

impl Resource for EquipmentType {
    const PATH: &'static str = "/equipment-types/";
    const NAME: &'static str = "equipment_type";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        self.code.clone()
    }
}

impl WritableResource for EquipmentType {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FleetCode {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[validate(length(min = 1, max = 10))]
    pub name: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub revenue_goal: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub deadhead_goal: Option<f64>,
    /// User id of the fleet manager.
    #[serde(default)]
    pub manager_id: Option<String>,
}

impl Resource for FleetCode {
    const PATH: &'static str = "/fleet-codes/";
    const NAME: &'static str = "fleet_code";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl WritableResource for FleetCode {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentStatus {
    #[default]
    Available,
    OutOfService,
    AtMaintenance,
    Sold,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Trailer {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: EquipmentStatus,
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1))]
    pub equipment_type_id: String,
    #[serde(default)]
    pub fleet_code_id: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub make: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    #[serde(default)]
    pub year: Option<u16>,
    #[validate(length(equal = 17))]
    #[serde(default)]
    pub vin: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub license_plate_number: Option<String>,
    /// Two-letter state or province code.
    #[validate(length(equal = 2))]
    #[serde(default)]
    pub registration_state: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub last_inspection_date: Option<i64>,
}

impl Resource for Trailer {
    const PATH: &'static str = "/trailers/";
    const NAME: &'static str = "trailer";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        self.code.clone()
    }
}

impl WritableResource for Trailer {}

#[cfg(test)]
#[path = "equipment_test.rs"]
mod tests;
