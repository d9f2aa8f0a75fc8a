//! Commodities and hazardous-material references.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::common::{RecordMeta, Status};
use super::{Resource, WritableResource};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_temperature_range"))]
pub struct Commodity {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub description: Option<String>,
    /// Degrees Fahrenheit.
    #[validate(range(min = -100, max = 200))]
    #[serde(default)]
    pub min_temperature: Option<i16>,
    #[validate(range(min = -100, max = 200))]
    #[serde(default)]
    pub max_temperature: Option<i16>,
    #[serde(default)]
    pub hazardous_material_id: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub weight_per_unit: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub linear_feet_per_unit: Option<f64>,
    #[serde(default)]
    pub freight_class: Option<String>,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub fragile: bool,
}

fn validate_temperature_range(c: &Commodity) -> Result<(), ValidationError> {
    match (c.min_temperature, c.max_temperature) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("min_temperature_above_max")
            .with_message("Minimum temperature must not exceed maximum temperature".into())),
        _ => Ok(()),
    }
}

impl Resource for Commodity {
    const PATH: &'static str = "/commodities/";
    const NAME: &'static str = "commodity";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl WritableResource for Commodity {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardousClass {
    #[default]
    #[serde(rename = "HazardClass1")]
    Explosives,
    #[serde(rename = "HazardClass2")]
    Gases,
    #[serde(rename = "HazardClass3")]
    FlammableLiquids,
    #[serde(rename = "HazardClass4")]
    FlammableSolids,
    #[serde(rename = "HazardClass5")]
    Oxidizers,
    #[serde(rename = "HazardClass6")]
    Toxic,
    #[serde(rename = "HazardClass7")]
    Radioactive,
    #[serde(rename = "HazardClass8")]
    Corrosive,
    #[serde(rename = "HazardClass9")]
    Miscellaneous,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HazardousMaterial {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub status: Status,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub class: HazardousClass,
    /// UN/NA identification number, e.g. `UN1203`.
    #[validate(length(min = 6, max = 6))]
    #[serde(default)]
    pub un_number: Option<String>,
    #[serde(default)]
    pub packing_group: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

impl Resource for HazardousMaterial {
    const PATH: &'static str = "/hazardous-materials/";
    const NAME: &'static str = "hazardous_material";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn label(&self) -> String {
        match &self.un_number {
            Some(un) => format!("{un} {}", self.name),
            None => self.name.clone(),
        }
    }
}

impl WritableResource for HazardousMaterial {}

#[cfg(test)]
#[path = "commodity_test.rs"]
mod tests;
