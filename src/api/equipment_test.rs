use serde_json::json;

use super::*;

fn trailer() -> Trailer {
    Trailer {
        code: "TRL-1001".into(),
        equipment_type_id: "et_53dry".into(),
        vin: Some("1UYVS2530DU123456".into()),
        year: Some(2019),
        ..Trailer::default()
    }
}

#[test]
fn valid_trailer_passes() {
    assert!(trailer().validate().is_ok());
}

#[test]
fn trailer_requires_equipment_type() {
    let t = Trailer { equipment_type_id: String::new(), ..trailer() };
    let errors = t.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("equipment_type_id"));
}

#[test]
fn vin_must_be_seventeen_characters() {
    let t = Trailer { vin: Some("SHORTVIN".into()), ..trailer() };
    let errors = t.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("vin"));
}

#[test]
fn model_year_is_bounded() {
    let t = Trailer { year: Some(1850), ..trailer() };
    assert!(t.validate().is_err());
}

#[test]
fn trailer_references_serialize_as_ids() {
    let t = Trailer { fleet_code_id: Some("fc_east".into()), ..trailer() };
    let v = serde_json::to_value(&t).unwrap();
    assert_eq!(v["equipmentTypeId"], "et_53dry");
    assert_eq!(v["fleetCodeId"], "fc_east");
    assert_eq!(v["status"], "Available");
}

#[test]
fn equipment_type_parses_class() {
    let et: EquipmentType = serde_json::from_value(json!({
        "id": "et_1",
        "status": "Active",
        "code": "REEF",
        "class": "Container"
    }))
    .unwrap();
    assert_eq!(et.class, EquipmentClass::Container);
    assert_eq!(et.label(), "REEF");
    assert!(et.validate().is_ok());
}

#[test]
fn fleet_code_rejects_negative_goals() {
    let fc = FleetCode { name: "EAST".into(), revenue_goal: Some(-5.0), ..FleetCode::default() };
    let errors = fc.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("revenue_goal"));
}
