use serde_json::json;

use super::*;

#[test]
fn empty_and_missing_values_are_dropped() {
    let q = Query::new()
        .push("limit", 20)
        .push("query", "")
        .push_opt::<&str>("status", None)
        .push_opt("offset", Some(40));
    assert_eq!(
        q.pairs(),
        &[("limit".to_owned(), "20".to_owned()), ("offset".to_owned(), "40".to_owned())]
    );
}

#[test]
fn json_nulls_and_empty_strings_are_dropped() {
    let q = Query::from_object(&json!({
        "status": "A",
        "fleetCodeId": null,
        "search": "",
        "includeInactive": false,
        "minWeight": 1500
    }));
    assert_eq!(q.get("status"), Some("A"));
    assert_eq!(q.get("includeInactive"), Some("false"));
    assert_eq!(q.get("minWeight"), Some("1500"));
    assert_eq!(q.get("fleetCodeId"), None);
    assert_eq!(q.get("search"), None);
}

#[test]
fn arrays_repeat_the_key() {
    let q = Query::new().push_value("status", &json!(["A", "", null, "I"]));
    assert_eq!(
        q.pairs(),
        &[("status".to_owned(), "A".to_owned()), ("status".to_owned(), "I".to_owned())]
    );
}

#[test]
fn object_keys_are_emitted_in_sorted_order() {
    let q = Query::from_object(&json!({ "b": 2, "a": 1, "c": 3 }));
    let keys: Vec<&str> = q.pairs().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["a", "b", "c"]);
}

#[test]
fn non_object_input_yields_empty_query() {
    assert!(Query::from_object(&json!([1, 2])).is_empty());
}
