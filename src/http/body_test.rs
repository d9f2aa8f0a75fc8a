use serde_json::json;

use super::*;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[test]
fn fields_without_files_become_json() {
    let body = RequestBody::from_parts(object(json!({ "name": "Steel coils", "isHazmat": false })), vec![]);
    assert_eq!(body, RequestBody::Json(json!({ "name": "Steel coils", "isHazmat": false })));
    assert_eq!(body.upload_len(), 0);
}

#[test]
fn any_file_forces_multipart_with_stringified_fields() {
    let file = UploadFile::new("file", "bol.pdf", vec![1, 2, 3]).with_content_type("application/pdf");
    let body = RequestBody::from_parts(
        object(json!({ "documentType": "BOL", "pages": 2, "notes": null })),
        vec![file.clone()],
    );

    let RequestBody::Multipart { fields, files } = &body else {
        panic!("expected multipart body, got {body:?}");
    };
    assert!(fields.contains(&("documentType".to_owned(), "BOL".to_owned())));
    assert!(fields.contains(&("pages".to_owned(), "2".to_owned())));
    assert!(!fields.iter().any(|(k, _)| k == "notes"));
    assert_eq!(files, &vec![file]);
    assert_eq!(body.upload_len(), 3);
}

#[test]
fn json_helper_serializes_structs() {
    #[derive(serde::Serialize)]
    struct Login<'a> {
        username: &'a str,
    }
    let body = RequestBody::json(&Login { username: "dispatch" }).unwrap();
    assert_eq!(body, RequestBody::Json(json!({ "username": "dispatch" })));
}

#[test]
fn progress_percent_handles_edges() {
    assert_eq!(Progress { sent: 0, total: 0 }.percent(), 100);
    assert_eq!(Progress { sent: 50, total: 200 }.percent(), 25);
    assert_eq!(Progress { sent: 300, total: 200 }.percent(), 100);
}
