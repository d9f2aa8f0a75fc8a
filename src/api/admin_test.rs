use serde_json::json;

use super::*;

fn email_profile() -> EmailProfile {
    EmailProfile {
        name: "Billing".into(),
        email: "billing@example.com".into(),
        host: "smtp.example.com".into(),
        port: 587,
        ..EmailProfile::default()
    }
}

fn user() -> User {
    User {
        username: "jdoe".into(),
        email_address: "jdoe@example.com".into(),
        name: "Jordan Doe".into(),
        timezone: "America/New_York".into(),
        ..User::default()
    }
}

#[test]
fn email_profile_port_bounds() {
    assert!(email_profile().validate().is_ok());
    assert!(EmailProfile { port: 65535, ..email_profile() }.validate().is_ok());

    for port in [0, 65536] {
        let errors = EmailProfile { port, ..email_profile() }.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("port"), "port {port}");
    }
}

#[test]
fn email_profile_requires_valid_address() {
    let errors = EmailProfile { email: "billing".into(), ..email_profile() }.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("email"));
}

#[test]
fn email_profile_password_is_write_only() {
    let v = serde_json::to_value(email_profile()).unwrap();
    assert!(v.get("password").is_none());
    assert_eq!(v["protocol"], "TLS");

    let with_password = EmailProfile { password: Some("hunter2".into()), ..email_profile() };
    let v = serde_json::to_value(with_password).unwrap();
    assert_eq!(v["password"], "hunter2");
}

#[test]
fn user_validation() {
    assert!(user().validate().is_ok());

    let errors = User { username: "jd".into(), ..user() }.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("username"));

    let errors = User { email_address: "nope".into(), ..user() }.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("email_address"));
}

#[test]
fn user_label() {
    assert_eq!(user().label(), "Jordan Doe (jdoe)");
}

#[test]
fn audit_log_parses_and_lists_changed_fields() {
    let log: AuditLog = serde_json::from_value(json!({
        "id": "aud_1",
        "resource": "trailer",
        "resourceId": "trl_7",
        "action": "update",
        "userId": "usr_1",
        "changes": { "status": ["Available", "OutOfService"], "code": ["A", "B"] },
        "timestamp": 1_700_000_000
    }))
    .unwrap();

    let mut fields = log.changed_fields();
    fields.sort_unstable();
    assert_eq!(fields, ["code", "status"]);
    assert_eq!(log.label(), "update trailer trl_7");
    assert_eq!(log.id(), Some("aud_1"));
}
