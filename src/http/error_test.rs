use super::*;

fn api(status: u16) -> HttpError {
    HttpError::Api { status, body: ApiErrorBody::default() }
}

// =============================================================================
// retry classification
// =============================================================================

#[test]
fn excluded_statuses_are_not_retryable() {
    for status in [500, 404, 429] {
        assert!(!api(status).retryable(), "status {status} must not retry");
    }
}

#[test]
fn client_errors_are_not_retryable() {
    for status in [400, 401, 403, 409, 422] {
        assert!(!api(status).retryable(), "status {status} must not retry");
    }
}

#[test]
fn gateway_errors_and_request_timeout_are_retryable() {
    for status in [408, 502, 503, 504] {
        assert!(api(status).retryable(), "status {status} should retry");
    }
}

#[test]
fn transport_failures_are_retryable() {
    assert!(HttpError::Timeout.retryable());
    assert!(HttpError::Network("connection reset".into()).retryable());
    assert!(!HttpError::Decode("eof".into()).retryable());
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(api(400).error_code(), "E_API_RESPONSE");
    assert_eq!(HttpError::Timeout.error_code(), "E_TIMEOUT");
    assert_eq!(HttpError::Network(String::new()).error_code(), "E_NETWORK");
}

// =============================================================================
// ApiErrorBody
// =============================================================================

#[test]
fn parses_problem_details_body() {
    let body = ApiErrorBody::parse(
        r#"{"type":"validation-error","title":"Invalid Request","status":400,
            "detail":"Name is required","invalidParams":[{"name":"name","reason":"required"}]}"#,
    );
    assert_eq!(body.kind, "validation-error");
    assert_eq!(body.status, Some(400));
    assert_eq!(body.message(), "Name is required");
    assert_eq!(body.param_error("name"), Some("required"));
    assert_eq!(body.param_error("code"), None);
}

#[test]
fn plain_text_body_becomes_detail() {
    let body = ApiErrorBody::parse("  upstream unavailable \n");
    assert_eq!(body.detail, "upstream unavailable");
    assert_eq!(body.message(), "upstream unavailable");
}

#[test]
fn message_falls_back_to_title_then_default() {
    let titled = ApiErrorBody { title: "Forbidden".into(), ..ApiErrorBody::default() };
    assert_eq!(titled.message(), "Forbidden");
    assert_eq!(ApiErrorBody::default().message(), "request failed");
}

#[test]
fn user_message_uses_api_detail() {
    let err = HttpError::Api {
        status: 409,
        body: ApiErrorBody { detail: "Version conflict".into(), ..ApiErrorBody::default() },
    };
    assert_eq!(err.user_message(), "Version conflict");
    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("409"));
}
