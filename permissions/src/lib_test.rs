use std::collections::HashMap;

use super::*;

fn manifest_with(resources: Vec<(&str, ResourcePermission)>) -> Manifest {
    Manifest {
        resources: resources
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect::<HashMap<_, _>>(),
        expires_at: i64::MAX,
        ..Manifest::default()
    }
}

fn detailed(standard_ops: u32, extended: &[&str], rules: FieldRules) -> ResourcePermission {
    ResourcePermission::Detailed(ResourceDetail {
        standard_ops,
        extended_ops: extended.iter().map(|s| (*s).to_owned()).collect(),
        data_scope: DataScope::Organization,
        field_rules: rules,
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// =============================================================================
// can: simple bitmasks
// =============================================================================

#[test]
fn simple_mask_grants_exactly_the_set_bits() {
    let client = PermissionClient::without_bloom(manifest_with(vec![("shipment", ResourcePermission::Simple(0b0011))]));
    assert!(client.can("shipment", "create"));
    assert!(client.can("shipment", "read"));
    assert!(!client.can("shipment", "update"));
}

#[test]
fn simple_mask_matches_bit_for_every_action() {
    let mask = Action::mask(&[Action::Read, Action::Export, Action::Audit]);
    let client = PermissionClient::without_bloom(manifest_with(vec![("trailer", ResourcePermission::Simple(mask))]));
    for action in Action::ALL {
        assert_eq!(client.can("trailer", action.name()), action.is_set_in(mask), "action {action}");
    }
}

#[test]
fn unknown_resource_or_action_is_denied() {
    let client = PermissionClient::without_bloom(manifest_with(vec![("shipment", ResourcePermission::Simple(u32::MAX))]));
    assert!(!client.can("worker", "read"));
    assert!(!client.can("shipment", "teleport"));
}

// =============================================================================
// can: detailed records
// =============================================================================

#[test]
fn detailed_accepts_bitmask_or_extended_ops() {
    let perm = detailed(Action::Read.bit(), &["dispatch", "update"], FieldRules::default());
    let client = PermissionClient::without_bloom(manifest_with(vec![("shipment", perm)]));

    assert!(client.can("shipment", "read"));
    assert!(client.can("shipment", "dispatch"));
    assert!(client.can("shipment", "update"));
    assert!(!client.can("shipment", "delete"));
    assert!(!client.can("shipment", "cancel"));
}

#[test]
fn can_any_and_can_all() {
    let client = PermissionClient::without_bloom(manifest_with(vec![("rate", ResourcePermission::Simple(0b0011))]));
    assert!(client.can_any("rate", &["delete", "read"]));
    assert!(!client.can_all("rate", &["create", "delete"]));
    assert!(client.can_all("rate", &["create", "read"]));
}

// =============================================================================
// field access
// =============================================================================

#[test]
fn denied_wins_over_every_other_list() {
    let rules = FieldRules {
        allowed: strings(&["rate"]),
        read_only: strings(&["rate"]),
        denied: strings(&["rate"]),
        masked: strings(&["rate"]),
    };
    let client = PermissionClient::without_bloom(manifest_with(vec![("rate", detailed(0, &[], rules))]));
    assert_eq!(client.field_access("rate", "rate"), FieldAccess::Hidden);
}

#[test]
fn read_only_and_masked_fields_are_read_only() {
    let rules = FieldRules {
        allowed: strings(&["name", "ssn"]),
        read_only: strings(&["code"]),
        denied: vec![],
        masked: strings(&["ssn"]),
    };
    let client = PermissionClient::without_bloom(manifest_with(vec![("user", detailed(0, &[], rules))]));
    assert_eq!(client.field_access("user", "code"), FieldAccess::ReadOnly);
    assert_eq!(client.field_access("user", "ssn"), FieldAccess::ReadOnly);
    assert_eq!(client.field_access("user", "name"), FieldAccess::ReadWrite);
}

#[test]
fn unlisted_field_defaults_to_hidden() {
    let client = PermissionClient::without_bloom(manifest_with(vec![(
        "user",
        detailed(u32::MAX, &[], FieldRules::default()),
    )]));
    assert_eq!(client.field_access("user", "password"), FieldAccess::Hidden);
    assert_eq!(client.field_access("missing", "name"), FieldAccess::Hidden);
}

#[test]
fn simple_mask_field_access_follows_resource_bits() {
    let client = PermissionClient::without_bloom(manifest_with(vec![
        ("writer", ResourcePermission::Simple(Action::mask(&[Action::Read, Action::Update]))),
        ("reader", ResourcePermission::Simple(Action::Read.bit())),
        ("none", ResourcePermission::Simple(0)),
    ]));
    assert_eq!(client.field_access("writer", "x"), FieldAccess::ReadWrite);
    assert_eq!(client.field_access("reader", "x"), FieldAccess::ReadOnly);
    assert_eq!(client.field_access("none", "x"), FieldAccess::Hidden);
}

#[test]
fn data_scope_per_permission_shape() {
    let client = PermissionClient::without_bloom(manifest_with(vec![
        ("shipment", detailed(0, &[], FieldRules::default())),
        ("trailer", ResourcePermission::Simple(Action::Read.bit())),
        ("rate", ResourcePermission::Simple(Action::Create.bit())),
    ]));
    assert_eq!(client.data_scope("shipment"), DataScope::Organization);
    assert_eq!(client.data_scope("trailer"), DataScope::All);
    assert_eq!(client.data_scope("rate"), DataScope::None);
    assert_eq!(client.data_scope("unknown"), DataScope::None);
}

// =============================================================================
// bloom pre-check
// =============================================================================

#[test]
fn bloom_miss_short_circuits_to_denied() {
    let mut filter = BloomFilter::new(256, 4).unwrap();
    filter.add(&bloom_key("shipment", "read"));

    let mut manifest = manifest_with(vec![("shipment", ResourcePermission::Simple(0b0011))]);
    manifest.bloom_filter = Some(BloomFilterBlob { bits: filter.to_base64(), hash_count: 4 });
    let client = PermissionClient::new(manifest).unwrap();

    assert!(client.can("shipment", "read"));
    // Granted by the mask but absent from the filter: the filter wins on "no".
    assert!(!client.can("shipment", "create"));
}

#[test]
fn bloom_hit_still_requires_manifest_grant() {
    let mut filter = BloomFilter::new(256, 4).unwrap();
    filter.add(&bloom_key("shipment", "delete"));

    let mut manifest = manifest_with(vec![("shipment", ResourcePermission::Simple(Action::Read.bit()))]);
    manifest.bloom_filter = Some(BloomFilterBlob { bits: filter.to_base64(), hash_count: 4 });
    let client = PermissionClient::new(manifest).unwrap();

    assert!(!client.can("shipment", "delete"));
}

#[test]
fn malformed_bloom_blob_is_rejected() {
    let mut manifest = Manifest::default();
    manifest.bloom_filter = Some(BloomFilterBlob { bits: "%%%".into(), hash_count: 3 });
    assert!(matches!(PermissionClient::new(manifest), Err(ManifestError::Bloom(_))));
}

// =============================================================================
// wire format and expiry
// =============================================================================

#[test]
fn parses_mixed_manifest_json() {
    let body = r#"{
        "version": "2",
        "userId": "u-1",
        "organizationId": "org-1",
        "businessUnitId": "bu-1",
        "roles": ["dispatcher"],
        "resources": {
            "shipment": 3,
            "trailer": {
                "standardOps": 2,
                "extendedOps": ["assign_tractor"],
                "dataScope": "own",
                "fieldRules": { "readOnly": ["code"] }
            }
        },
        "expiresAt": 4102444800
    }"#;
    let client = PermissionClient::from_json(body).unwrap();

    assert!(client.can("shipment", "create"));
    assert!(client.can("trailer", "assign_tractor"));
    assert_eq!(client.data_scope("trailer"), DataScope::Own);
    assert_eq!(client.field_access("trailer", "code"), FieldAccess::ReadOnly);
    assert!(client.has_role("dispatcher"));
    assert!(!client.is_expired_at(1_700_000_000));
}

#[test]
fn invalid_manifest_json_errors() {
    assert!(matches!(PermissionClient::from_json("[1,2"), Err(ManifestError::Json(_))));
}

#[test]
fn unbounded_bloom_hash_count_is_rejected() {
    let body = r#"{
        "version": "2",
        "userId": "u-1",
        "organizationId": "org-1",
        "businessUnitId": "bu-1",
        "roles": [],
        "resources": { "shipment": 3 },
        "bloomFilter": { "bits": "AAAAAAAAAAA=", "hashCount": 4294967295 },
        "expiresAt": 4102444800
    }"#;
    let err = PermissionClient::from_json(body).unwrap_err();
    assert!(matches!(err, ManifestError::Bloom(BloomError::TooManyHashes(u32::MAX))));
}

#[test]
fn expiry_is_inclusive_of_expires_at() {
    let manifest = Manifest { expires_at: 1000, ..Manifest::default() };
    let client = PermissionClient::without_bloom(manifest);
    assert!(!client.is_expired_at(999));
    assert!(client.is_expired_at(1000));
    assert_eq!(client.expires_in(400), 600);
    assert_eq!(client.expires_in(2000), 0);
}

#[test]
fn default_manifest_is_already_expired() {
    let client = PermissionClient::without_bloom(Manifest::default());
    assert!(client.is_expired());
}
