use super::*;

// =============================================================================
// construction
// =============================================================================

#[test]
fn new_rejects_zero_bytes() {
    assert!(matches!(BloomFilter::new(0, 3), Err(BloomError::Empty)));
}

#[test]
fn new_rejects_zero_hashes() {
    assert!(matches!(BloomFilter::new(16, 0), Err(BloomError::ZeroHashes)));
}

#[test]
fn oversized_hash_count_is_rejected() {
    let blob = BloomFilter::new(16, 3).unwrap().to_base64();
    let err = BloomFilter::from_base64(&blob, u32::MAX).unwrap_err();
    assert!(matches!(err, BloomError::TooManyHashes(u32::MAX)));
    assert!(BloomFilter::new(16, MAX_HASH_COUNT).is_ok());
}

#[test]
fn optimal_sizing_caps_hash_count() {
    let filter = BloomFilter::optimal(10, 1e-12);
    assert!(filter.hash_count() <= MAX_HASH_COUNT);
}

#[test]
fn from_base64_rejects_garbage() {
    let err = BloomFilter::from_base64("not base64!!", 3).unwrap_err();
    assert!(matches!(err, BloomError::Base64(_)));
}

#[test]
fn optimal_sizing_is_reasonable() {
    let filter = BloomFilter::optimal(1000, 0.01);
    // ~9.6 bits per key and ~7 hashes for 1%.
    assert!(filter.num_bits() >= 9_000 && filter.num_bits() <= 10_000);
    assert_eq!(filter.hash_count(), 7);
}

// =============================================================================
// membership
// =============================================================================

#[test]
fn empty_filter_contains_nothing() {
    let filter = BloomFilter::new(64, 4).unwrap();
    assert!(!filter.test("shipment:read"));
}

#[test]
fn added_keys_are_always_found() {
    let mut filter = BloomFilter::optimal(500, 0.01);
    let keys: Vec<String> = (0..500).map(|i| format!("resource{i}:read")).collect();
    for key in &keys {
        filter.add(key);
    }
    for key in &keys {
        assert!(filter.test(key), "false negative for {key}");
    }
}

#[test]
fn false_positive_rate_stays_bounded() {
    let mut filter = BloomFilter::optimal(1000, 0.01);
    for i in 0..1000 {
        filter.add(&format!("granted-{i}"));
    }

    let trials = 10_000;
    let hits = (0..trials)
        .filter(|i| filter.test(&format!("never-added-{i}")))
        .count();
    assert!(hits < trials * 3 / 100, "false positive rate too high: {hits}/{trials}");
}

#[test]
fn base64_round_trip_keeps_membership() {
    let mut filter = BloomFilter::new(32, 5).unwrap();
    filter.add("trailer:update");

    let decoded = BloomFilter::from_base64(&filter.to_base64(), 5).unwrap();
    assert_eq!(decoded, filter);
    assert!(decoded.test("trailer:update"));
}
