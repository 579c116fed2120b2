// Property: for any set of entries spread across any segments, the reported
// cache size equals the sum of the declared content-lengths, with absent or
// unparsable headers contributing 0; clearing all segments always brings the
// total back to 0.

use bytes::Bytes;
use cachegate::{CacheStore, ResponseSnapshot};
use http::{HeaderMap, HeaderValue, StatusCode};
use proptest::prelude::*;
use std::sync::Arc;

fn snapshot(declared: Option<u32>) -> ResponseSnapshot {
    let mut headers = HeaderMap::new();
    if let Some(len) = declared {
        headers.insert(
            http::header::CONTENT_LENGTH,
            HeaderValue::from_str(&len.to_string()).unwrap(),
        );
    }
    ResponseSnapshot::new(StatusCode::OK, headers, Bytes::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The total is exactly the sum of declared content-lengths.
    #[test]
    fn prop_total_equals_sum_of_declared_lengths(
        entries in prop::collection::vec(
            (0usize..4, 0usize..16, prop::option::of(any::<u32>())),
            0..32,
        )
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = Arc::new(CacheStore::new());
            let segments = ["static-v1", "dynamic-v1", "static-v0", "scratch"];
            let mut expected: u64 = 0;
            // Last write wins per key, so track expectations by key
            let mut by_key = std::collections::HashMap::new();

            for (segment_idx, key_idx, declared) in &entries {
                let segment = segments[*segment_idx];
                let key = format!("GET https://blog.example/r{}", key_idx);
                store.store(segment, &key, snapshot(*declared)).await;
                by_key.insert((segment, key_idx), declared.map(u64::from).unwrap_or(0));
            }
            for size in by_key.values() {
                expected += size;
            }

            prop_assert_eq!(store.total_declared_bytes().await, expected);

            store.clear_all().await;
            prop_assert_eq!(store.total_declared_bytes().await, 0);
            Ok(())
        })?;
    }

    /// Unparsable content-length headers always contribute 0.
    #[test]
    fn prop_garbage_content_length_counts_zero(garbage in "[a-zA-Z ]{1,16}") {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&garbage) {
            headers.insert(http::header::CONTENT_LENGTH, value);
        }
        let snap = ResponseSnapshot::new(StatusCode::OK, headers, Bytes::new());
        prop_assert_eq!(snap.declared_content_length(), 0);
    }
}
