#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;
use tidemark_core::record::{Record, RecordKind, SourceKind};
use tidemark_core::store::MemoryStore;

/// Keys drawn from a small alphabet so generated stores overlap with
/// generated priority lists.
pub const KEY_POOL: [&str; 8] = ["k0", "k1", "k2", "k3", "k4", "k5", "k6", "k7"];

pub fn arb_key() -> impl Strategy<Value = String> + Clone {
    prop::sample::select(KEY_POOL.to_vec()).prop_map(ToString::to_string)
}

/// Store contents: key to value length, values may contain multi-byte text.
pub fn arb_contents() -> impl Strategy<Value = BTreeMap<String, String>> + Clone {
    prop::collection::btree_map(arb_key(), "[a-zé日🦀]{0,40}", 0..KEY_POOL.len())
}

pub fn arb_priority() -> impl Strategy<Value = Vec<String>> + Clone {
    prop::sample::subsequence(KEY_POOL.to_vec(), 0..=KEY_POOL.len())
        .prop_shuffle()
        .prop_map(|keys| keys.into_iter().map(ToString::to_string).collect())
}

pub fn store_from(contents: &BTreeMap<String, String>) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (key, value) in contents {
        store.insert_raw(key.clone(), value.clone());
    }
    store
}

pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> + Clone {
    // A narrow range so equal timestamps are common.
    (1_709_251_200i64..1_709_251_260).prop_map(|secs| {
        Utc.timestamp_opt(secs, 0)
            .single()
            .expect("timestamp in range")
    })
}

pub fn arb_record(source: SourceKind) -> impl Strategy<Value = Record> + Clone {
    (0u8..12, arb_timestamp()).prop_map(move |(n, timestamp)| Record {
        identity: format!("https://github.com/o/r/issues/{n}"),
        timestamp,
        source,
        kind: RecordKind::Issue,
        title: format!("item {n}"),
        repo: Some("o/r".to_string()),
        state: None,
        actor: None,
        labels: Vec::new(),
        payload: serde_json::Value::Null,
    })
}
