use proptest::prelude::*;
use std::collections::HashSet;
use tidemark_core::evict::EvictionPolicy;
use tidemark_core::keys::DEFAULT_PURGE_KEYS;
use tidemark_core::purge::purge_all;
use tidemark_core::reconcile::merge_summary;
use tidemark_core::record::SourceKind;
use tidemark_core::store::KeyValueStore;
use tidemark_core::usage::{byte_len, total_used};
use tidemark_core::writer::{GuardedWriter, WriteOutcome};

#[path = "generators.rs"]
mod generators;
use generators::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    #[test]
    fn byte_len_is_utf8_length(s in "\\PC{0,64}") {
        prop_assert_eq!(byte_len(&s), s.as_bytes().len());
        prop_assert!(byte_len(&s) >= s.chars().count());
    }

    #[test]
    fn reclaim_respects_target_and_list(
        contents in arb_contents(),
        priority in arb_priority(),
        target in arb_key(),
        required in 0usize..200,
        limit in 0usize..300,
    ) {
        let mut store = store_from(&contents);
        let before = total_used(&store);
        let policy = EvictionPolicy::new(priority.clone(), limit);

        let outcome = policy.reclaim(&mut store, &target, required);

        prop_assert!(!outcome.evicted.contains(&target));
        for key in &outcome.evicted {
            prop_assert!(priority.contains(key));
        }
        if contents.contains_key(&target) {
            prop_assert!(store.contains(&target));
        }
        let after = total_used(&store);
        prop_assert!(after <= before);
        prop_assert_eq!(before - after, outcome.freed_bytes);
        prop_assert_eq!(outcome.satisfied, after + required <= limit);
    }

    #[test]
    fn reclaim_is_deterministic(
        contents in arb_contents(),
        priority in arb_priority(),
        target in arb_key(),
        required in 0usize..200,
        limit in 0usize..300,
    ) {
        let policy = EvictionPolicy::new(priority, limit);
        let mut a = store_from(&contents);
        let mut b = store_from(&contents);
        prop_assert_eq!(
            policy.reclaim(&mut a, &target, required),
            policy.reclaim(&mut b, &target, required)
        );
    }

    #[test]
    fn refused_write_leaves_target_untouched(
        contents in arb_contents(),
        priority in arb_priority(),
        target in arb_key(),
        value in "[a-z]{0,80}",
        limit in 0usize..300,
    ) {
        let mut store = store_from(&contents);
        let writer = GuardedWriter::new(EvictionPolicy::new(priority, limit));

        match writer.write(&mut store, &target, &value) {
            WriteOutcome::Written { .. } => {
                prop_assert_eq!(store.get(&target).expect("get"), Some(value));
            }
            WriteOutcome::Refused { .. } => {
                prop_assert_eq!(store.get(&target).expect("get"), contents.get(&target).cloned());
                prop_assert_eq!(store.set_attempts(), 0);
            }
            WriteOutcome::Failed { .. } => prop_assert!(false, "memory store without faults never fails"),
        }
    }

    #[test]
    fn purge_all_is_idempotent(contents in arb_contents(), extra in arb_priority()) {
        let mut keys: Vec<String> = DEFAULT_PURGE_KEYS.iter().map(ToString::to_string).collect();
        keys.extend(extra);

        let mut once = store_from(&contents);
        purge_all(&mut once, &keys);
        let mut twice = store_from(&contents);
        purge_all(&mut twice, &keys);
        let second = purge_all(&mut twice, &keys);

        prop_assert!(second.removed.is_empty());
        prop_assert_eq!(once.keys().expect("keys"), twice.keys().expect("keys"));
    }

    #[test]
    fn summary_deduplicates_with_search_winning(
        search in prop::collection::vec(arb_record(SourceKind::Search), 0..20),
        events in prop::collection::vec(arb_record(SourceKind::Event), 0..20),
    ) {
        let search_ids: HashSet<String> = search.iter().map(|r| r.identity.clone()).collect();
        let merged = merge_summary(search, events);

        let mut seen = HashSet::new();
        for record in &merged {
            prop_assert!(seen.insert(record.identity.clone()), "duplicate identity");
            if search_ids.contains(&record.identity) {
                prop_assert_eq!(record.source, SourceKind::Search);
            }
        }
    }

    #[test]
    fn summary_is_sorted_with_search_first_on_ties(
        search in prop::collection::vec(arb_record(SourceKind::Search), 0..20),
        events in prop::collection::vec(arb_record(SourceKind::Event), 0..20),
    ) {
        let merged = merge_summary(search, events);
        for pair in merged.windows(2) {
            prop_assert!(pair[0].timestamp >= pair[1].timestamp);
            if pair[0].timestamp == pair[1].timestamp {
                prop_assert!(
                    !(pair[0].source == SourceKind::Event && pair[1].source == SourceKind::Search)
                );
            }
        }
    }
}
