//! Properties of repeated updates through the engine

use lps_engine::{EngineConfig, ProfileEngine};
use lps_store::{MemoryProfileStore, PlatformDirectory};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_history_grows_by_batch_size(batches in proptest::collection::vec(0..4usize, 1..8)) {
        let engine = ProfileEngine::new(
            MemoryProfileStore::new(),
            Arc::new(PlatformDirectory::empty()),
            EngineConfig::default(),
        );

        let lengths = runtime().block_on(async {
            let mut lengths = Vec::new();
            for size in &batches {
                let entries: Vec<_> = (0..*size).map(|i| json!({"query": format!("q{i}")})).collect();
                let profile = engine
                    .update_profile("p", &json!({"learning_profile": {"history": entries}}))
                    .await
                    .unwrap();
                lengths.push(profile.learning_profile.history.len());
            }
            lengths
        });

        let mut expected = 0;
        for (size, len) in batches.iter().zip(lengths) {
            expected += size;
            prop_assert_eq!(len, expected);
        }
    }

    #[test]
    fn prop_last_goal_list_wins(lists in proptest::collection::vec(
        proptest::collection::vec("[a-z]{1,8}", 0..4), 1..6,
    )) {
        let engine = ProfileEngine::new(
            MemoryProfileStore::new(),
            Arc::new(PlatformDirectory::empty()),
            EngineConfig::default(),
        );

        let goals = runtime().block_on(async {
            let mut last = Vec::new();
            for goals in &lists {
                last = engine
                    .update_profile("p", &json!({"learning_profile": {"goals": goals}}))
                    .await
                    .unwrap()
                    .learning_profile
                    .goals;
            }
            last
        });

        prop_assert_eq!(&goals, lists.last().unwrap());
    }
}
