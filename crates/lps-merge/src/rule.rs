//! Per-path merge rules

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// How an incoming value combines with the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeRule {
    /// Scalars and optionals: incoming wins
    Replace,
    /// Lists: incoming list replaces the stored list, never concatenated
    ReplaceList,
    /// Maps and sections: key by key, recursing into untyped values
    MergeMap,
    /// Maps and sections: incoming map replaces the stored map
    ReplaceMap,
}

/// Rule for every path a patch can reach
///
/// List and map entries must agree with [`lps_profile::schema::SCHEMA`]:
/// lists replace, maps merge. `platform_data` and `learning_profile` always
/// merge field by field, so only `roadmap_progress` carries a section rule;
/// a role switch overrides it, see [`crate::RoadmapDecision`].
pub const RULES: &[(&str, MergeRule)] = &[
    ("platform_data.name", MergeRule::Replace),
    ("platform_data.email", MergeRule::Replace),
    ("platform_data.active_courses", MergeRule::ReplaceList),
    ("platform_data.active_tutorials", MergeRule::Replace),
    ("platform_data.completed_tutorials", MergeRule::Replace),
    ("platform_data.is_graduated", MergeRule::Replace),
    ("platform_data.exam_score", MergeRule::Replace),
    ("platform_data.submission_rating", MergeRule::Replace),
    ("platform_data.course_progress", MergeRule::MergeMap),
    ("learning_profile.goals", MergeRule::ReplaceList),
    ("learning_profile.skills", MergeRule::MergeMap),
    ("learning_profile.weaknesses", MergeRule::ReplaceList),
    ("learning_profile.strengths", MergeRule::ReplaceList),
    ("learning_profile.current_focus.course", MergeRule::Replace),
    ("learning_profile.current_focus.module", MergeRule::Replace),
    ("learning_profile.learning_style", MergeRule::Replace),
    ("learning_profile.progress_score", MergeRule::MergeMap),
    // already the full append-only list, see lps-patch
    ("learning_profile.history", MergeRule::ReplaceList),
    ("roadmap_progress", MergeRule::MergeMap),
    ("roadmap_progress.job_role", MergeRule::Replace),
    ("roadmap_progress.created_at", MergeRule::Replace),
    ("roadmap_progress.last_updated", MergeRule::Replace),
    ("roadmap_progress.skills_status", MergeRule::MergeMap),
    ("roadmap_progress.subskills", MergeRule::ReplaceList),
];

/// Rule registered for `path`; unlisted paths replace
#[must_use]
pub fn rule_for(path: &str) -> MergeRule {
    RULES
        .iter()
        .find(|(p, _)| *p == path)
        .map_or(MergeRule::Replace, |(_, rule)| *rule)
}

/// A stored value that can absorb an incoming one under a [`MergeRule`]
pub trait Mergeable: Sized {
    /// Combine `incoming` into `self`
    fn absorb(&mut self, incoming: Self, rule: MergeRule);

    /// Look up the rule for `path` and absorb `incoming` if present
    #[inline]
    fn absorb_at(&mut self, path: &str, incoming: Option<Self>) {
        if let Some(incoming) = incoming {
            self.absorb(incoming, rule_for(path));
        }
    }
}

macro_rules! replace_only {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Mergeable for $ty {
                #[inline]
                fn absorb(&mut self, incoming: Self, _rule: MergeRule) {
                    *self = incoming;
                }
            }
        )*
    };
}

replace_only!(String, Option<String>, i64, u8, u32);

impl<T> Mergeable for Vec<T> {
    #[inline]
    fn absorb(&mut self, incoming: Self, rule: MergeRule) {
        // lists have no key to merge on
        debug_assert_eq!(rule, MergeRule::ReplaceList, "list registered with a map rule");
        *self = incoming;
    }
}

impl<V> Mergeable for BTreeMap<String, V> {
    fn absorb(&mut self, incoming: Self, rule: MergeRule) {
        match rule {
            MergeRule::MergeMap => self.extend(incoming),
            MergeRule::Replace | MergeRule::ReplaceList | MergeRule::ReplaceMap => {
                *self = incoming;
            }
        }
    }
}

impl Mergeable for Map<String, Value> {
    fn absorb(&mut self, incoming: Self, rule: MergeRule) {
        match rule {
            MergeRule::MergeMap => {
                for (key, value) in incoming {
                    deep_merge(self.entry(key).or_insert(Value::Null), value);
                }
            }
            MergeRule::Replace | MergeRule::ReplaceList | MergeRule::ReplaceMap => {
                *self = incoming;
            }
        }
    }
}

/// Generic merge for untyped JSON
///
/// `null`, scalars and arrays replace; objects merge key by key. A target
/// that is not an object is reset to `{}` before an object merges into it,
/// so container types never end up mixed.
pub fn deep_merge(target: &mut Value, source: Value) {
    match source {
        Value::Object(source) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(target) = target {
                for (key, value) in source {
                    deep_merge(target.entry(key).or_insert(Value::Null), value);
                }
            }
        }
        other => *target = other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lps_profile::schema::{FieldKind, SCHEMA};
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,4}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                proptest::collection::btree_map("[a-c]", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    #[test]
    fn rules_agree_with_schema() {
        for (path, kind) in SCHEMA {
            let expected = match kind {
                FieldKind::List => MergeRule::ReplaceList,
                FieldKind::Map => MergeRule::MergeMap,
                FieldKind::Object => continue,
            };
            assert_eq!(rule_for(path), expected, "rule mismatch at {path}");
        }
        assert_eq!(rule_for("roadmap_progress"), MergeRule::MergeMap);
    }

    #[test]
    fn every_rule_is_reachable_by_a_patch() {
        for (path, _) in RULES {
            let (section, _) = path.split_once('.').unwrap_or((path, ""));
            assert!(
                ["platform_data", "learning_profile", "roadmap_progress"].contains(&section),
                "stray rule {path}"
            );
        }
    }

    #[test]
    fn unlisted_paths_replace() {
        assert_eq!(rule_for("meta"), MergeRule::Replace);
    }

    #[test]
    fn deep_merge_objects_recursively() {
        let mut target = json!({"a": {"x": 1, "y": [1, 2]}, "b": 1});
        deep_merge(&mut target, json!({"a": {"y": [3], "z": null}, "c": true}));
        assert_eq!(target, json!({"a": {"x": 1, "y": [3], "z": null}, "b": 1, "c": true}));
    }

    #[test]
    fn deep_merge_resets_mismatched_container() {
        let mut target = json!({"a": [1, 2], "b": "text"});
        deep_merge(&mut target, json!({"a": {"k": 1}, "b": {"n": 2}}));
        assert_eq!(target, json!({"a": {"k": 1}, "b": {"n": 2}}));
    }

    #[test]
    fn deep_merge_arrays_replace() {
        let mut target = json!(["A", "B"]);
        deep_merge(&mut target, json!(["Y"]));
        assert_eq!(target, json!(["Y"]));
    }

    #[test]
    fn btree_map_rules() {
        let mut stored: BTreeMap<String, u8> = [("a".to_string(), 1), ("b".to_string(), 2)].into();
        stored.absorb([("b".to_string(), 9)].into(), MergeRule::MergeMap);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["b"], 9);

        stored.absorb([("c".to_string(), 3)].into(), MergeRule::ReplaceMap);
        assert_eq!(stored.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn absorb_at_skips_absent() {
        let mut name = "Ana".to_string();
        name.absorb_at("platform_data.name", None);
        assert_eq!(name, "Ana");
        name.absorb_at("platform_data.name", Some("Eve".into()));
        assert_eq!(name, "Eve");
    }

    proptest! {
        #[test]
        fn deep_merge_keeps_container_kinds(target in arb_json(), source in arb_json()) {
            let mut merged = target.clone();
            deep_merge(&mut merged, source.clone());
            match &source {
                Value::Object(incoming) => {
                    let merged = merged.as_object().expect("object source yields an object");
                    for key in incoming.keys() {
                        prop_assert!(merged.contains_key(key));
                    }
                    if let Value::Object(stored) = &target {
                        for (key, value) in stored {
                            if !incoming.contains_key(key) {
                                prop_assert_eq!(&merged[key], value);
                            }
                        }
                    }
                }
                // arrays and scalars replace wholesale
                other => prop_assert_eq!(&merged, other),
            }
        }
    }
}
