//! Model service replies
//!
//! The model service answers with free text plus optional structured
//! profile updates. Updates are applied through the same validated path as
//! any other patch; the reply text is cleaned before it reaches the user.

use lps_profile::Profile;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Reply text used when the model sent none
pub const DEFAULT_REPLY: &str = "Bot tidak menanggapi.";

/// Goal appended when a reply mentions a new learning goal
pub const INFERRED_GOAL: &str = "Goal baru berdasarkan percakapan";

/// Weakness appended when a reply mentions a difficulty
pub const INFERRED_WEAKNESS: &str = "Kesulitan baru yang disampaikan user";

static UPDATE_BLOCK: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)<profile_update>.*?</profile_update>").ok());

static MODULE_DONE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"modul\s*\d+\s*(selesai|berhasil)").ok());

/// Raw answer from the model service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelReply {
    response: Option<String>,
    reply: Option<String>,
    /// Structured metadata (roadmap, course recommendation, ...)
    pub meta: Option<Value>,
    /// Retrieval sources
    pub sources: Option<Value>,
    /// Intent classification
    pub intent: Option<Value>,
    profile_updates: Option<Value>,
    #[serde(rename = "profileUpdate")]
    profile_update_camel: Option<Value>,
    profile_update: Option<Value>,
}

impl ModelReply {
    /// Reply carrying only text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            ..Self::default()
        }
    }

    /// Attach profile updates
    #[must_use]
    pub fn with_updates(mut self, updates: Value) -> Self {
        self.profile_updates = Some(updates);
        self
    }

    /// Reply text, `response` before `reply`, blank counts as absent
    #[must_use]
    pub fn reply_text(&self) -> &str {
        [&self.response, &self.reply]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .find(|t| !t.is_empty())
            .unwrap_or(DEFAULT_REPLY)
    }

    /// Profile updates under any of the accepted key spellings
    ///
    /// Scalars are not updates and are ignored.
    #[must_use]
    pub fn updates(&self) -> Option<&Value> {
        [
            &self.profile_updates,
            &self.profile_update_camel,
            &self.profile_update,
        ]
        .into_iter()
        .filter_map(Option::as_ref)
        .find(|v| v.is_object() || v.is_array())
    }
}

/// Outcome of the profile update carried by a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum UpdateStatus {
    /// No update was sent or inferred
    None,
    /// Update validated and persisted
    Applied,
    /// Update failed validation
    Rejected(Vec<String>),
    /// Update was valid but could not be stored
    Failed(String),
}

impl UpdateStatus {
    /// Profile changed on disk
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// One relayed chat turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    /// Reply text with update blocks removed
    pub reply: String,
    /// Model metadata, `{}` when absent
    pub meta: Value,
    /// Sources, `[]` when absent
    pub sources: Value,
    /// Intent, `{}` when absent
    pub intent: Value,
    /// Last persisted profile
    pub profile: Profile,
    /// What happened to the update
    pub update: UpdateStatus,
}

/// Remove every `<profile_update>...</profile_update>` block and trim
#[must_use]
pub fn strip_profile_update_tags(text: &str) -> String {
    match UPDATE_BLOCK.as_ref() {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Keyword signals found in a reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inference {
    /// Learner moved on to the next module
    pub advance_module: bool,
    /// Learner stated a new goal
    pub new_goal: bool,
    /// Learner reported a difficulty
    pub new_weakness: bool,
}

impl Inference {
    /// Scan reply text for progress, goal and difficulty keywords
    #[must_use]
    pub fn from_reply(text: &str) -> Self {
        let text = text.to_lowercase();
        let module_done = MODULE_DONE
            .as_ref()
            .is_some_and(|re| re.is_match(&text));

        Self {
            advance_module: text.contains("lanjut modul")
                || text.contains("modul berikutnya")
                || module_done,
            new_goal: ["tujuan belajar", "goal baru", "ingin menjadi"]
                .iter()
                .any(|k| text.contains(k)),
            new_weakness: ["kesulitan", "bingung", "sulit"]
                .iter()
                .any(|k| text.contains(k)),
        }
    }

    /// Nothing was detected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.advance_module || self.new_goal || self.new_weakness)
    }

    /// Raw patch expressing these signals against `existing`
    ///
    /// Lists are sent whole since they replace on merge.
    #[must_use]
    pub fn to_patch(&self, existing: &Profile) -> Value {
        let learning = &existing.learning_profile;
        let mut section = Map::new();

        if self.advance_module {
            section.insert(
                "current_focus".into(),
                json!({ "module": learning.current_focus.module.saturating_add(1) }),
            );
        }
        if self.new_goal {
            let mut goals = learning.goals.clone();
            goals.push(INFERRED_GOAL.to_string());
            section.insert("goals".into(), json!(goals));
        }
        if self.new_weakness {
            let mut weaknesses = learning.weaknesses.clone();
            weaknesses.push(INFERRED_WEAKNESS.to_string());
            section.insert("weaknesses".into(), json!(weaknesses));
        }

        json!({ "learning_profile": section })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lps_profile::UserId;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_update_blocks() {
        let text = "Hai!\n<profile_update>{\"a\":1}</profile_update>\nSelamat belajar <profile_update>\nx\n</profile_update>";
        assert_eq!(strip_profile_update_tags(text), "Hai!\n\nSelamat belajar");
        assert_eq!(strip_profile_update_tags("  plain  "), "plain");
    }

    #[test]
    fn reply_aliases() {
        let reply: ModelReply = serde_json::from_value(json!({
            "reply": "fallback",
            "profileUpdate": {"learning_profile": {"goals": ["x"]}}
        }))
        .unwrap();
        assert_eq!(reply.reply_text(), "fallback");
        assert!(reply.updates().is_some());

        let reply: ModelReply = serde_json::from_value(json!({
            "response": "",
            "profile_update": "not an update"
        }))
        .unwrap();
        assert_eq!(reply.reply_text(), DEFAULT_REPLY);
        assert!(reply.updates().is_none());
    }

    #[test]
    fn first_update_spelling_wins() {
        let reply: ModelReply = serde_json::from_value(json!({
            "profile_updates": {"a": 1},
            "profile_update": {"b": 2}
        }))
        .unwrap();
        assert_eq!(reply.updates(), Some(&json!({"a": 1})));
    }

    #[test]
    fn keyword_inference() {
        let found = Inference::from_reply("Bagus, Modul 3 selesai! Apa tujuan belajar kamu?");
        assert!(found.advance_module);
        assert!(found.new_goal);
        assert!(!found.new_weakness);

        assert!(Inference::from_reply("Kamu terlihat bingung").new_weakness);
        assert!(Inference::from_reply("Halo").is_empty());
    }

    #[test]
    fn inferred_patch_extends_lists() {
        let mut profile = Profile::stub(UserId::parse("u1").unwrap(), Utc::now());
        profile.learning_profile.goals = vec!["Web".into()];
        profile.learning_profile.current_focus.module = 2;

        let patch = Inference {
            advance_module: true,
            new_goal: true,
            new_weakness: false,
        }
        .to_patch(&profile);

        assert_eq!(
            patch,
            json!({"learning_profile": {
                "current_focus": {"module": 3},
                "goals": ["Web", INFERRED_GOAL]
            }})
        );
    }
}
