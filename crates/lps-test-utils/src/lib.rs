//! Testing utilities for LPS workspace
//!
//! Shared test helpers, fixtures, and failing stores.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use lps_profile::{PlatformUser, Profile, UserId};
use lps_store::{ProfileStore, StoreError};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn uid(raw: &str) -> UserId {
    UserId::parse(raw).unwrap()
}

/// Fixed clock for deterministic profiles
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn stub_profile(raw_id: &str) -> Profile {
    Profile::stub(uid(raw_id), fixed_now())
}

/// Profile with a declared job role and some roadmap progress
pub fn profile_with_role(raw_id: &str, role: &str) -> Profile {
    let mut profile = stub_profile(raw_id);
    profile.roadmap_progress.job_role = Some(role.to_string());
    profile
        .roadmap_progress
        .skills_status
        .insert("sql".into(), json!("done"));
    profile.roadmap_progress.subskills = vec![json!({"name": "joins"})];
    profile
}

pub fn platform_user(id: &str, email: &str, course: &str) -> PlatformUser {
    PlatformUser {
        id: Some(id.to_string()),
        email: Some(email.to_string()),
        name: Some(format!("User {id}")),
        course_name: Some(course.to_string()),
        active_tutorials: 2,
        completed_tutorials: 5,
        is_graduated: 0,
        exam_score: Some("88".into()),
        submission_rating: Some("4".into()),
    }
}

/// Platform export as written by the platform
pub fn platform_export(users: &[(&str, &str, &str)]) -> Value {
    Value::Array(
        users
            .iter()
            .map(|(id, email, course)| {
                json!({"id": id, "email": email, "name": format!("User {id}"), "course_name": course})
            })
            .collect(),
    )
}

pub fn write_users_file(data_dir: &Path, users: &Value) {
    std::fs::write(data_dir.join("users.json"), users.to_string()).unwrap();
}

pub fn temp_data_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Store whose saves always fail; loads delegate to `inner`
#[derive(Debug)]
pub struct FailingStore<S> {
    pub inner: S,
    pub save_attempts: AtomicUsize,
}

impl<S> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            save_attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: ProfileStore> ProfileStore for FailingStore<S> {
    async fn load(&self, user_id: &UserId) -> Option<Profile> {
        self.inner.load(user_id).await
    }

    async fn save(&self, _user_id: &UserId, _profile: &Profile) -> Result<(), StoreError> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("simulated write failure".into()))
    }
}
