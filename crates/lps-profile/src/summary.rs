//! Plain-text profile summary for the model prompt

use crate::model::Profile;

/// Render a short summary of `profile`
///
/// Pure projection; lines are omitted when their source field is empty.
#[must_use]
pub fn summarize(profile: Option<&Profile>) -> String {
    let Some(profile) = profile else {
        return "No profile available.".to_string();
    };

    let platform = &profile.platform_data;
    let learning = &profile.learning_profile;
    let mut lines = Vec::new();

    if !platform.name.is_empty() {
        lines.push(format!("Name: {}", platform.name));
    }
    if !platform.active_courses.is_empty() {
        lines.push(format!(
            "Active courses: {}",
            platform.active_courses.join(", ")
        ));
    }
    if let Some(course) = learning.current_focus.course.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!(
            "Current focus: {} (module {})",
            course, learning.current_focus.module
        ));
    }
    if !learning.goals.is_empty() {
        lines.push(format!("Goals: {}", learning.goals.join(", ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    #[test]
    fn missing_profile() {
        assert_eq!(summarize(None), "No profile available.");
    }

    #[test]
    fn full_summary() {
        let mut p = Profile::stub(UserId::parse("u1").unwrap(), chrono::Utc::now());
        p.platform_data.name = "Ana".into();
        p.platform_data.active_courses = vec!["Kotlin".into(), "Android".into()];
        p.learning_profile.current_focus.course = Some("Kotlin".into());
        p.learning_profile.current_focus.module = 3;
        p.learning_profile.goals = vec!["Get hired".into()];

        assert_eq!(
            summarize(Some(&p)),
            "Name: Ana\nActive courses: Kotlin, Android\nCurrent focus: Kotlin (module 3)\nGoals: Get hired"
        );
    }

    #[test]
    fn stub_summary_is_empty() {
        let p = Profile::stub(UserId::parse("u1").unwrap(), chrono::Utc::now());
        assert_eq!(summarize(Some(&p)), "");
    }
}
