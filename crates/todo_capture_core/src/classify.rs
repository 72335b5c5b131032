//! Keyword heuristics that tag new todos.
//!
//! Pure and deterministic. Misclassification (e.g. "email" mentioned in
//! passing) is accepted; callers can always override the result.

use crate::model::todo::Priority;

const HIGH_PRIORITY_MARKERS: &[&str] = &["urgent", "asap", "!"];
const MEDIUM_PRIORITY_MARKERS: &[&str] = &["important"];

/// Category label paired with its lowercase trigger word, in check order.
const CATEGORY_TRIGGERS: &[(&str, &str)] = &[
    ("Slack", "slack"),
    ("Telegram", "telegram"),
    ("Email", "email"),
    ("Meeting", "meeting"),
];

/// Derives a default priority. First matching rule wins: high, then medium,
/// otherwise low.
pub fn detect_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();
    if HIGH_PRIORITY_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return Priority::High;
    }
    if MEDIUM_PRIORITY_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return Priority::Medium;
    }
    Priority::Low
}

/// Derives default categories in fixed order; each label appears at most once.
pub fn detect_categories(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    CATEGORY_TRIGGERS
        .iter()
        .filter(|(_, trigger)| lower.contains(trigger))
        .map(|(label, _)| (*label).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{detect_categories, detect_priority};
    use crate::model::todo::Priority;

    #[test]
    fn priority_rules_apply_in_order() {
        assert_eq!(detect_priority("this is URGENT!!"), Priority::High);
        assert_eq!(detect_priority("reply asap"), Priority::High);
        assert_eq!(detect_priority("important review"), Priority::Medium);
        assert_eq!(detect_priority("important, do it now!"), Priority::High);
        assert_eq!(detect_priority("buy milk"), Priority::Low);
        assert_eq!(detect_priority(""), Priority::Low);
    }

    #[test]
    fn categories_follow_fixed_check_order() {
        assert_eq!(
            detect_categories("ping me on Slack about the meeting"),
            vec!["Slack".to_string(), "Meeting".to_string()]
        );
        assert_eq!(
            detect_categories("MEETING notes via email, then slack, then telegram"),
            vec![
                "Slack".to_string(),
                "Telegram".to_string(),
                "Email".to_string(),
                "Meeting".to_string()
            ]
        );
    }

    #[test]
    fn categories_never_repeat() {
        assert_eq!(
            detect_categories("slack slack SLACK"),
            vec!["Slack".to_string()]
        );
        assert!(detect_categories("buy milk").is_empty());
    }
}
