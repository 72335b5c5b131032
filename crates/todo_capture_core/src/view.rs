//! Read-only projections for presentation surfaces.
//!
//! Filtering, ordering and summary helpers. None of these touch storage;
//! display order is a view concern and never changes what is persisted.

use crate::model::todo::{Priority, Todo};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Active filters of a todo list view. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    /// Case-insensitive substring of `text`.
    pub query: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(query) = self.query.as_deref().map(str::trim) {
            if !query.is_empty() && !todo.text.to_lowercase().contains(&query.to_lowercase()) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if todo.priority != priority {
                return false;
            }
        }
        if let Some(category) = self.category.as_deref() {
            if !category.is_empty() && !todo.has_category(category) {
                return false;
            }
        }
        true
    }
}

/// Applies `filter` and orders newest first by `created_at`.
pub fn filter_and_sort(todos: &[Todo], filter: &TodoFilter) -> Vec<Todo> {
    let mut visible: Vec<Todo> = todos
        .iter()
        .filter(|todo| filter.matches(todo))
        .cloned()
        .collect();
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}

/// All category labels in use, sorted and deduplicated.
pub fn distinct_categories(todos: &[Todo]) -> Vec<String> {
    todos
        .iter()
        .flat_map(|todo| todo.categories.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Pending/completed counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoStats {
    pub pending: usize,
    pub completed: usize,
}

impl TodoStats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        let completed = todos.iter().filter(|todo| todo.completed).count();
        Self {
            pending: todos.len() - completed,
            completed,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.completed
    }
}

impl Display for TodoStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} pending, {} completed", self.pending, self.completed)
    }
}

/// Inserts a pushed todo at the front unless its id is already shown.
///
/// Returns whether the view changed.
pub fn merge_pushed(view: &mut Vec<Todo>, pushed: Todo) -> bool {
    if view.iter().any(|todo| todo.id == pushed.id) {
        return false;
    }
    view.insert(0, pushed);
    true
}

/// Short relative age such as `5m ago`; a week or older shows the date.
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        distinct_categories, filter_and_sort, format_age, merge_pushed, TodoFilter, TodoStats,
    };
    use crate::model::todo::{Priority, Todo};
    use chrono::{Duration, TimeZone, Utc};

    fn todo_at(text: &str, minutes_ago: i64, priority: Priority, categories: &[&str]) -> Todo {
        let mut todo = Todo::new(text);
        todo.created_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
            - Duration::minutes(minutes_ago);
        todo.priority = priority;
        todo.categories = categories.iter().map(|c| c.to_string()).collect();
        todo
    }

    #[test]
    fn filter_combines_query_priority_and_category() {
        let todos = vec![
            todo_at("Reply on Slack", 30, Priority::High, &["Slack"]),
            todo_at("slack standup notes", 10, Priority::Low, &["Slack", "Meeting"]),
            todo_at("buy milk", 5, Priority::Low, &[]),
        ];

        let filter = TodoFilter {
            query: Some("SLACK".to_string()),
            ..TodoFilter::default()
        };
        let texts: Vec<_> = filter_and_sort(&todos, &filter)
            .into_iter()
            .map(|todo| todo.text)
            .collect();
        assert_eq!(texts, vec!["slack standup notes", "Reply on Slack"]);

        let filter = TodoFilter {
            priority: Some(Priority::Low),
            category: Some("Meeting".to_string()),
            ..TodoFilter::default()
        };
        let visible = filter_and_sort(&todos, &filter);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].text, "slack standup notes");
    }

    #[test]
    fn categories_and_stats_summarize_collection() {
        let mut todos = vec![
            todo_at("a", 1, Priority::Low, &["Meeting", "Email"]),
            todo_at("b", 2, Priority::Low, &["Email"]),
        ];
        todos[0].completed = true;

        assert_eq!(distinct_categories(&todos), vec!["Email", "Meeting"]);
        let stats = TodoStats::from_todos(&todos);
        assert_eq!(stats.to_string(), "1 pending, 1 completed");
        assert_eq!(stats.total(), 2);
    }

    #[test]
    fn merge_pushed_skips_known_ids() {
        let existing = todo_at("first", 5, Priority::Low, &[]);
        let mut view = vec![existing.clone()];

        assert!(!merge_pushed(&mut view, existing));
        let fresh = todo_at("second", 1, Priority::Low, &[]);
        assert!(merge_pushed(&mut view, fresh.clone()));
        assert_eq!(view[0].id, fresh.id);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn format_age_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_age(now - Duration::seconds(20), now), "just now");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_age(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_age(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_age(now - Duration::days(9), now), "2026-03-01");
    }
}
