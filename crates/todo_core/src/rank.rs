//! Merge and ranking policy for the displayed task collection

use std::cmp::Ordering;

use crate::task::Task;

/// Fixed cap on how many tasks the card displays.
pub const MAX_DISPLAY_TASKS: usize = 20;

/// Total order over tasks: due date ascending with absent due dates last,
/// ties broken by importance (high before normal before low).
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    match (a.due, b.due) {
        (Some(a_due), Some(b_due)) if a_due != b_due => a_due.cmp(&b_due),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => a.importance.rank().cmp(&b.importance.rank()),
    }
}

/// Concatenate per-list results, sort by the total order, and truncate to
/// the display cap. Rebuilt wholesale on every successful fetch.
pub fn merge_ranked(per_list: Vec<Vec<Task>>) -> Vec<Task> {
    let mut merged: Vec<Task> = per_list.into_iter().flatten().collect();
    merged.sort_by(compare_tasks);
    merged.truncate(MAX_DISPLAY_TASKS);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Importance, TaskStatus};
    use chrono::{Duration, Utc};

    fn task(id: &str, due_in_days: Option<i64>, importance: Importance) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            status: TaskStatus::NotStarted,
            importance,
            due: due_in_days.map(|d| Utc::now() + Duration::days(d)),
            created: None,
            modified: None,
            completed: None,
            list_id: "list".to_string(),
            list_name: "List".to_string(),
            link: String::new(),
        }
    }

    #[test]
    fn dated_tasks_sort_before_undated() {
        let l1 = vec![
            task("a", Some(2), Importance::Normal),
            task("b", Some(1), Importance::Normal),
            task("c", Some(3), Importance::Normal),
        ];
        let l2 = vec![
            task("d", None, Importance::High),
            task("e", None, Importance::Normal),
        ];

        let merged = merge_ranked(vec![l1, l2]);
        let ids: Vec<&str> = merged.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d", "e"]);
    }

    #[test]
    fn importance_breaks_due_date_ties() {
        let due = Utc::now() + Duration::days(1);
        let mut a = task("low", None, Importance::Low);
        let mut b = task("high", None, Importance::High);
        a.due = Some(due);
        b.due = Some(due);

        let merged = merge_ranked(vec![vec![a, b]]);
        assert_eq!(merged[0].id, "high");
        assert_eq!(merged[1].id, "low");
    }

    #[test]
    fn truncates_to_display_cap() {
        let many: Vec<Task> = (0..30)
            .map(|i| task(&format!("t{i}"), Some(i), Importance::Normal))
            .collect();
        let merged = merge_ranked(vec![many]);
        assert_eq!(merged.len(), MAX_DISPLAY_TASKS);
        assert_eq!(merged[0].id, "t0");
    }
}
