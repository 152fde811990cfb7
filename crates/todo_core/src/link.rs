//! Task link templating

/// Build the display link for a task.
///
/// The template may contain `{id}` and `{listId}` placeholders. A template
/// with no `{id}` placeholder is treated as a fixed base URL and returned
/// verbatim.
pub fn task_link(template: &str, task_id: &str, list_id: &str) -> String {
    if template.contains("{id}") {
        template.replace("{id}", task_id).replace("{listId}", list_id)
    } else {
        template.to_string()
    }
}
