//! Task-note schema: front-matter keys, id and filename generation, and the
//! rendered note template. The front-matter layout is a wire format other
//! tools parse; field names and order must stay stable.

use chrono::{DateTime, Local};

use crate::marker::Marker;
use crate::schema::TaskStatus;

pub const ID_KEY: &str = "ID";
pub const CREATED_KEY: &str = "created";
pub const TITLE_KEY: &str = "title";
pub const DEADLINE_KEY: &str = "deadline";
pub const SCHEDULED_KEY: &str = "scheduled date";
pub const PROJECT_KEY: &str = "project";
pub const KIND_KEY: &str = "task kind";
pub const STATUS_KEY: &str = "task status";
pub const CREATED_FROM_KEY: &str = "created_from";
pub const SOURCE_FILE_KEY: &str = "source_file";
pub const SOURCE_LINE_KEY: &str = "source_line";
pub const TODO_ID_KEY: &str = "todo_id";

/// Task id: numeric local timestamp at minute precision.
pub fn task_id(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M").to_string()
}

/// Strip characters illegal in filenames, collapse whitespace runs to single
/// underscores, truncate to 50 characters.
pub fn sanitize_file_name(content: &str) -> String {
    let mut out = String::new();
    let mut in_whitespace = false;
    for ch in content.chars() {
        if matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
            continue;
        }
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        out.push(ch);
    }
    out.chars().take(50).collect()
}

pub fn task_file_name(task_id: &str, content: &str) -> String {
    format!("{task_id}_{}.md", sanitize_file_name(content))
}

/// Render a complete task note for a freshly discovered marker: front-matter
/// with status `not_yet` and empty schedule fields, then a fixed provenance
/// section and the marker content.
pub fn render_task_note(task_id: &str, marker: &Marker, now: &DateTime<Local>) -> String {
    let source_link = format!("[[{}]]", marker.source_file);

    format!(
        "---\n\
         {ID_KEY}: {task_id}\n\
         {CREATED_KEY}: {created}\n\
         {TITLE_KEY}: {title}\n\
         aliases:\n\
         {DEADLINE_KEY}:\n\
         {SCHEDULED_KEY}:\n\
         {PROJECT_KEY}:\n\
         {KIND_KEY}:\n\
         {STATUS_KEY}: {status}\n\
         {CREATED_FROM_KEY}: todo\n\
         {SOURCE_FILE_KEY}: \"{source_link}\"\n\
         {SOURCE_LINE_KEY}: {line}\n\
         {TODO_ID_KEY}: {todo_id}\n\
         ---\n\
         \n\
         ## Created from\n\
         This task was generated automatically from a #TODO marker:\n\
         - file: {source_link}\n\
         - line: {line}\n\
         - created: {created_full}\n\
         \n\
         ## Task\n\
         {content}\n",
        created = now.format("%Y-%m-%d %H:%M"),
        title = marker.content,
        status = TaskStatus::NotYet.label(),
        line = marker.line_number,
        todo_id = marker.todo_id,
        created_full = now.format("%Y-%m-%d %H:%M:%S"),
        content = marker.content,
    )
}
