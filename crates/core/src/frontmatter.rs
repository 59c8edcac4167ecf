//! Minimal front-matter handling for the flat `key: value` schema used by
//! task notes. This is not a YAML implementation: it round-trips an ordered
//! list of scalar fields fenced by `---` lines and leaves the note body
//! byte-for-byte untouched on edits.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Field { key: String, value: String },
    /// A line inside the block that does not parse as `key: value`.
    /// Preserved verbatim so an edit never destroys content it does not
    /// understand.
    Raw(String),
}

/// Parsed front-matter block of a note, preserving field order and unknown
/// lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    lines: Vec<Line>,
}

impl Frontmatter {
    /// Parse the front-matter block at the top of `content`.
    ///
    /// Returns the block plus the byte offset where the note body starts
    /// (immediately after the closing fence line), or `None` when the note
    /// has no front-matter.
    pub fn parse(content: &str) -> Option<(Self, usize)> {
        let mut offset = 0usize;
        let mut first = true;
        let mut lines = Vec::new();

        for raw in content.split_inclusive('\n') {
            let line = raw.trim_end_matches(['\n', '\r']);
            if first {
                if line != "---" {
                    return None;
                }
                first = false;
            } else if line == "---" {
                return Some((Self { lines }, offset + raw.len()));
            } else if let Some((key, value)) = line.split_once(':') {
                lines.push(Line::Field {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                });
            } else {
                lines.push(Line::Raw(line.to_string()));
            }
            offset += raw.len();
        }

        // Opening fence without a closing one: not a valid block.
        None
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Field { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key` to `value`, replacing the first existing field with that key
    /// or appending a new one at the end of the block.
    pub fn set(&mut self, key: &str, value: &str) {
        for line in &mut self.lines {
            if let Line::Field { key: k, value: v } = line {
                if k == key {
                    *v = value.to_string();
                    return;
                }
            }
        }
        self.lines.push(Line::Field {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Copy the fields out as a plain lookup map. Raw lines are not
    /// represented; later duplicates of a key win, matching typical
    /// metadata-cache behavior.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for line in &self.lines {
            if let Line::Field { key, value } = line {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }

    fn render_block(&self) -> String {
        let mut out = String::from("---\n");
        for line in &self.lines {
            match line {
                Line::Field { key, value } if value.is_empty() => {
                    out.push_str(key);
                    out.push_str(":\n");
                }
                Line::Field { key, value } => {
                    out.push_str(key);
                    out.push_str(": ");
                    out.push_str(value);
                    out.push('\n');
                }
                Line::Raw(raw) => {
                    out.push_str(raw);
                    out.push('\n');
                }
            }
        }
        out.push_str("---\n");
        out
    }
}

/// Parsed front-matter of `content` as a lookup map, empty when the note has
/// no block.
pub fn lookup(content: &str) -> BTreeMap<String, String> {
    Frontmatter::parse(content)
        .map(|(fm, _)| fm.to_map())
        .unwrap_or_default()
}

/// Apply `edit` to the front-matter block of `content` and re-render the
/// note. The body after the closing fence is carried over unchanged.
/// Returns `None` when the note has no front-matter block to edit.
pub fn update(content: &str, edit: impl FnOnce(&mut Frontmatter)) -> Option<String> {
    let (mut fm, body_start) = Frontmatter::parse(content)?;
    edit(&mut fm);
    let mut out = fm.render_block();
    out.push_str(&content[body_start..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "---\nID: 202401011200\ntitle: buy milk\nscheduled date:\ntask status: not_yet\n---\n\n## Task\nbuy milk\n";

    #[test]
    fn parse_extracts_fields_and_body_offset() {
        let (fm, body_start) = Frontmatter::parse(NOTE).unwrap();
        assert_eq!(fm.get("ID"), Some("202401011200"));
        assert_eq!(fm.get("title"), Some("buy milk"));
        assert_eq!(fm.get("scheduled date"), Some(""));
        assert_eq!(fm.get("missing"), None);
        assert_eq!(&NOTE[body_start..], "\n## Task\nbuy milk\n");
    }

    #[test]
    fn parse_rejects_notes_without_block() {
        assert!(Frontmatter::parse("# just a heading\n").is_none());
        assert!(Frontmatter::parse("").is_none());
        // Opening fence but no closing fence.
        assert!(Frontmatter::parse("---\ntitle: x\n").is_none());
    }

    #[test]
    fn lookup_is_empty_without_block() {
        assert!(lookup("plain note\n").is_empty());
    }

    #[test]
    fn update_preserves_order_unknown_keys_and_body() {
        let note = "---\ntitle: x\nmystery-key: kept\nscheduled date: 2024-01-01\n---\nbody stays\n";
        let updated = update(note, |fm| fm.set("scheduled date", "2024-06-01")).unwrap();
        assert_eq!(
            updated,
            "---\ntitle: x\nmystery-key: kept\nscheduled date: 2024-06-01\n---\nbody stays\n"
        );
    }

    #[test]
    fn update_appends_missing_key() {
        let note = "---\ntitle: x\n---\n";
        let updated = update(note, |fm| fm.set("project", "home")).unwrap();
        assert_eq!(updated, "---\ntitle: x\nproject: home\n---\n");
    }

    #[test]
    fn update_returns_none_without_block() {
        assert!(update("no block here\n", |fm| fm.set("a", "b")).is_none());
    }

    #[test]
    fn raw_lines_survive_round_trip() {
        let note = "---\ntitle: x\n- stray list item\n---\nbody\n";
        let updated = update(note, |fm| fm.set("title", "y")).unwrap();
        assert_eq!(updated, "---\ntitle: y\n- stray list item\n---\nbody\n");
    }
}
