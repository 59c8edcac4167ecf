use once_cell::sync::Lazy;
use regex::Regex;

/// The unchecked marker prefix a source line must still carry for a
/// completion rewrite to apply.
pub const UNCHECKED_MARKER: &str = "- [ ] #TODO";

/// Anchored at line start: an unchecked checkbox, the literal tag, then
/// free text to end of line.
static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^- \[ \] #TODO (.+)$").expect("marker pattern is valid"));

/// A to-do occurrence discovered in a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Free text of the item (everything after the tag).
    pub content: String,
    /// Vault-relative path of the note the marker was found in.
    pub source_file: String,
    /// Zero-based line offset within that note at discovery time.
    pub line_number: usize,
    /// Stable identity derived from `(source_file, line_number, content)`.
    pub todo_id: String,
}

/// Find all to-do markers in one note. Pure function of the note content;
/// emission order follows line order. Deduplication against already-created
/// tasks is the caller's job via the sync store.
pub fn scan_note(source_file: &str, content: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    for (line_number, line) in content.lines().enumerate() {
        if let Some(caps) = MARKER_RE.captures(line) {
            let text = caps[1].to_string();
            let todo_id = marker_id(source_file, line_number, &text);
            markers.push(Marker {
                content: text,
                source_file: source_file.to_string(),
                line_number,
                todo_id,
            });
        }
    }
    markers
}

/// Deterministic marker identity: a 32-bit signed overflow rolling hash of
/// `"{file}:{line}:{content}"`, absolute value, base-36.
///
/// The accumulation runs over UTF-16 code units with `h = (h << 5) - h + u`
/// wrapping at 32 bits. Ids of already-persisted sync entries depend on this
/// exact recipe, so it must not change.
pub fn marker_id(source_file: &str, line_number: usize, content: &str) -> String {
    let seed = format!("{source_file}:{line_number}:{content}");
    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    base36(u64::from(hash.unsigned_abs()))
}

/// Rewrite the unchecked checkbox glyph to checked, preserving the rest of
/// the line (tag and text). Returns `None` when the line no longer carries
/// the unchecked marker pattern, e.g. because the user edited it.
pub fn check_marker_line(line: &str) -> Option<String> {
    if !line.contains(UNCHECKED_MARKER) {
        return None;
    }
    Some(line.replacen("- [ ]", "- [x]", 1))
}

fn base36(mut value: u64) -> String {
    const DIGITS: [char; 36] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
        'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_id_is_deterministic() {
        let a = marker_id("notes/a.md", 0, "alpha");
        let b = marker_id("notes/a.md", 0, "alpha");
        assert_eq!(a, b);
    }

    #[test]
    fn marker_id_reference_values() {
        // Pinned output of the 32-bit rolling hash; existing persisted sync
        // entries rely on these exact ids.
        assert_eq!(marker_id("Daily/2024-01-01.md", 3, "buy milk"), "pr66rr");
        assert_eq!(marker_id("notes/a.md", 0, "alpha"), "d3krv8");
        assert_eq!(marker_id("notes/a.md", 1, "alpha"), "1ktict");
        assert_eq!(marker_id("notes/b.md", 0, "alpha"), "ayq305");
        assert_eq!(marker_id("notes/a.md", 0, "beta"), "dbq5r6");
        assert_eq!(marker_id("inbox.md", 12, "call the dentist"), "l3ncvk");
    }

    #[test]
    fn marker_id_changes_with_any_input() {
        let base = marker_id("notes/a.md", 0, "alpha");
        assert_ne!(base, marker_id("notes/b.md", 0, "alpha"));
        assert_ne!(base, marker_id("notes/a.md", 1, "alpha"));
        assert_ne!(base, marker_id("notes/a.md", 0, "beta"));
    }

    #[test]
    fn marker_id_no_collisions_over_corpus() {
        let mut seen = std::collections::HashSet::new();
        for file in ["a.md", "b.md", "Daily/2024-01-01.md", "Projects/x.md"] {
            for line in 0..50 {
                for content in ["buy milk", "write report", "fix the fence", "タスクを書く"] {
                    assert!(
                        seen.insert(marker_id(file, line, content)),
                        "collision for {file}:{line}:{content}"
                    );
                }
            }
        }
    }

    #[test]
    fn scan_finds_markers_in_line_order() {
        let content = "# Monday\n- [ ] #TODO buy milk\nsome text\n- [ ] #TODO call mom\n";
        let markers = scan_note("Daily/monday.md", content);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].content, "buy milk");
        assert_eq!(markers[0].line_number, 1);
        assert_eq!(markers[1].content, "call mom");
        assert_eq!(markers[1].line_number, 3);
        assert_eq!(
            markers[0].todo_id,
            marker_id("Daily/monday.md", 1, "buy milk")
        );
    }

    #[test]
    fn scan_requires_anchored_unchecked_pattern() {
        let content = concat!(
            "  - [ ] #TODO indented does not count\n",
            "- [x] #TODO already checked\n",
            "- [ ] no tag here\n",
            "- [ ] #TODO\n", // tag with no text
            "- [ ] #TODO  double space text\n",
        );
        let markers = scan_note("n.md", content);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].content, " double space text");
        assert_eq!(markers[0].line_number, 4);
    }

    #[test]
    fn check_marker_line_rewrites_glyph_only() {
        assert_eq!(
            check_marker_line("- [ ] #TODO buy milk").as_deref(),
            Some("- [x] #TODO buy milk")
        );
        assert_eq!(check_marker_line("- [x] #TODO buy milk"), None);
        assert_eq!(check_marker_line("totally different line"), None);
    }
}
