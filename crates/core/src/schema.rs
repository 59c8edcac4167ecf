use serde::{Deserialize, Serialize};

/// Lifecycle status of a task note, as written in its front-matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotYet,
    Doing,
    Done,
    Hold,
    Cancel,
}

impl TaskStatus {
    /// Canonical snake_case label used in front-matter and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotYet => "not_yet",
            Self::Doing => "doing",
            Self::Done => "done",
            Self::Hold => "hold",
            Self::Cancel => "cancel",
        }
    }

    /// Parse a status from its label (case-insensitive).
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_yet" | "not-yet" => Some(Self::NotYet),
            "doing" => Some(Self::Doing),
            "done" => Some(Self::Done),
            "hold" => Some(Self::Hold),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// GTD category of a task note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Trash,
    Inbox,
    NextAction,
    Project,
    Someday,
    Reference,
}

impl TaskKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trash => "trash",
            Self::Inbox => "inbox",
            Self::NextAction => "next_action",
            Self::Project => "project",
            Self::Someday => "someday",
            Self::Reference => "reference",
        }
    }

    /// Parse a kind from its label (case-insensitive).
    ///
    /// Accepts the canonical labels plus `ごみ箱`, the legacy trash label
    /// still present in task files created before the migration.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trash" | "ごみ箱" => Some(Self::Trash),
            "inbox" => Some(Self::Inbox),
            "next_action" | "next-action" => Some(Self::NextAction),
            "project" => Some(Self::Project),
            "someday" => Some(Self::Someday),
            "reference" => Some(Self::Reference),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        for status in [
            TaskStatus::NotYet,
            TaskStatus::Doing,
            TaskStatus::Done,
            TaskStatus::Hold,
            TaskStatus::Cancel,
        ] {
            assert_eq!(TaskStatus::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn status_parse_is_lenient() {
        assert_eq!(TaskStatus::from_label("  DONE "), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::from_label("not-yet"), Some(TaskStatus::NotYet));
        assert_eq!(TaskStatus::from_label("finished"), None);
        assert_eq!(TaskStatus::from_label(""), None);
    }

    #[test]
    fn kind_labels_round_trip() {
        for kind in [
            TaskKind::Trash,
            TaskKind::Inbox,
            TaskKind::NextAction,
            TaskKind::Project,
            TaskKind::Someday,
            TaskKind::Reference,
        ] {
            assert_eq!(TaskKind::from_label(kind.label()), Some(kind));
        }
    }

    #[test]
    fn kind_accepts_legacy_trash_label() {
        assert_eq!(TaskKind::from_label("ごみ箱"), Some(TaskKind::Trash));
    }
}
