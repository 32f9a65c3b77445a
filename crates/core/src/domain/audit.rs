// Audit trail entries for command and kill actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actor recorded when the caller did not identify itself
pub const SYSTEM_ACTOR: &str = "system";

/// One recorded operator action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub success: bool,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: &str,
        action: impl Into<String>,
        success: bool,
        detail: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let actor = actor.trim();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor: if actor.is_empty() {
                SYSTEM_ACTOR.to_string()
            } else {
                actor.to_string()
            },
            action: action.into(),
            success,
            detail: detail.into(),
            timestamp,
        }
    }
}

/// Cut `text` to at most `max_bytes`, respecting UTF-8 boundaries
pub fn truncate_detail(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("...");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_actor_becomes_system() {
        let entry = AuditEntry::new("  ", "ls", true, "", Utc::now());
        assert_eq!(entry.actor, SYSTEM_ACTOR);
    }

    #[test]
    fn test_truncate_detail_on_char_boundary() {
        let text = "ééééé".to_string(); // 2 bytes each
        let cut = truncate_detail(text, 3);
        assert_eq!(cut, "é...");

        assert_eq!(truncate_detail("short".into(), 10), "short");
    }
}
