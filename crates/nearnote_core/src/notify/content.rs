//! Notification copy for background proximity hits.

use crate::model::memory::Memory;
use crate::text::truncate_with_ellipsis;
use serde::{Deserialize, Serialize};

pub const IMPORTANT_TITLE: &str = "⭐ An important memory is nearby!";
pub const GENERAL_TITLE: &str = "📝 A memory is nearby!";

/// Data attached to a notification so a tap can open the memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub memory_id: String,
}

/// One immediate local notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub payload: NotificationPayload,
}

impl NotificationContent {
    /// Builds the copy for `memory`: the title depends on importance, the body
    /// quotes the text cut to `body_max_chars`.
    pub fn for_memory(memory: &Memory, body_max_chars: usize) -> Self {
        let title = if memory.is_important {
            IMPORTANT_TITLE
        } else {
            GENERAL_TITLE
        };
        Self {
            title: title.to_string(),
            body: format!(
                "\"{}\"",
                truncate_with_ellipsis(&memory.text, body_max_chars)
            ),
            payload: NotificationPayload {
                memory_id: memory.id.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationContent, GENERAL_TITLE, IMPORTANT_TITLE};
    use crate::model::memory::Memory;

    #[test]
    fn title_follows_importance() {
        let general = Memory::new("ramen place", 0.0, 0.0, "");
        let important = general.clone().important(true);
        assert_eq!(NotificationContent::for_memory(&general, 50).title, GENERAL_TITLE);
        assert_eq!(NotificationContent::for_memory(&important, 50).title, IMPORTANT_TITLE);
    }

    #[test]
    fn long_body_is_truncated_with_ellipsis() {
        let memory = Memory::new("a".repeat(60), 0.0, 0.0, "");
        let content = NotificationContent::for_memory(&memory, 50);
        assert_eq!(content.body, format!("\"{}...\"", "a".repeat(50)));
    }

    #[test]
    fn short_body_is_quoted_verbatim() {
        let memory = Memory::new("ramen place", 0.0, 0.0, "");
        let content = NotificationContent::for_memory(&memory, 50);
        assert_eq!(content.body, "\"ramen place\"");
        assert_eq!(content.payload.memory_id, memory.id.to_string());
    }
}
