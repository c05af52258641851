//! Conversation context shared by every model call in a chat session.
//!
//! The history is owned by the caller and re-supplied with each question.
//! Pipelines only ever borrow it.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a caller-supplied role label. Anything other than `user` is the assistant.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One canonical conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A turn as it arrives from a client, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTurn {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Normalize caller history into canonical turns, preserving order.
pub fn normalize_history(raw: &[RawTurn]) -> Vec<ChatMessage> {
    raw.iter()
        .map(|turn| ChatMessage {
            role: Role::from_label(turn.role.as_deref().unwrap_or_default()),
            content: turn.content.clone().unwrap_or_default(),
        })
        .collect()
}

/// Render history for inclusion in a prompt, one `ROLE: content` line per turn.
pub fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}", msg.role.as_str().to_uppercase(), msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Message list for a model call: the history followed by one new user prompt.
pub fn with_prompt(history: &[ChatMessage], prompt: String) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(prompt));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(role: Option<&str>, content: &str) -> RawTurn {
        RawTurn {
            role: role.map(str::to_string),
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn test_normalize_coerces_unknown_roles() {
        let history = normalize_history(&[
            raw(Some("user"), "What is this video about?"),
            raw(Some("bot"), "Cooking."),
            raw(Some("USER"), "Which dish?"),
            raw(None, "Pasta."),
            raw(Some("system"), "ignored role"),
        ]);

        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant, Role::Assistant]
        );
        assert_eq!(history[1].content, "Cooking.");
    }

    #[test]
    fn test_normalize_missing_content() {
        let history = normalize_history(&[RawTurn::default()]);
        assert_eq!(history, vec![ChatMessage::assistant("")]);
    }

    #[test]
    fn test_format_history() {
        let history = vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello")];
        assert_eq!(format_history(&history), "USER: Hi\nASSISTANT: Hello");
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn test_with_prompt_appends_without_mutating() {
        let history = vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello")];
        let messages = with_prompt(&history, "Next".to_string());

        assert_eq!(history.len(), 2);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], ChatMessage::user("Next"));
    }

    #[test]
    fn test_raw_turn_deserialize() {
        let turns: Vec<RawTurn> =
            serde_json::from_str(r#"[{"role":"user","content":"a"},{"content":"b"}]"#).unwrap();
        let history = normalize_history(&turns);
        assert_eq!(history[0], ChatMessage::user("a"));
        assert_eq!(history[1], ChatMessage::assistant("b"));
    }
}
