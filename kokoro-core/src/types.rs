//! Domain enums shared by storage and the HTTP surface.

use serde::{Deserialize, Serialize};

/// Counseling category a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionCategory {
    Love,
    Life,
    Relationship,
}

impl SessionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionCategory::Love => "love",
            SessionCategory::Life => "life",
            SessionCategory::Relationship => "relationship",
        }
    }

    /// Parses the lowercase wire/database form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "love" => Some(SessionCategory::Love),
            "life" => Some(SessionCategory::Life),
            "relationship" => Some(SessionCategory::Relationship),
            _ => None,
        }
    }
}

impl Default for SessionCategory {
    /// Sessions created without an explicit category default to life counseling.
    fn default() -> Self {
        SessionCategory::Life
    }
}

/// Role of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            "system" => Some(MessageRole::System),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for c in [
            SessionCategory::Love,
            SessionCategory::Life,
            SessionCategory::Relationship,
        ] {
            assert_eq!(SessionCategory::parse(c.as_str()), Some(c));
        }
        assert_eq!(SessionCategory::parse("work"), None);
    }

    #[test]
    fn test_category_default_is_life() {
        assert_eq!(SessionCategory::default(), SessionCategory::Life);
    }

    #[test]
    fn test_role_round_trip() {
        for r in [
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::System,
        ] {
            assert_eq!(MessageRole::parse(r.as_str()), Some(r));
        }
        assert_eq!(MessageRole::parse("tool"), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&SessionCategory::Relationship).unwrap();
        assert_eq!(json, "\"relationship\"");
        let role: MessageRole = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, MessageRole::Assistant);
    }
}
