//! Request and event types for the Anthropic Messages API

use serde::{Deserialize, Serialize};

/// Model used for explanations
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TutorModel {
    /// Fast and cheap, plenty for short explanations
    #[default]
    Haiku45,
    Sonnet45,
    Opus45,
}

impl TutorModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            Self::Haiku45 => "claude-haiku-4-5-20251001",
            Self::Sonnet45 => "claude-sonnet-4-5-20250929",
            Self::Opus45 => "claude-opus-4-5-20251101",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Haiku45 => "Claude Haiku 4.5",
            Self::Sonnet45 => "Claude Sonnet 4.5",
            Self::Opus45 => "Claude Opus 4.5",
        }
    }

    /// Parse a short name or a full model id
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "haiku" | "haiku45" | "haiku4.5" | "claude-haiku-4-5-20251001" => Some(Self::Haiku45),
            "sonnet" | "sonnet45" | "sonnet4.5" | "claude-sonnet-4-5-20250929" => {
                Some(Self::Sonnet45)
            }
            "opus" | "opus45" | "opus4.5" | "claude-opus-4-5-20251101" => Some(Self::Opus45),
            _ => None,
        }
    }

    pub fn all() -> &'static [TutorModel] {
        &[Self::Haiku45, Self::Sonnet45, Self::Opus45]
    }
}

impl std::str::FromStr for TutorModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown model: {}. Options: haiku, sonnet, opus", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Body of a `POST /v1/messages` request
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
}

impl MessagesRequest {
    /// Streaming request with a single user message
    pub fn new(model: TutorModel, prompt: impl Into<String>) -> Self {
        Self {
            model: model.model_id().to_string(),
            max_tokens: 1024,
            messages: vec![Message::user(prompt)],
            system: None,
            stream: true,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Server-sent events the tutor cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A chunk of answer text
    TextDelta(String),
    MessageStop,
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_parse() {
        assert_eq!(TutorModel::parse("haiku"), Some(TutorModel::Haiku45));
        assert_eq!(TutorModel::parse("SONNET"), Some(TutorModel::Sonnet45));
        assert_eq!(TutorModel::parse("claude-opus-4-5-20251101"), Some(TutorModel::Opus45));
        assert_eq!(TutorModel::parse("gpt"), None);
        assert!("nope".parse::<TutorModel>().is_err());
    }

    #[test]
    fn request_serializes_for_the_api() {
        let request = MessagesRequest::new(TutorModel::Haiku45, "Explain epsilon")
            .with_system("Be brief")
            .with_max_tokens(300);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "claude-haiku-4-5-20251001");
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["system"], "Be brief");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Explain epsilon");
    }

    #[test]
    fn system_prompt_is_omitted_when_unset() {
        let json = serde_json::to_value(MessagesRequest::new(TutorModel::Opus45, "hi")).unwrap();
        assert!(json.get("system").is_none());
    }
}
