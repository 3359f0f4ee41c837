//! AI-assisted study aids: completion dispatch over an ordered list of
//! fallback models, and recovery of structured data from the model output.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;

pub mod config;
pub mod dispatcher;
pub mod flashcard_parser;
pub mod input_processor;
pub mod key_points;
pub mod mindmap;
pub mod prompts;
pub mod providers;
pub mod quiz_parser;
pub mod service;

/// Convenient alias for results returned by the AI generation layer.
pub type AiResult<T> = Result<T>;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A chat prompt plus sampling options. Built once with the `with_*` methods,
/// then handed to the dispatcher by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    json_mode: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            json_mode: false,
        }
    }

    /// A request consisting of a single user message.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(prompt)])
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Ask the provider to constrain its output to a JSON object. Not every
    /// model honours this.
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn json_mode(&self) -> bool {
        self.json_mode
    }
}

/// Raw response returned by a provider before any parsing.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub raw_output: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// The kinds of study aid that can be generated from notes or documents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StudyAidKind {
    Summary,
    #[serde(alias = "flashcard")]
    #[strum(to_string = "flashcards", serialize = "flashcard")]
    Flashcards,
    Quiz,
    #[serde(rename = "mindmap", alias = "mind_map")]
    #[strum(to_string = "mindmap", serialize = "mind_map")]
    MindMap,
    KeyPoints,
}

impl StudyAidKind {
    /// Human-readable label, used when titling generated documents.
    pub fn label(self) -> &'static str {
        match self {
            StudyAidKind::Summary => "Summary",
            StudyAidKind::Flashcards => "Flashcards",
            StudyAidKind::Quiz => "Quiz",
            StudyAidKind::MindMap => "Mind Map",
            StudyAidKind::KeyPoints => "Key Points",
        }
    }
}

/// Describes a user-supplied file.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub filename: String,
    pub data: Vec<u8>,
    pub mimetype: Option<String>,
}

impl FilePayload {
    pub fn new(filename: String, data: Vec<u8>, mimetype: Option<String>) -> Self {
        Self {
            filename,
            data,
            mimetype,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn request_defaults() {
        let request = CompletionRequest::from_prompt("hello");
        assert_eq!(request.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens(), DEFAULT_MAX_TOKENS);
        assert!(!request.json_mode());
        assert_eq!(request.messages(), &[ChatMessage::user("hello")]);

        let request = request
            .with_temperature(0.3)
            .with_max_tokens(2500)
            .with_json_mode(true);
        assert_eq!(request.temperature(), 0.3);
        assert_eq!(request.max_tokens(), 2500);
        assert!(request.json_mode());
    }

    #[test]
    fn study_aid_kind_names() {
        assert_eq!(StudyAidKind::from_str("flashcard").unwrap(), StudyAidKind::Flashcards);
        assert_eq!(StudyAidKind::from_str("Flashcards").unwrap(), StudyAidKind::Flashcards);
        assert_eq!(StudyAidKind::from_str("mindmap").unwrap(), StudyAidKind::MindMap);
        assert_eq!(StudyAidKind::from_str("key_points").unwrap(), StudyAidKind::KeyPoints);
        assert!(StudyAidKind::from_str("essay").is_err());
        assert_eq!(StudyAidKind::MindMap.to_string(), "mindmap");
        assert_eq!(Role::Assistant.as_ref(), "assistant");
    }
}
