//! Interfaces to the persistence layer, which lives outside this crate.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::quiz::Quiz;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }
    };
}

define_id!(UserId);
define_id!(SubjectId);
define_id!(QuizId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub title: String,
    pub content: String,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Read access to a user's subjects and notes.
#[async_trait]
pub trait NoteSource: Send + Sync {
    async fn subject(&self, user: &UserId, subject: &SubjectId) -> Result<Option<Subject>>;

    async fn notes_for_subject(&self, user: &UserId, subject: &SubjectId) -> Result<Vec<Note>>;
}

/// Receives validated quizzes for persistence.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn save_quiz(&self, user: &UserId, subject: &SubjectId, quiz: &Quiz) -> Result<QuizId>;
}
