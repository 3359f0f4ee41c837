use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai_generation::config::AiGenerationConfig;
use crate::ai_generation::dispatcher::CompletionDispatcher;
use crate::ai_generation::input_processor::InputProcessor;
use crate::ai_generation::prompts::{
    build_document_prompt, build_quiz_prompt, build_speech_prompt, build_ssml_prompt,
    build_study_aid_prompt, chat_system_message, combine_notes, QUIZ_SYSTEM_PROMPT,
};
use crate::ai_generation::quiz_parser::extract_quiz_questions;
use crate::ai_generation::{AiResult, ChatMessage, CompletionRequest, FilePayload, StudyAidKind};
use crate::error::OrNotFound;
use crate::quiz::{Quiz, QuizQuestion};
use crate::storage::{Note, NoteSource, QuizId, QuizStore, SubjectId, UserId};

/// Lower than the default so document analysis stays close to the source.
const DOCUMENT_TEMPERATURE: f32 = 0.3;
const DOCUMENT_MAX_TOKENS: u32 = 2500;
const SPEECH_TEMPERATURE: f32 = 0.3;
const SPEECH_MAX_TOKENS: u32 = 2000;

/// Caller-supplied overrides for [StudyAidService::generate_quiz].
#[derive(Debug, Clone, Default)]
pub struct QuizOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Zero asks for the default number of questions.
    pub question_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedQuiz {
    pub id: QuizId,
    pub quiz: Quiz,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfAnalysis {
    pub title: String,
    pub content: String,
    pub kind: StudyAidKind,
    pub preview: String,
}

#[derive(Serialize)]
struct QuestionList<'a> {
    questions: &'a [QuizQuestion],
}

pub struct StudyAidService {
    dispatcher: CompletionDispatcher,
}

impl StudyAidService {
    pub fn new(config: &AiGenerationConfig) -> AiResult<Self> {
        Ok(Self::with_dispatcher(CompletionDispatcher::new(config)?))
    }

    pub fn with_dispatcher(dispatcher: CompletionDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &CompletionDispatcher {
        &self.dispatcher
    }

    /// Generate a study aid from already combined notes. Text kinds return
    /// the model's markdown; a quiz returns `{"questions": [...]}` JSON
    /// holding only validated questions.
    pub async fn generate_study_aid(
        &self,
        kind: StudyAidKind,
        notes: &str,
        subject: Option<&str>,
    ) -> AiResult<String> {
        if notes.trim().is_empty() {
            crate::invalid_input!("notes are required to generate a {}", kind.label());
        }
        let prompt = build_study_aid_prompt(kind, notes, subject);
        self.complete_study_aid(kind, request_for(kind, prompt)).await
    }

    pub async fn generate_quiz_questions(
        &self,
        notes: &[Note],
        subject: Option<&str>,
        question_count: u32,
    ) -> AiResult<Vec<QuizQuestion>> {
        if notes.is_empty() {
            crate::invalid_input!("at least one note is required to generate a quiz");
        }
        let prompt = build_quiz_prompt(&combine_notes(notes), subject, question_count);
        let raw = self
            .dispatcher
            .generate_completion(&request_for(StudyAidKind::Quiz, prompt))
            .await?;
        extract_quiz_questions(&raw).into_result()
    }

    /// Build a quiz from every note in a subject and persist it. Nothing is
    /// saved unless all extracted questions are valid.
    pub async fn generate_quiz(
        &self,
        notes: &dyn NoteSource,
        store: &dyn QuizStore,
        user: &UserId,
        subject_id: &SubjectId,
        options: QuizOptions,
    ) -> AiResult<SavedQuiz> {
        let subject = notes.subject(user, subject_id).await?.or_not_found(subject_id)?;
        let subject_notes = notes.notes_for_subject(user, subject_id).await?;
        if subject_notes.is_empty() {
            crate::invalid_input!("no notes found for subject {}", subject.name);
        }

        let questions = self
            .generate_quiz_questions(&subject_notes, Some(&subject.name), options.question_count)
            .await?;

        let title = non_blank(options.title).unwrap_or_else(|| {
            format!("Quiz {} - {}", subject.name, Local::now().format("%d/%m/%Y"))
        });
        let description = non_blank(options.description).unwrap_or_else(|| {
            format!("Quiz generated automatically from the notes of {}", subject.name)
        });
        let quiz = Quiz::new(title, description, questions)?;

        let id = store.save_quiz(user, subject_id, &quiz).await?;
        info!(%user, subject = %subject_id, quiz = %id, questions = quiz.questions.len(), "saved generated quiz");
        Ok(SavedQuiz { id, quiz })
    }

    /// Analyse an uploaded PDF. The result is returned to the caller, not
    /// stored.
    pub async fn analyze_pdf(
        &self,
        file: &FilePayload,
        kind: StudyAidKind,
        title: Option<&str>,
    ) -> AiResult<PdfAnalysis> {
        let processed = InputProcessor::prepare_pdf(file)?;
        if processed.truncated {
            debug!(filename = %file.filename, "PDF text truncated for analysis");
        }

        let request = request_for(kind, build_document_prompt(kind, &processed.text))
            .with_temperature(DOCUMENT_TEMPERATURE)
            .with_max_tokens(DOCUMENT_MAX_TOKENS);
        let content = self.complete_study_aid(kind, request).await?;

        let name = title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| document_name(&file.filename));

        Ok(PdfAnalysis {
            title: format!("{} - {}", kind.label(), name),
            content,
            kind,
            preview: processed.preview,
        })
    }

    /// Answer the latest message of a conversation about a note.
    pub async fn chat(
        &self,
        note_content: Option<&str>,
        messages: Vec<ChatMessage>,
    ) -> AiResult<String> {
        if messages.is_empty() {
            crate::invalid_input!("at least one message is required");
        }
        let conversation = std::iter::once(chat_system_message(note_content))
            .chain(messages)
            .collect();
        let reply = self
            .dispatcher
            .generate_completion(&CompletionRequest::new(conversation))
            .await?;
        Ok(reply.trim().to_string())
    }

    /// Rewrite text so it reads well aloud. Returns the text unchanged if no
    /// model produces a usable reply.
    pub async fn enhance_for_speech(&self, text: &str) -> AiResult<String> {
        self.prepare_speech(text, build_speech_prompt(text), "speech enhancement")
            .await
    }

    /// Convert text to an SSML `<speak>` document, or return it unchanged if
    /// no model produces a usable reply.
    pub async fn generate_ssml(&self, text: &str) -> AiResult<String> {
        self.prepare_speech(text, build_ssml_prompt(text), "SSML generation")
            .await
    }

    async fn prepare_speech(&self, text: &str, prompt: String, task: &str) -> AiResult<String> {
        if text.trim().is_empty() {
            crate::invalid_input!("text is required for {task}");
        }
        let request = CompletionRequest::from_prompt(prompt)
            .with_temperature(SPEECH_TEMPERATURE)
            .with_max_tokens(SPEECH_MAX_TOKENS);
        match self.dispatcher.generate_completion(&request).await {
            Ok(reply) if !reply.trim().is_empty() => Ok(reply.trim().to_string()),
            Ok(_) => {
                warn!(task, "blank reply, keeping original text");
                Ok(text.to_string())
            }
            Err(err) => {
                warn!(task, error = %err, "keeping original text");
                Ok(text.to_string())
            }
        }
    }

    async fn complete_study_aid(
        &self,
        kind: StudyAidKind,
        request: CompletionRequest,
    ) -> AiResult<String> {
        let raw = self.dispatcher.generate_completion(&request).await?;
        match kind {
            StudyAidKind::Quiz => {
                let questions = extract_quiz_questions(&raw).into_result()?;
                Ok(serde_json::to_string(&QuestionList {
                    questions: &questions,
                })?)
            }
            _ => Ok(raw.trim().to_string()),
        }
    }
}

fn request_for(kind: StudyAidKind, prompt: String) -> CompletionRequest {
    match kind {
        StudyAidKind::Quiz => CompletionRequest::new(vec![
            ChatMessage::system(QUIZ_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_json_mode(true),
        _ => CompletionRequest::from_prompt(prompt),
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn document_name(filename: &str) -> &str {
    let stem_len = filename.len().saturating_sub(4);
    match filename.get(stem_len..) {
        Some(extension) if stem_len > 0 && extension.eq_ignore_ascii_case(".pdf") => {
            &filename[..stem_len]
        }
        _ => filename,
    }
}
