//! Recovery of quiz questions from model output.
//!
//! Models asked for JSON frequently wrap it in code fences or prose, or break
//! the syntax part way through. Three strategies are tried, most precise
//! first:
//!
//! 1. strip code fences and parse the whole reply;
//! 2. parse the first array-of-objects (or object) span found in the reply;
//! 3. rebuild each `"question"/"options"/"correct"` fragment independently.
//!
//! A batch produced by strategy 1 or 2 is accepted or rejected as a whole. In
//! strategy 3, fragments that cannot be decoded are skipped, but a decoded
//! fragment that fails validation rejects the batch.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ai_generation::AiResult;
use crate::error::StudyError;
use crate::quiz::{QuestionDefect, QuizQuestion};

static QUESTION_FRAGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)"question"\s*:\s*("(?:[^"\\]|\\.)*")\s*,\s*"options"\s*:\s*(\[[^\]]*\])\s*,\s*"correct"\s*:\s*"?(-?\d+)"?"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Questions(Vec<QuizQuestion>),
    /// Nothing usable was found. Carries the model output for diagnostics.
    Failed { raw: String },
}

impl ExtractionOutcome {
    pub fn questions(&self) -> Option<&[QuizQuestion]> {
        match self {
            ExtractionOutcome::Questions(questions) => Some(questions),
            ExtractionOutcome::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Questions(_))
    }

    pub fn into_result(self) -> AiResult<Vec<QuizQuestion>> {
        match self {
            ExtractionOutcome::Questions(questions) => Ok(questions),
            ExtractionOutcome::Failed { raw } => Err(StudyError::ExtractionFailed { raw }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum Strategy {
    StripAndParse,
    BracketScan,
    FragmentScan,
}

#[derive(Debug)]
enum Rejection {
    Malformed { index: usize, reason: String },
    Invalid { index: usize, defect: QuestionDefect },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Malformed { index, reason } => {
                write!(f, "question {} is malformed: {reason}", index + 1)
            }
            Rejection::Invalid { index, defect } => {
                write!(f, "question {} is invalid: {defect}", index + 1)
            }
        }
    }
}

/// The shape each question must have before semantic validation.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct: AnswerIndex,
}

/// Models sometimes quote the answer index.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerIndex {
    Number(i64),
    Text(String),
}

impl RawQuestion {
    fn validate(self, index: usize) -> Result<QuizQuestion, Rejection> {
        let correct = match self.correct {
            AnswerIndex::Number(correct) => correct,
            AnswerIndex::Text(text) => text.trim().parse().map_err(|_| Rejection::Malformed {
                index,
                reason: format!("correct index {text:?} is not an integer"),
            })?,
        };
        QuizQuestion::new(self.question, self.options, correct)
            .map_err(|defect| Rejection::Invalid { index, defect })
    }
}

/// Recover a validated list of quiz questions from `raw`. Never fails loudly:
/// anything unusable yields [ExtractionOutcome::Failed].
pub fn extract_quiz_questions(raw: &str) -> ExtractionOutcome {
    let batch = strip_and_parse(raw)
        .map(|items| (Strategy::StripAndParse, items))
        .or_else(|| bracket_scan(raw).map(|items| (Strategy::BracketScan, items)));

    let (strategy, result) = match batch {
        Some((strategy, items)) => (strategy, validate_batch(items)),
        None => (Strategy::FragmentScan, recover_fragments(raw)),
    };

    match result {
        Ok(questions) if !questions.is_empty() => {
            debug!(%strategy, count = questions.len(), "extracted quiz questions");
            ExtractionOutcome::Questions(questions)
        }
        Ok(_) => {
            warn!(%strategy, raw_len = raw.len(), "no quiz questions found in model output");
            debug!(raw, "unusable model output");
            ExtractionOutcome::Failed {
                raw: raw.to_string(),
            }
        }
        Err(rejection) => {
            warn!(%strategy, %rejection, raw_len = raw.len(), "rejected quiz batch");
            debug!(raw, "unusable model output");
            ExtractionOutcome::Failed {
                raw: raw.to_string(),
            }
        }
    }
}

fn strip_and_parse(raw: &str) -> Option<Vec<Value>> {
    let stripped = strip_code_fences(raw);
    parse_question_list(&stripped)
}

fn bracket_scan(raw: &str) -> Option<Vec<Value>> {
    array_of_object_spans(raw)
        .chain(balanced_span(raw, '{', '}'))
        .chain(greedy_object_span(raw))
        .find_map(parse_question_list)
}

fn parse_question_list(candidate: &str) -> Option<Vec<Value>> {
    let value = serde_json::from_str::<Value>(candidate).ok()?;
    resolve_question_list(value)
}

/// An array is taken as-is. For an object, the `questions` property is
/// preferred, then the first property holding an array of objects. An object
/// that is itself a question is not a list.
fn resolve_question_list(value: Value) -> Option<Vec<Value>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(object) => {
            if object.contains_key("question") {
                return None;
            }
            let mut first_list = None;
            for (key, value) in object {
                if let Value::Array(items) = value {
                    if key == "questions" {
                        first_list = Some(items);
                        break;
                    }
                    if first_list.is_none() && items.iter().any(Value::is_object) {
                        first_list = Some(items);
                    }
                }
            }
            first_list?
        }
        _ => return None,
    };
    (!items.is_empty()).then_some(items)
}

fn validate_batch(items: Vec<Value>) -> Result<Vec<QuizQuestion>, Rejection> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let raw: RawQuestion = serde_json::from_value(item).map_err(|err| Rejection::Malformed {
                index,
                reason: err.to_string(),
            })?;
            raw.validate(index)
        })
        .collect()
}

fn recover_fragments(raw: &str) -> Result<Vec<QuizQuestion>, Rejection> {
    let mut questions = Vec::new();
    for captures in QUESTION_FRAGMENT.captures_iter(raw) {
        let Some(fragment) = decode_fragment(&captures[1], &captures[2], &captures[3]) else {
            debug!(fragment = &captures[0], "skipping undecodable question fragment");
            continue;
        };
        let index = questions.len();
        questions.push(fragment.validate(index)?);
    }
    Ok(questions)
}

fn decode_fragment(question: &str, options: &str, correct: &str) -> Option<RawQuestion> {
    Some(RawQuestion {
        question: serde_json::from_str(question).ok()?,
        options: serde_json::from_str(options).ok()?,
        correct: AnswerIndex::Number(correct.parse().ok()?),
    })
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Every `[` that opens an array of objects, matched to its closing bracket.
fn array_of_object_spans(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(move |(idx, ch)| {
            *ch == '['
                && text[idx + 1..]
                    .trim_start()
                    .starts_with('{')
        })
        .filter_map(move |(idx, _)| balanced_from(text, idx, '[', ']'))
}

fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    balanced_from(text, start, open, close)
}

/// The span starting at `start` (which must hold `open`) up to the matching
/// `close`, ignoring brackets inside JSON strings.
fn balanced_from(text: &str, start: usize, open: char, close: char) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(&text[start..start + offset + ch.len_utf8()]);
            }
        }
    }
    None
}

fn greedy_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
