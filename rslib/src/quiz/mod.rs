//! Multiple-choice quizzes generated from a subject's notes.

mod grading;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

pub use self::grading::GradeVerdict;
pub use self::grading::QuizGrade;
use crate::error::Result;

/// Every question offers exactly this many options.
pub const OPTION_COUNT: usize = 4;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct: usize,
}

/// Why a question was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionDefect {
    EmptyQuestion,
    OptionCount(usize),
    EmptyOption(usize),
    CorrectOutOfRange(i64),
}

impl fmt::Display for QuestionDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionDefect::EmptyQuestion => f.write_str("question text is empty"),
            QuestionDefect::OptionCount(count) => {
                write!(f, "expected {OPTION_COUNT} options, found {count}")
            }
            QuestionDefect::EmptyOption(index) => write!(f, "option {index} is empty"),
            QuestionDefect::CorrectOutOfRange(index) => {
                write!(f, "correct index {index} is outside 0..{OPTION_COUNT}")
            }
        }
    }
}

impl QuizQuestion {
    /// Build a question, checking text, option count and answer index.
    pub fn new(question: String, options: Vec<String>, correct: i64) -> Result<Self, QuestionDefect> {
        if question.trim().is_empty() {
            return Err(QuestionDefect::EmptyQuestion);
        }
        if options.len() != OPTION_COUNT {
            return Err(QuestionDefect::OptionCount(options.len()));
        }
        if let Some(index) = options.iter().position(|option| option.trim().is_empty()) {
            return Err(QuestionDefect::EmptyOption(index));
        }
        let correct = usize::try_from(correct)
            .ok()
            .filter(|index| *index < OPTION_COUNT)
            .ok_or(QuestionDefect::CorrectOutOfRange(correct))?;

        Ok(Self {
            question,
            options,
            correct,
        })
    }

    pub fn validate(&self) -> Result<(), QuestionDefect> {
        let correct = i64::try_from(self.correct).unwrap_or(i64::MAX);
        Self::new(self.question.clone(), self.options.clone(), correct).map(|_| ())
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        self.correct == answer
    }

    /// `None` for a question that was never validated and points past its
    /// options.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub title: String,
    pub description: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(rename = "timeLimit")]
    pub time_limit_secs: u32,
}

impl Quiz {
    /// Assemble a quiz. A quiz with no questions, or with any invalid question,
    /// is refused as a whole.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self> {
        if questions.is_empty() {
            crate::invalid_input!("a quiz needs at least one question");
        }
        for (index, question) in questions.iter().enumerate() {
            if let Err(defect) = question.validate() {
                crate::invalid_input!("question {} is invalid: {}", index + 1, defect);
            }
        }

        Ok(Self {
            title: title.into(),
            description: description.into(),
            questions,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
        })
    }

    pub fn with_time_limit_secs(mut self, secs: u32) -> Self {
        self.time_limit_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Option {i}")).collect()
    }

    #[test]
    fn accepts_four_options_in_range() {
        let question = QuizQuestion::new("What is mitosis?".into(), options(4), 3).unwrap();
        assert_eq!(question.correct, 3);
        assert_eq!(question.correct_option(), Some("Option 3"));
        assert!(question.is_correct(3));
        assert!(!question.is_correct(0));
    }

    #[test]
    fn rejects_wrong_option_counts() {
        assert_eq!(
            QuizQuestion::new("Q".into(), options(3), 0),
            Err(QuestionDefect::OptionCount(3))
        );
        assert_eq!(
            QuizQuestion::new("Q".into(), options(5), 0),
            Err(QuestionDefect::OptionCount(5))
        );
    }

    #[test]
    fn rejects_out_of_range_answers() {
        assert_eq!(
            QuizQuestion::new("Q".into(), options(4), 4),
            Err(QuestionDefect::CorrectOutOfRange(4))
        );
        assert_eq!(
            QuizQuestion::new("Q".into(), options(4), -1),
            Err(QuestionDefect::CorrectOutOfRange(-1))
        );
    }

    #[test]
    fn rejects_blank_text() {
        assert_eq!(
            QuizQuestion::new("  ".into(), options(4), 0),
            Err(QuestionDefect::EmptyQuestion)
        );
        let mut opts = options(4);
        opts[2] = " ".into();
        assert_eq!(
            QuizQuestion::new("Q".into(), opts, 0),
            Err(QuestionDefect::EmptyOption(2))
        );
    }

    #[test]
    fn quiz_rejects_any_invalid_question() {
        let good = QuizQuestion::new("Q1".into(), options(4), 1).unwrap();
        let bad = QuizQuestion {
            question: "Q2".into(),
            options: options(4),
            correct: 7,
        };
        assert_eq!(bad.correct_option(), None);
        assert!(Quiz::new("t", "d", vec![good.clone(), bad]).is_err());
        assert!(Quiz::new("t", "d", Vec::new()).is_err());

        let quiz = Quiz::new("t", "d", vec![good]).unwrap();
        assert_eq!(quiz.time_limit_secs, DEFAULT_TIME_LIMIT_SECS);
        let json = serde_json::to_value(&quiz).unwrap();
        assert_eq!(json["timeLimit"], 300);
        assert_eq!(json["questions"][0]["correct"], 1);
    }
}
