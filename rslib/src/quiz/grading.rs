use serde::Serialize;

use super::Quiz;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum GradeVerdict {
    Excellent,
    Good,
    Review,
}

impl GradeVerdict {
    fn for_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => GradeVerdict::Excellent,
            60..=79 => GradeVerdict::Good,
            _ => GradeVerdict::Review,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizGrade {
    pub correct: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent.
    pub percentage: u32,
    pub verdict: GradeVerdict,
}

impl Quiz {
    /// Score a set of answers, given in question order. Missing or unanswered
    /// entries count as wrong; surplus entries are ignored.
    pub fn grade(&self, answers: &[Option<usize>]) -> QuizGrade {
        let total = self.questions.len();
        let correct = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| answer.is_some_and(|answer| question.is_correct(answer)))
            .count();
        let percentage = if total == 0 {
            0
        } else {
            (correct as f64 * 100.0 / total as f64).round() as u32
        };

        QuizGrade {
            correct,
            total,
            percentage,
            verdict: GradeVerdict::for_percentage(percentage),
        }
    }
}
