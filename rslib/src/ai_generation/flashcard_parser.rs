use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

static CARD_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:flashcard|card|fiche)\b\s*\d*\s*[:.\-]?\s*").unwrap());

/// `**Question**:`, `**Question:**` and `**Réponse :**` style labels.
static LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\*\*\s*(question|answer|réponse|reponse)\s*(?::\s*\*\*|\*\*\s*:)\s*(.*)$")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub title: String,
    pub question: String,
    pub answer: String,
}

/// Parse flashcards from model output.
///
/// Models are asked for `## Card N: title` blocks holding a bold `Question`
/// and `Answer` label, but we also accept untitled question/answer pairs and,
/// failing that, a JSON array of `front`/`back` objects. Cards missing either
/// side are dropped.
pub fn parse_flashcards(markdown: &str) -> Vec<Flashcard> {
    let mut cards = parse_markdown_cards(markdown);
    if cards.is_empty() {
        cards = parse_json_cards(markdown).unwrap_or_default();
    }

    for (idx, card) in cards.iter_mut().enumerate() {
        if card.title.is_empty() {
            card.title = format!("Card {}", idx + 1);
        }
    }
    cards
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Question,
    Answer,
}

#[derive(Debug, Default)]
struct CardBuilder {
    title: String,
    question: String,
    answer: String,
    side: Option<Side>,
}

impl CardBuilder {
    fn titled(heading: &str) -> Self {
        Self {
            title: CARD_PREFIX.replace(heading.trim(), "").trim().to_string(),
            ..Default::default()
        }
    }

    fn text_mut(&mut self, side: Side) -> &mut String {
        match side {
            Side::Question => &mut self.question,
            Side::Answer => &mut self.answer,
        }
    }

    fn start(&mut self, side: Side, text: &str) {
        self.side = Some(side);
        let target = self.text_mut(side);
        target.clear();
        target.push_str(text.trim());
    }

    fn continue_line(&mut self, line: &str) {
        let Some(side) = self.side else {
            return;
        };
        let target = self.text_mut(side);
        if !target.is_empty() {
            target.push('\n');
        }
        target.push_str(line);
    }

    fn finish(self) -> Option<Flashcard> {
        let question = self.question.trim();
        let answer = self.answer.trim();
        if question.is_empty() || answer.is_empty() {
            return None;
        }
        Some(Flashcard {
            title: self.title,
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }
}

fn parse_markdown_cards(markdown: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut current: Option<CardBuilder> = None;

    for line in markdown.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = line.strip_prefix("## ") {
            cards.extend(current.take().and_then(CardBuilder::finish));
            current = Some(CardBuilder::titled(heading));
            continue;
        }

        if let Some(captures) = LABEL.captures(line) {
            let side = if captures[1].eq_ignore_ascii_case("question") {
                Side::Question
            } else {
                Side::Answer
            };
            // a second question without a heading starts the next card
            let starts_new_card = side == Side::Question
                && current
                    .as_ref()
                    .map_or(true, |card| !card.answer.is_empty());
            if starts_new_card {
                cards.extend(current.take().and_then(CardBuilder::finish));
                current = Some(CardBuilder::default());
            }
            if let Some(card) = current.as_mut() {
                card.start(side, &captures[2]);
            }
            continue;
        }

        if let Some(card) = current.as_mut() {
            card.continue_line(line);
        }
    }

    cards.extend(current.and_then(CardBuilder::finish));
    cards
}

fn parse_json_cards(raw: &str) -> Option<Vec<Flashcard>> {
    let body = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let items = match serde_json::from_str::<Value>(body).ok()? {
        Value::Array(items) => items,
        Value::Object(mut object) => ["cards", "flashcards", "items"]
            .into_iter()
            .find_map(|key| match object.get_mut(key).map(Value::take) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })?,
        _ => return None,
    };

    Some(items.iter().filter_map(card_from_value).collect())
}

fn card_from_value(value: &Value) -> Option<Flashcard> {
    match value {
        Value::Object(object) => card_from_object(object),
        // "front :: back"
        Value::String(text) => {
            let (question, answer) = ["::", "=>"]
                .into_iter()
                .find_map(|separator| text.split_once(separator))?;
            let (question, answer) = (question.trim(), answer.trim());
            if question.is_empty() || answer.is_empty() {
                return None;
            }
            Some(Flashcard {
                title: String::new(),
                question: question.to_string(),
                answer: answer.to_string(),
            })
        }
        _ => None,
    }
}

fn card_from_object(object: &Map<String, Value>) -> Option<Flashcard> {
    let mut title = None;
    let mut question = None;
    let mut answer = None;

    for (key, value) in object {
        let slot = match key.to_ascii_lowercase().as_str() {
            "front" | "question" | "prompt" | "q" => &mut question,
            "back" | "answer" | "response" | "a" => &mut answer,
            "title" | "heading" | "concept" => &mut title,
            _ => continue,
        };
        if slot.is_none() {
            *slot = value_to_string(value);
        }
    }

    Some(Flashcard {
        title: title.unwrap_or_default(),
        question: question?,
        answer: answer?,
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
