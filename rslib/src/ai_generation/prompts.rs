use itertools::Itertools;

use crate::ai_generation::input_processor::truncate_chars;
use crate::ai_generation::{ChatMessage, StudyAidKind};
use crate::quiz::OPTION_COUNT;
use crate::storage::Note;

pub const DEFAULT_QUESTION_COUNT: u32 = 10;
/// Text beyond this many characters is not sent for speech preparation.
pub const MAX_SPEECH_CHARS: usize = 3000;

pub(crate) const QUIZ_SYSTEM_PROMPT: &str = "You write multiple-choice quizzes for students. \
Respond with a JSON object only, without markdown fences or commentary.";

/// Notes rendered as `title\ncontent`, separated by blank lines.
pub fn combine_notes(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|note| format!("{}\n{}", note.title.trim(), note.content.trim()))
        .join("\n\n")
}

/// Prompt for a study aid generated from the user's own notes.
pub fn build_study_aid_prompt(kind: StudyAidKind, notes: &str, subject: Option<&str>) -> String {
    let subject = subject_or_default(subject);
    match kind {
        StudyAidKind::Summary => format!(
            "Create a structured, detailed summary of the following notes on {subject}.\n\
Organize the content with headings, subheadings and key points.\n\
Use Markdown for the structure.\n\n\
Notes: {notes}"
        ),
        StudyAidKind::Flashcards => format!(
            "Create revision flashcards based on the following notes on {subject}.\n\
{format}\n\
Create at least 5 different cards covering the main concepts.\n\n\
Notes: {notes}",
            format = FLASHCARD_FORMAT
        ),
        StudyAidKind::Quiz => build_quiz_prompt(notes, Some(subject), DEFAULT_QUESTION_COUNT),
        StudyAidKind::MindMap => format!(
            "Create a structured text mind map based on the following notes on {subject}.\n\
{format}\n\n\
Notes: {notes}",
            format = MIND_MAP_FORMAT
        ),
        StudyAidKind::KeyPoints => format!(
            "Extract the essential points of the following notes on {subject}.\n\
{format}\n\n\
Notes: {notes}",
            format = KEY_POINTS_FORMAT
        ),
    }
}

/// Prompt asking for `count` multiple-choice questions as
/// `{"questions": [{"question", "options", "correct"}]}`.
pub fn build_quiz_prompt(notes: &str, subject: Option<&str>, count: u32) -> String {
    let count = if count == 0 {
        DEFAULT_QUESTION_COUNT
    } else {
        count
    };
    let subject = subject_or_default(subject);
    format!(
        "Create a quiz of {count} multiple-choice questions based on the following notes on {subject}.\n\
Every question must have exactly {OPTION_COUNT} options, and \"correct\" is the zero-based index of the right option.\n\
Return ONLY valid JSON with exactly this structure:\n\
{{\n  \"questions\": [\n    {{\n      \"question\": \"Question here\",\n      \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"],\n      \"correct\": 0\n    }}\n  ]\n}}\n\n\
Notes: {notes}"
    )
}

/// Prompt for analysing text extracted from an uploaded document.
pub fn build_document_prompt(kind: StudyAidKind, text: &str) -> String {
    let instructions = match kind {
        StudyAidKind::Summary => {
            "Analyse this course content and write a structured, detailed summary.\n\n\
Instructions:\n\
- Use Markdown to structure the content\n\
- Organize with headings (##) and subheadings (###)\n\
- Highlight key concepts in **bold**\n\
- Use bullet lists for important points\n\
- Keep an academic but accessible style"
        }
        StudyAidKind::MindMap => {
            "Analyse this course content and create a text mind map.\n\n\
Instructions:\n\
- Use a clear hierarchy\n\
- Identify the relationships between concepts\n\
- At most 4 levels of hierarchy"
        }
        StudyAidKind::Flashcards => {
            "Analyse this course content and create revision flashcards.\n\n\
Instructions:\n\
- Create 8-12 cards covering the main concepts\n\
- Vary the kinds of question (definitions, examples, applications)"
        }
        StudyAidKind::KeyPoints => {
            "Analyse this course content and extract the essential points.\n\n\
Instructions:\n\
- Be concise but complete"
        }
        StudyAidKind::Quiz => return build_quiz_prompt(text, None, DEFAULT_QUESTION_COUNT),
    };
    let format = match kind {
        StudyAidKind::MindMap => MIND_MAP_FORMAT,
        StudyAidKind::Flashcards => FLASHCARD_FORMAT,
        StudyAidKind::KeyPoints => KEY_POINTS_FORMAT,
        _ => "",
    };

    format!(
        "You are an expert educational assistant. {instructions}\n{format}\n\n\
Content to analyse:\n{text}\n\n\
Reply only with the {label}.",
        label = kind.label().to_lowercase()
    )
}

/// System message for the note assistant chat.
pub fn chat_system_message(note_content: Option<&str>) -> ChatMessage {
    let note = note_content
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .unwrap_or("No note content provided.");
    ChatMessage::system(format!(
        "You are a study assistant for the SamaNote application.\n\
Your role is to help the student understand their notes, revise and deepen their knowledge.\n\n\
Here is the content of the note the student is currently working on:\n---\n{note}\n---\n\n\
Answer the student's questions based on this content where relevant.\n\
Be encouraging, clear and educational. If you don't know, say so.\n\
Do not invent information that is not in the context, unless it is general knowledge."
    ))
}

/// Prompt rewriting text so it reads well aloud.
pub fn build_speech_prompt(text: &str) -> String {
    format!(
        "Improve the following text for speech synthesis. Add natural pauses, \
rephrase complex sentences so they are easy to follow by ear, and keep all of \
the information while optimizing it for audio.\n\n\
Text:\n{text}\n\n\
Reply only with the improved text.",
        text = truncate_chars(text, MAX_SPEECH_CHARS)
    )
}

/// Prompt converting text into an SSML document.
pub fn build_ssml_prompt(text: &str) -> String {
    format!(
        "Convert the following text to SSML for speech synthesis. Use tags for \
pauses, emphasis and pronunciation where they help the listener.\n\n\
Example:\n\
<speak><p>Photosynthesis is <emphasis level=\"strong\">essential</emphasis>.</p>\
<break time=\"1s\"/><p>It takes place in the chloroplasts.</p></speak>\n\n\
Text:\n{text}\n\n\
Reply only with the SSML document.",
        text = truncate_chars(text, MAX_SPEECH_CHARS)
    )
}

const FLASHCARD_FORMAT: &str = "Use exactly this format:\n\
## Card 1: [Concept title]\n\
**Question**: [Clear question]\n\
**Answer**: [Detailed answer]";

const MIND_MAP_FORMAT: &str = "Use exactly this format:\n\
# Main concept\n\
## Sub-concept 1\n\
### Detail group\n\
- Important point\n\
## Sub-concept 2\n\
- Important point";

const KEY_POINTS_FORMAT: &str = "Use exactly this format:\n\
# Key Points\n\
## Key Concepts\n\
- **[Concept]**: [Short explanation]\n\
## Definitions\n\
- **[Term]**: [Definition]\n\
## Points to Remember\n\
- [Important point]\n\
## Formulas and Methods\n\
- [Formula or method, if applicable]";

fn subject_or_default(subject: Option<&str>) -> &str {
    subject
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .unwrap_or("the subject")
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn combines_notes_in_order() {
        let notes = vec![
            Note::new("Cells", "Cells divide. "),
            Note::new(" Mitosis", "Four phases."),
        ];
        assert_eq!(
            combine_notes(&notes),
            "Cells\nCells divide.\n\nMitosis\nFour phases."
        );
    }

    #[test]
    fn quiz_prompt_describes_the_expected_json() {
        let prompt = build_quiz_prompt("notes here", Some("biology"), 7);
        assert!(prompt.contains("7 multiple-choice questions"));
        assert!(prompt.contains("on biology"));
        assert!(prompt.contains("\"questions\""));
        assert!(prompt.contains("exactly 4 options"));
        assert!(prompt.ends_with("Notes: notes here"));

        let prompt = build_quiz_prompt("n", None, 0);
        assert!(prompt.contains("10 multiple-choice questions"));
        assert!(prompt.contains("on the subject"));
    }

    #[test]
    fn every_kind_has_a_prompt() {
        for kind in StudyAidKind::iter() {
            let prompt = build_study_aid_prompt(kind, "the notes", Some("history"));
            assert!(prompt.contains("the notes"), "{kind}");
            let prompt = build_document_prompt(kind, "the document");
            assert!(prompt.contains("the document"), "{kind}");
        }
    }

    #[test]
    fn flashcard_prompt_uses_parseable_format() {
        let prompt = build_study_aid_prompt(StudyAidKind::Flashcards, "n", None);
        assert!(prompt.contains("## Card 1:"));
        assert!(prompt.contains("**Answer**:"));
    }

    #[test]
    fn speech_prompts_cut_long_text() {
        let text = format!("{}{}", "é".repeat(MAX_SPEECH_CHARS), "TAIL");
        for prompt in [build_speech_prompt(&text), build_ssml_prompt(&text)] {
            assert!(prompt.contains(&"é".repeat(MAX_SPEECH_CHARS)));
            assert!(!prompt.contains("TAIL"));
        }
        assert!(build_ssml_prompt("hi").contains("<speak>"));
        assert!(build_speech_prompt("hi").contains("natural pauses"));
    }

    #[test]
    fn chat_message_embeds_note() {
        let message = chat_system_message(Some("Photosynthesis converts light."));
        assert_eq!(message.role, crate::ai_generation::Role::System);
        assert!(message.content.contains("Photosynthesis converts light."));
        assert!(chat_system_message(Some("  "))
            .content
            .contains("No note content provided."));
    }
}
