use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoints {
    pub concepts: Vec<String>,
    pub definitions: Vec<String>,
    pub points: Vec<String>,
    pub formulas: Vec<String>,
}

impl KeyPoints {
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
            && self.definitions.is_empty()
            && self.points.is_empty()
            && self.formulas.is_empty()
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Concepts => &mut self.concepts,
            Section::Definitions => &mut self.definitions,
            Section::Points => &mut self.points,
            Section::Formulas => &mut self.formulas,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Concepts,
    Definitions,
    Points,
    Formulas,
}

impl Section {
    /// Headings are matched loosely, in English or French, ignoring any
    /// leading emoji.
    fn from_heading(heading: &str) -> Option<Self> {
        let heading = heading.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|word| heading.contains(word));
        if has(&["concept"]) {
            Some(Section::Concepts)
        } else if has(&["definition", "définition"]) {
            Some(Section::Definitions)
        } else if has(&["remember", "retenir"]) {
            Some(Section::Points)
        } else if has(&["formula", "formule", "method", "méthode"]) {
            Some(Section::Formulas)
        } else {
            None
        }
    }
}

/// Collect the bullet items of each key-point section. Bullets under any
/// other heading, or before the first recognised one, are ignored.
pub fn parse_key_points(markdown: &str) -> KeyPoints {
    let mut key_points = KeyPoints::default();
    let mut section = None;

    for line in markdown.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            section = Section::from_heading(line.trim_start_matches('#'));
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            let item = item.trim();
            if let (Some(section), false) = (section, item.is_empty()) {
                key_points.section_mut(section).push(item.to_string());
            }
        }
    }

    key_points
}
