use serde::{Deserialize, Serialize};
use std::fmt;

/// Section label used for questions whose CSV row leaves `section` blank.
pub const DEFAULT_SECTION: &str = "General";

/// Which side of the assessment a question set or response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyType {
    Company,
    Employee,
}

impl SurveyType {
    pub const ALL: [SurveyType; 2] = [SurveyType::Company, SurveyType::Employee];

    pub fn as_str(self) -> &'static str {
        match self {
            SurveyType::Company => "company",
            SurveyType::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "company" => Some(SurveyType::Company),
            "employee" => Some(SurveyType::Employee),
            _ => None,
        }
    }
}

impl fmt::Display for SurveyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input widget of a question. Choice kinds own their option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Text,
    Textarea,
    Number,
    Range,
    Likert,
    Select { options: Vec<String> },
    Radio { options: Vec<String> },
    Checkbox { options: Vec<String> },
}

impl QuestionKind {
    /// Build a kind from its CSV/wire name. Unknown names fall back to `Text`;
    /// options are dropped for kinds that do not offer a choice.
    pub fn from_parts(type_name: &str, options: Vec<String>) -> Self {
        match type_name.trim().to_ascii_lowercase().as_str() {
            "textarea" => QuestionKind::Textarea,
            "number" => QuestionKind::Number,
            "range" => QuestionKind::Range,
            "likert" => QuestionKind::Likert,
            "select" => QuestionKind::Select { options },
            "radio" => QuestionKind::Radio { options },
            "checkbox" => QuestionKind::Checkbox { options },
            _ => QuestionKind::Text,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Textarea => "textarea",
            QuestionKind::Number => "number",
            QuestionKind::Range => "range",
            QuestionKind::Likert => "likert",
            QuestionKind::Select { .. } => "select",
            QuestionKind::Radio { .. } => "radio",
            QuestionKind::Checkbox { .. } => "checkbox",
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::Select { options }
            | QuestionKind::Radio { options }
            | QuestionKind::Checkbox { options } => options,
            QuestionKind::Text
            | QuestionKind::Textarea
            | QuestionKind::Number
            | QuestionKind::Range
            | QuestionKind::Likert => &[],
        }
    }

    /// Whether the answer is a list of selected options.
    pub fn is_multi(&self) -> bool {
        matches!(self, QuestionKind::Checkbox { .. })
    }
}

/// One row of a survey definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub required: bool,
    pub section: String,
}

impl Question {
    pub fn section_label(&self) -> &str {
        if self.section.trim().is_empty() {
            DEFAULT_SECTION
        } else {
            self.section.trim()
        }
    }
}

/// Flat JSON shape of a question: `{id, text, type, required, options, section}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionRecord {
    id: String,
    text: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    section: String,
}

impl From<QuestionRecord> for Question {
    fn from(r: QuestionRecord) -> Self {
        Question {
            id: r.id,
            text: r.text,
            kind: QuestionKind::from_parts(&r.type_name, r.options),
            required: r.required,
            section: r.section,
        }
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        let type_name = q.kind.type_name().to_string();
        let options = q.kind.options().to_vec();
        QuestionRecord {
            id: q.id,
            text: q.text,
            type_name,
            required: q.required,
            options,
            section: q.section,
        }
    }
}

/// Questions grouped for display, sections in first-seen order and questions
/// in declared order within each section.
pub fn group_by_section(questions: &[Question]) -> Vec<(String, Vec<&Question>)> {
    let mut groups: Vec<(String, Vec<&Question>)> = Vec::new();
    for q in questions {
        let label = q.section_label();
        match groups.iter_mut().find(|(name, _)| name == label) {
            Some((_, members)) => members.push(q),
            None => groups.push((label.to_string(), vec![q])),
        }
    }
    groups
}

/// Body of `GET /questions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(rename = "type")]
    pub survey_type: SurveyType,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

impl QuestionSet {
    pub fn new(survey_type: SurveyType, questions: Vec<Question>) -> Self {
        let total_questions = questions.len();
        QuestionSet {
            survey_type,
            questions,
            total_questions,
        }
    }
}
