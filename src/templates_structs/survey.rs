use askama::Template;

use crate::models::question::{Question, QuestionKind, SurveyType, group_by_section};

pub const LIKERT_SCALE: [&str; 5] = [
    "Strongly disagree",
    "Disagree",
    "Neutral",
    "Agree",
    "Strongly agree",
];

/// Display form of one question. The widget flags are derived from the
/// question kind so templates only branch on booleans.
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub required: bool,
    pub input_type: &'static str,
    pub is_textarea: bool,
    pub is_select: bool,
    pub is_choices: bool,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        let mut view = QuestionView {
            id: q.id.clone(),
            text: q.text.clone(),
            required: q.required,
            input_type: "text",
            is_textarea: false,
            is_select: false,
            is_choices: false,
            options: q.kind.options().to_vec(),
        };
        match &q.kind {
            QuestionKind::Text => {}
            QuestionKind::Textarea => view.is_textarea = true,
            QuestionKind::Number => view.input_type = "number",
            QuestionKind::Range => view.input_type = "range",
            QuestionKind::Likert => {
                view.is_choices = true;
                view.input_type = "radio";
                view.options = LIKERT_SCALE.iter().map(|s| s.to_string()).collect();
            }
            QuestionKind::Select { .. } => view.is_select = true,
            QuestionKind::Radio { .. } => {
                view.is_choices = true;
                view.input_type = "radio";
            }
            QuestionKind::Checkbox { .. } => {
                view.is_choices = true;
                view.input_type = "checkbox";
            }
        }
        view
    }
}

pub struct SectionView {
    pub name: String,
    pub questions: Vec<QuestionView>,
}

#[derive(Template)]
#[template(path = "survey.html")]
pub struct SurveyPageTemplate {
    pub app_name: String,
    pub survey_type: String,
    pub title: String,
    pub sections: Vec<SectionView>,
    pub total_questions: usize,
    pub required_count: usize,
}

impl SurveyPageTemplate {
    pub fn new(app_name: &str, survey_type: SurveyType, questions: &[Question]) -> Self {
        let title = match survey_type {
            SurveyType::Company => "Company AI Readiness Assessment",
            SurveyType::Employee => "Employee AI Readiness Assessment",
        };
        let sections = group_by_section(questions)
            .into_iter()
            .map(|(name, members)| SectionView {
                name,
                questions: members.into_iter().map(QuestionView::from).collect(),
            })
            .collect();
        SurveyPageTemplate {
            app_name: app_name.to_string(),
            survey_type: survey_type.as_str().to_string(),
            title: title.to_string(),
            sections,
            total_questions: questions.len(),
            required_count: questions.iter().filter(|q| q.required).count(),
        }
    }
}

#[derive(Template)]
#[template(path = "errors/404.html")]
pub struct NotFoundTemplate {
    pub app_name: String,
    pub message: String,
}
